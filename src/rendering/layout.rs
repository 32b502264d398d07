/// Layout primitives for the card template
///
/// All geometry here is in logical units. Scale factors are applied later,
/// when a scene is painted, as a single uniform multiplier; line-wrap
/// decisions must never depend on the display scale.

/// Glyph cell width at text scale 1 (advance includes 1px spacing)
pub const GLYPH_W: u32 = 6;
/// Glyph cell height at text scale 1 (7 rows + 1px leading)
pub const GLYPH_H: u32 = 8;
/// Extra leading between wrapped lines at text scale 1
pub const LINE_GAP: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Element kinds the template emits; the paint stage maps each kind to its
/// fill and text styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Frame,
    Panel,
    CornerMark,
    Badge,
    Title,
    Subtitle,
    Paragraph,
    QuoteBox,
    Quote,
    Footer,
    FooterNote,
}

/// A layout node couples a rect with wrapped text lines and an element kind.
/// Non-text nodes carry no lines.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub kind: ElementKind,
    pub lines: Vec<String>,
    pub text_scale: u32,
}

impl LayoutNode {
    pub fn boxed(kind: ElementKind, rect: Rect) -> Self {
        Self { rect, kind, lines: Vec::new(), text_scale: 0 }
    }
}

/// Line height for wrapped text at the given text scale, in logical units.
pub fn line_height(text_scale: u32) -> u32 {
    (GLYPH_H + LINE_GAP) * text_scale
}

/// Width of a single line at the given text scale, in logical units.
pub fn line_width(line: &str, text_scale: u32) -> u32 {
    line.chars().count() as u32 * GLYPH_W * text_scale
}

/// Greedy word-wrap against a character budget.
///
/// Words longer than the budget are hard-split rather than allowed to
/// overflow; nothing is ever dropped. An empty input yields a single empty
/// line so paragraph breaks keep their vertical space.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            // Flush the current line, then split the oversized word
            if cur_len > 0 {
                lines.push(std::mem::take(&mut cur));
                cur_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_chars) {
                lines.push(chunk.iter().collect());
            }
            continue;
        }
        let needed = if cur_len == 0 { word_len } else { cur_len + 1 + word_len };
        if needed > max_chars && cur_len > 0 {
            lines.push(std::mem::take(&mut cur));
            cur = word.to_string();
            cur_len = word_len;
        } else {
            if cur_len > 0 {
                cur.push(' ');
                cur_len += 1;
            }
            cur.push_str(word);
            cur_len += word_len;
        }
    }
    if cur_len > 0 {
        lines.push(cur);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
