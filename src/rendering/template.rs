//! The canonical card template.
//!
//! `compose_card` turns a validated record into a `CardScene`: a fixed
//! aspect-ratio layout computed entirely in logical units. The scale factor
//! a caller asks for is stored on the scene and applied only as a uniform
//! multiplier when paint commands are generated, so a thumbnail at 0.55 and
//! a full-size rendering are the same layout, pixel for pixel, up to scale.
//! The export engine relies on this: it can capture any scene at full
//! fidelity no matter how the scene is being displayed.

use crate::rendering::layout::{
    line_height, line_width, wrap_text, ElementKind, LayoutNode, Rect, GLYPH_W,
};
use crate::rendering::paint::{PaintCommand, Rgba};
use crate::rendering::raster;
use crate::rendering::CardImage;
use crate::{CardConfig, Error, GreetingRecord, Result};

/// Logical canvas size; the card's aspect ratio never changes.
pub const LOGICAL_WIDTH: u32 = 640;
pub const LOGICAL_HEIGHT: u32 = 840;

const FRAME_INSET: u32 = 8;
const PANEL_PAD: u32 = 48;
const CORNER: u32 = 40;

const GOLD: Rgba = (240, 192, 48, 255);
const VIOLET: Rgba = (166, 38, 217, 255);
const GOLD_LIGHT: Rgba = (240, 210, 122, 255);
const GOLD_LIGHT_DIM: Rgba = (240, 210, 122, 150);
const PANEL_TOP: Rgba = (26, 26, 46, 250);
const PANEL_BOTTOM: Rgba = (15, 15, 35, 252);
const FOREGROUND: Rgba = (232, 233, 243, 255);
const MUTED: Rgba = (150, 152, 178, 255);
const BADGE_BG: Rgba = (240, 192, 48, 26);
const BADGE_BORDER: Rgba = (240, 192, 48, 51);
const QUOTE_BG: Rgba = (255, 255, 255, 13);
const QUOTE_BORDER: Rgba = (240, 210, 122, 51);

const BADGE_SCALE: u32 = 1;
const TITLE_SCALE: u32 = 3;
const SUBTITLE_SCALE: u32 = 1;
const BODY_SCALE: u32 = 2;
const QUOTE_SCALE: u32 = 2;
const FOOTER_SCALE: u32 = 1;

/// A composed card: the stable handle the exporter targets.
///
/// The scene owns a snapshot of its record, so a capture that completes
/// after the surrounding view is torn down still has everything it needs
/// and the stale result can simply be discarded.
#[derive(Debug, Clone)]
pub struct CardScene {
    pub record: GreetingRecord,
    pub nodes: Vec<LayoutNode>,
    pub logical_width: u32,
    pub logical_height: u32,
    display_scale: f32,
    viewport_offset: (i32, i32),
}

impl CardScene {
    pub fn display_scale(&self) -> f32 {
        self.display_scale
    }

    /// Size of the on-screen rendering at the scene's display scale.
    pub fn display_size(&self) -> (u32, u32) {
        (
            (self.logical_width as f32 * self.display_scale).round() as u32,
            (self.logical_height as f32 * self.display_scale).round() as u32,
        )
    }

    /// Record the enclosing viewport's scroll offset. Display-side state
    /// only: capture compensates by always rendering from the scene origin.
    pub fn set_viewport_offset(&mut self, x: i32, y: i32) {
        self.viewport_offset = (x, y);
    }

    pub fn viewport_offset(&self) -> (i32, i32) {
        self.viewport_offset
    }

    /// Generate paint commands at an arbitrary uniform pixel scale.
    ///
    /// All layout decisions were made in logical units at compose time;
    /// this only multiplies geometry.
    pub fn paint(&self, px_scale: f32) -> Vec<PaintCommand> {
        let mut commands = Vec::new();
        for node in &self.nodes {
            node_commands(node, px_scale, &mut commands);
        }
        commands
    }

    /// Rasterize the scene at its display scale.
    ///
    /// `background` of `None` keeps the frame's own fills over transparency;
    /// exports instead go through the export engine, which composites onto
    /// an opaque background at a fixed density.
    pub fn render(&self, background: Option<(u8, u8, u8)>) -> Result<CardImage> {
        raster::render_scene(self, self.display_scale, background)
    }
}

/// Compose the canonical card for a record at the given display scale.
///
/// Fails with `Error::Validation` for records violating the non-empty-field
/// invariant and `Error::Config` for a non-positive scale.
pub fn compose_card(record: &GreetingRecord, config: &CardConfig, scale: f32) -> Result<CardScene> {
    record.validate()?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Config(format!("scale must be > 0, got {}", scale)));
    }

    let content_x = PANEL_PAD as i32;
    let content_w = LOGICAL_WIDTH - 2 * PANEL_PAD;
    let budget = |text_scale: u32| (content_w / (GLYPH_W * text_scale)) as usize;

    let mut nodes = Vec::new();

    nodes.push(LayoutNode::boxed(
        ElementKind::Frame,
        Rect { x: 0, y: 0, width: LOGICAL_WIDTH, height: LOGICAL_HEIGHT },
    ));
    nodes.push(LayoutNode::boxed(
        ElementKind::Panel,
        Rect {
            x: FRAME_INSET as i32,
            y: FRAME_INSET as i32,
            width: LOGICAL_WIDTH - 2 * FRAME_INSET,
            height: LOGICAL_HEIGHT - 2 * FRAME_INSET,
        },
    ));
    for (cx, cy) in [
        (20, 20),
        (LOGICAL_WIDTH as i32 - 20 - CORNER as i32, 20),
        (20, LOGICAL_HEIGHT as i32 - 20 - CORNER as i32),
        (
            LOGICAL_WIDTH as i32 - 20 - CORNER as i32,
            LOGICAL_HEIGHT as i32 - 20 - CORNER as i32,
        ),
    ] {
        nodes.push(LayoutNode::boxed(
            ElementKind::CornerMark,
            Rect { x: cx, y: cy, width: CORNER, height: CORNER },
        ));
    }

    let mut y = 64i32;

    // Institution badge
    let badge_text = config.institution.trim().to_string();
    let badge_w = (line_width(&badge_text, BADGE_SCALE) + 48).min(content_w);
    nodes.push(LayoutNode {
        rect: Rect {
            x: content_x + ((content_w - badge_w) / 2) as i32,
            y,
            width: badge_w,
            height: line_height(BADGE_SCALE) + 16,
        },
        kind: ElementKind::Badge,
        lines: vec![badge_text],
        text_scale: BADGE_SCALE,
    });
    y += (line_height(BADGE_SCALE) + 16) as i32 + 28;

    // Title
    let title_lines = wrap_text(record.title.trim(), budget(TITLE_SCALE));
    let title_h = title_lines.len() as u32 * line_height(TITLE_SCALE);
    nodes.push(LayoutNode {
        rect: Rect { x: content_x, y, width: content_w, height: title_h },
        kind: ElementKind::Title,
        lines: title_lines,
        text_scale: TITLE_SCALE,
    });
    y += title_h as i32 + 12;

    // "branch – year" subtitle
    let subtitle = format!(
        "{} \u{2013} {} Year Student",
        record.branch.trim(),
        record.year.trim()
    );
    let subtitle_lines = wrap_text(&subtitle, budget(SUBTITLE_SCALE));
    let subtitle_h = subtitle_lines.len() as u32 * line_height(SUBTITLE_SCALE);
    nodes.push(LayoutNode {
        rect: Rect { x: content_x, y, width: content_w, height: subtitle_h },
        kind: ElementKind::Subtitle,
        lines: subtitle_lines,
        text_scale: SUBTITLE_SCALE,
    });
    y += subtitle_h as i32 + 36;

    // Body: each embedded line break is a paragraph break, never collapsed
    for paragraph in record.body.split('\n') {
        let para_lines = wrap_text(paragraph.trim_end_matches('\r').trim(), budget(BODY_SCALE));
        let para_h = para_lines.len() as u32 * line_height(BODY_SCALE);
        nodes.push(LayoutNode {
            rect: Rect { x: content_x, y, width: content_w, height: para_h },
            kind: ElementKind::Paragraph,
            lines: para_lines,
            text_scale: BODY_SCALE,
        });
        y += para_h as i32 + 10;
    }
    y += 26;

    // Quote block, always wrapped in a quotation glyph pair
    let quoted = format!("\u{201C}{}\u{201D}", record.quote.trim());
    let quote_pad = 24u32;
    let quote_budget = ((content_w - 2 * quote_pad) / (GLYPH_W * QUOTE_SCALE)) as usize;
    let quote_lines = wrap_text(&quoted, quote_budget);
    let quote_text_h = quote_lines.len() as u32 * line_height(QUOTE_SCALE);
    nodes.push(LayoutNode::boxed(
        ElementKind::QuoteBox,
        Rect {
            x: content_x,
            y,
            width: content_w,
            height: quote_text_h + 2 * quote_pad,
        },
    ));
    nodes.push(LayoutNode {
        rect: Rect {
            x: content_x + quote_pad as i32,
            y: y + quote_pad as i32,
            width: content_w - 2 * quote_pad,
            height: quote_text_h,
        },
        kind: ElementKind::Quote,
        lines: quote_lines,
        text_scale: QUOTE_SCALE,
    });

    // Footer pinned to the bottom of the canvas
    let footer_lines = wrap_text(config.footer_text.trim(), budget(FOOTER_SCALE));
    let footer_h = footer_lines.len() as u32 * line_height(FOOTER_SCALE);
    let note_lines = wrap_text(config.footer_note.trim(), budget(FOOTER_SCALE));
    let note_h = note_lines.len() as u32 * line_height(FOOTER_SCALE);
    let footer_y = LOGICAL_HEIGHT as i32 - 64 - (footer_h + 8 + note_h) as i32;
    nodes.push(LayoutNode {
        rect: Rect { x: content_x, y: footer_y, width: content_w, height: footer_h },
        kind: ElementKind::Footer,
        lines: footer_lines,
        text_scale: FOOTER_SCALE,
    });
    nodes.push(LayoutNode {
        rect: Rect {
            x: content_x,
            y: footer_y + footer_h as i32 + 8,
            width: content_w,
            height: note_h,
        },
        kind: ElementKind::FooterNote,
        lines: note_lines,
        text_scale: FOOTER_SCALE,
    });

    Ok(CardScene {
        record: record.clone(),
        nodes,
        logical_width: LOGICAL_WIDTH,
        logical_height: LOGICAL_HEIGHT,
        display_scale: scale,
        viewport_offset: (0, 0),
    })
}

fn node_commands(node: &LayoutNode, s: f32, out: &mut Vec<PaintCommand>) {
    let sx = |v: i32| (v as f32 * s).round() as i32;
    let sw = |v: u32| ((v as f32 * s).round() as u32).max(1);
    let r = &node.rect;
    let (x, y, w, h) = (sx(r.x), sx(r.y), sw(r.width), sw(r.height));

    match node.kind {
        ElementKind::Frame => {
            out.push(PaintCommand::GradientRect {
                x,
                y,
                width: w,
                height: h,
                from: GOLD,
                to: VIOLET,
            });
        }
        ElementKind::Panel => {
            out.push(PaintCommand::GradientRect {
                x,
                y,
                width: w,
                height: h,
                from: PANEL_TOP,
                to: PANEL_BOTTOM,
            });
        }
        ElementKind::CornerMark => {
            out.push(PaintCommand::FrameRect {
                x,
                y,
                width: w,
                height: h,
                thickness: sw(2),
                rgba: GOLD_LIGHT_DIM,
            });
        }
        ElementKind::Badge => {
            out.push(PaintCommand::SolidRect { x, y, width: w, height: h, rgba: BADGE_BG });
            out.push(PaintCommand::FrameRect {
                x,
                y,
                width: w,
                height: h,
                thickness: sw(1),
                rgba: BADGE_BORDER,
            });
            push_text_lines(node, s, 8, GOLD, out);
        }
        ElementKind::Title => push_text_lines(node, s, 0, GOLD_LIGHT, out),
        ElementKind::Subtitle => push_text_lines(node, s, 0, MUTED, out),
        ElementKind::Paragraph => push_text_lines(node, s, 0, FOREGROUND, out),
        ElementKind::QuoteBox => {
            out.push(PaintCommand::SolidRect { x, y, width: w, height: h, rgba: QUOTE_BG });
            out.push(PaintCommand::FrameRect {
                x,
                y,
                width: w,
                height: h,
                thickness: sw(1),
                rgba: QUOTE_BORDER,
            });
        }
        ElementKind::Quote => push_text_lines(node, s, 0, FOREGROUND, out),
        ElementKind::Footer => push_text_lines(node, s, 0, MUTED, out),
        ElementKind::FooterNote => push_text_lines(node, s, 0, GOLD_LIGHT_DIM, out),
    }
}

/// Emit centered text lines for a node. Centering is computed in logical
/// units, then scaled, so it cannot diverge between scales.
fn push_text_lines(node: &LayoutNode, s: f32, top_pad: i32, rgba: Rgba, out: &mut Vec<PaintCommand>) {
    let ts = node.text_scale.max(1);
    for (i, line) in node.lines.iter().enumerate() {
        let lw = line_width(line, ts);
        let lx = node.rect.x + node.rect.width.saturating_sub(lw) as i32 / 2;
        let ly = node.rect.y + top_pad + (i as u32 * line_height(ts)) as i32;
        out.push(PaintCommand::Text {
            x: (lx as f32 * s).round() as i32,
            y: (ly as f32 * s).round() as i32,
            text: line.clone(),
            px: ts as f32 * s,
            rgba,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> GreetingRecord {
        GreetingRecord::new(
            "Asha Rao",
            "CSE",
            "2",
            "Happy New Year",
            "Line1\nLine2",
            "Dream big",
        )
    }

    #[test]
    fn compose_places_all_elements() {
        let scene = compose_card(&record(), &CardConfig::default(), 1.0).unwrap();
        let kinds: Vec<ElementKind> = scene.nodes.iter().map(|n| n.kind).collect();
        for kind in [
            ElementKind::Frame,
            ElementKind::Panel,
            ElementKind::Badge,
            ElementKind::Title,
            ElementKind::Subtitle,
            ElementKind::Paragraph,
            ElementKind::QuoteBox,
            ElementKind::Quote,
            ElementKind::Footer,
            ElementKind::FooterNote,
        ] {
            assert!(kinds.contains(&kind), "missing {:?}", kind);
        }
    }

    #[test]
    fn layout_is_identical_across_scales() {
        let config = CardConfig::default();
        let small = compose_card(&record(), &config, 0.55).unwrap();
        let full = compose_card(&record(), &config, 1.0).unwrap();
        // Same nodes, same wrap decisions; only display_scale differs
        assert_eq!(small.nodes, full.nodes);
        assert_eq!(small.paint(1.0), full.paint(1.0));
    }

    #[test]
    fn body_line_breaks_become_paragraphs() {
        let scene = compose_card(&record(), &CardConfig::default(), 1.0).unwrap();
        let paragraphs = scene
            .nodes
            .iter()
            .filter(|n| n.kind == ElementKind::Paragraph)
            .count();
        assert_eq!(paragraphs, 2);
    }

    #[test]
    fn quote_carries_quotation_glyphs() {
        let scene = compose_card(&record(), &CardConfig::default(), 1.0).unwrap();
        let quote = scene
            .nodes
            .iter()
            .find(|n| n.kind == ElementKind::Quote)
            .unwrap();
        let joined = quote.lines.join(" ");
        assert!(joined.starts_with('\u{201C}'));
        assert!(joined.ends_with('\u{201D}'));
    }

    #[test]
    fn long_title_wraps_instead_of_truncating() {
        let mut r = record();
        r.title = "An Exceptionally Long Greeting Title That Cannot Fit On One Line".into();
        let scene = compose_card(&r, &CardConfig::default(), 1.0).unwrap();
        let title = scene
            .nodes
            .iter()
            .find(|n| n.kind == ElementKind::Title)
            .unwrap();
        assert!(title.lines.len() > 1);
        let joined = title.lines.join(" ");
        assert!(joined.contains("Exceptionally"));
        assert!(joined.contains("Line"));
    }

    #[test]
    fn invalid_record_is_rejected() {
        let mut r = record();
        r.name = "  ".into();
        assert!(compose_card(&r, &CardConfig::default(), 1.0).is_err());
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        assert!(compose_card(&record(), &CardConfig::default(), 0.0).is_err());
        assert!(compose_card(&record(), &CardConfig::default(), -1.0).is_err());
    }

    #[test]
    fn display_size_scales_uniformly() {
        let scene = compose_card(&record(), &CardConfig::default(), 0.5).unwrap();
        assert_eq!(scene.display_size(), (LOGICAL_WIDTH / 2, LOGICAL_HEIGHT / 2));
    }
}
