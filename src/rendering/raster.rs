//! Rasterizer: paint commands -> RGBA buffer -> PNG bytes.
//!
//! Deterministic by construction: no anti-aliasing, no platform text stack,
//! integer pixel coverage only. The same command list always produces the
//! same bytes, which is what makes golden tests and the capture fidelity
//! guarantees possible.

use std::io::Cursor;

use crate::rendering::font;
use crate::rendering::paint::{PaintCommand, Rgba};
use crate::rendering::template::CardScene;
use crate::rendering::CardImage;
use crate::{Error, Result};

/// Paint a command list into a fresh RGBA buffer.
///
/// With `background` set the buffer starts fully opaque and stays that way;
/// with `None` it starts transparent and keeps source alpha.
pub fn rasterize(
    commands: &[PaintCommand],
    width: u32,
    height: u32,
    background: Option<(u8, u8, u8)>,
) -> Vec<u8> {
    let mut buf = vec![0u8; (width * height * 4) as usize];
    if let Some((r, g, b)) = background {
        for px in buf.chunks_exact_mut(4) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = 255;
        }
    }

    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width: w, height: h, rgba } => {
                fill_rect(&mut buf, width, height, *x, *y, *w, *h, *rgba);
            }
            PaintCommand::GradientRect { x, y, width: w, height: h, from, to } => {
                fill_gradient(&mut buf, width, height, *x, *y, *w, *h, *from, *to);
            }
            PaintCommand::FrameRect { x, y, width: w, height: h, thickness, rgba } => {
                stroke_rect(&mut buf, width, height, *x, *y, *w, *h, *thickness, *rgba);
            }
            PaintCommand::Text { x, y, text, px, rgba } => {
                draw_text(&mut buf, width, height, *x, *y, text, *px, *rgba);
            }
        }
    }
    buf
}

/// Encode an RGBA buffer as PNG.
pub fn encode_png(width: u32, height: u32, rgba: Vec<u8>) -> Result<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| Error::Export("raster buffer size mismatch".to_string()))?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| Error::Export(format!("PNG encoding failed: {}", e)))?;
    Ok(bytes)
}

/// Rasterize a scene at the given uniform pixel scale.
///
/// Always renders from the scene origin: any viewport offset recorded on the
/// scene is display-side state and never shifts or crops the output.
pub fn render_scene(
    scene: &CardScene,
    px_scale: f32,
    background: Option<(u8, u8, u8)>,
) -> Result<CardImage> {
    if !px_scale.is_finite() || px_scale <= 0.0 {
        return Err(Error::Export(format!("pixel scale must be > 0, got {}", px_scale)));
    }
    let width = ((scene.logical_width as f32 * px_scale).round() as u32).max(1);
    let height = ((scene.logical_height as f32 * px_scale).round() as u32).max(1);
    let commands = scene.paint(px_scale);
    let buf = rasterize(&commands, width, height, background);
    let png_data = encode_png(width, height, buf)?;
    Ok(CardImage { width, height, png_data })
}

fn blend(buf: &mut [u8], width: u32, height: u32, x: i32, y: i32, (r, g, b, a): Rgba) {
    if a == 0 || x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let idx = ((y as u32 * width + x as u32) * 4) as usize;
    if a == 255 {
        buf[idx] = r;
        buf[idx + 1] = g;
        buf[idx + 2] = b;
        buf[idx + 3] = 255;
        return;
    }
    // src-over
    let sa = a as u16;
    let inv = 255 - sa;
    buf[idx] = ((r as u16 * sa + buf[idx] as u16 * inv) / 255) as u8;
    buf[idx + 1] = ((g as u16 * sa + buf[idx + 1] as u16 * inv) / 255) as u8;
    buf[idx + 2] = ((b as u16 * sa + buf[idx + 2] as u16 * inv) / 255) as u8;
    buf[idx + 3] = (sa + (buf[idx + 3] as u16 * inv) / 255).min(255) as u8;
}

#[allow(clippy::too_many_arguments)]
fn fill_rect(buf: &mut [u8], bw: u32, bh: u32, x: i32, y: i32, w: u32, h: u32, rgba: Rgba) {
    for dy in 0..h as i32 {
        for dx in 0..w as i32 {
            blend(buf, bw, bh, x + dx, y + dy, rgba);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn fill_gradient(
    buf: &mut [u8],
    bw: u32,
    bh: u32,
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    from: Rgba,
    to: Rgba,
) {
    let (w_f, h_f) = (w.max(1) as f32, h.max(1) as f32);
    for dy in 0..h as i32 {
        for dx in 0..w as i32 {
            // diagonal interpolation, top-left to bottom-right
            let t = (dx as f32 / w_f + dy as f32 / h_f) / 2.0;
            let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
            let rgba = (
                lerp(from.0, to.0),
                lerp(from.1, to.1),
                lerp(from.2, to.2),
                lerp(from.3, to.3),
            );
            blend(buf, bw, bh, x + dx, y + dy, rgba);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn stroke_rect(
    buf: &mut [u8],
    bw: u32,
    bh: u32,
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    thickness: u32,
    rgba: Rgba,
) {
    let t = thickness.max(1).min(w.min(h) / 2 + 1);
    fill_rect(buf, bw, bh, x, y, w, t, rgba);
    fill_rect(buf, bw, bh, x, y + (h - t) as i32, w, t, rgba);
    fill_rect(buf, bw, bh, x, y + t as i32, t, h.saturating_sub(2 * t), rgba);
    fill_rect(
        buf,
        bw,
        bh,
        x + (w - t) as i32,
        y + t as i32,
        t,
        h.saturating_sub(2 * t),
        rgba,
    );
}

/// Draw a text run with the bitmap face, nearest-neighbor scaled to `px`
/// pixels per font unit.
#[allow(clippy::too_many_arguments)]
fn draw_text(buf: &mut [u8], bw: u32, bh: u32, x: i32, y: i32, text: &str, px: f32, rgba: Rgba) {
    if !px.is_finite() || px <= 0.0 {
        return;
    }
    let cell_w = (6.0 * px).ceil() as i32;
    let cell_h = (8.0 * px).ceil() as i32;
    for (i, c) in text.chars().enumerate() {
        let glyph = font::glyph(c);
        let origin_x = x + (i as f32 * 6.0 * px).round() as i32;
        for ty in 0..cell_h {
            let row = (ty as f32 / px).floor() as usize;
            if row >= 7 {
                continue;
            }
            for tx in 0..cell_w {
                let col = (tx as f32 / px).floor() as usize;
                if col >= 5 {
                    continue;
                }
                if glyph[row] >> (4 - col) & 1 == 1 {
                    blend(buf, bw, bh, origin_x + tx, y + ty, rgba);
                }
            }
        }
    }
}
