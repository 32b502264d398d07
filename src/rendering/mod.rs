//! Rendering pipeline: template -> layout -> paint -> raster

pub mod font;
pub mod layout;
pub mod paint;
pub mod raster;
pub mod template;

// Public small API to take a composed card and produce a PNG.

#[derive(Debug, Clone)]
pub struct CardImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl CardImage {
    pub fn empty(width: u32, height: u32) -> Self {
        Self { width, height, png_data: Vec::new() }
    }
}
