/// Paint command set produced from a composed scene
///
/// Commands are emitted in back-to-front order and already carry final pixel
/// coordinates: `CardScene::paint` applies the uniform scale before anything
/// reaches the rasterizer.

pub type Rgba = (u8, u8, u8, u8);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    /// Diagonal two-stop linear gradient fill
    GradientRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        from: Rgba,
        to: Rgba,
    },
    /// Stroked rectangle outline
    FrameRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        thickness: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        /// Pixels per font unit (text scale x uniform scale)
        px: f32,
        rgba: Rgba,
    },
}
