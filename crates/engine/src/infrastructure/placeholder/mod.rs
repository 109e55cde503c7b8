//! Procedural placeholder images.
//!
//! Used in place of the image service when none is configured. Output is a
//! pure function of `(prompt, size)`: no randomness, no clock, so the same
//! prompt always yields byte-identical PNG data.

mod abstract_art;
mod canvas;
mod font;
mod radial;

pub use canvas::{Canvas, DrawOp, Point};

pub const MIN_SIZE: u32 = 64;
pub const MAX_SIZE: u32 = 2048;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Placeholder size {0} is out of range")]
    InvalidSize(u32),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Which composition a prompt gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Abstract,
    Radial,
}

/// Layout rules in priority order; the first rule with a marker present in
/// the prompt wins, otherwise [`Layout::Abstract`].
pub const LAYOUT_RULES: &[(&[&str], Layout)] = &[(
    &[
        "CENTRAL SITUATION",
        "EMOTIONAL FACTORS",
        "infographic",
        "mind-map",
        "radial",
    ],
    Layout::Radial,
)];

pub fn select_layout(prompt: &str) -> Layout {
    LAYOUT_RULES
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| prompt.contains(m)))
        .map(|(_, layout)| *layout)
        .unwrap_or(Layout::Abstract)
}

/// Record the drawing for `prompt` on a `size` x `size` canvas.
pub fn compose(prompt: &str, size: u32) -> Result<Canvas, RenderError> {
    if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
        return Err(RenderError::InvalidSize(size));
    }
    let mut canvas = Canvas::new(size, size);
    match select_layout(prompt) {
        Layout::Abstract => abstract_art::compose(&mut canvas, prompt),
        Layout::Radial => radial::compose(&mut canvas, prompt),
    }
    Ok(canvas)
}

/// Render the placeholder for `prompt` as PNG bytes.
pub fn render_placeholder(prompt: &str, size: u32) -> Result<Vec<u8>, RenderError> {
    compose(prompt, size)?.to_png()
}
