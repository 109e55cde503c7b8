//! Abstract placeholder: a diagonal gradient with concentric rings.

use super::canvas::{rgb, Canvas, Color, Point};

/// Two gradient stops plus an accent for the ring outlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodPalette {
    pub name: &'static str,
    pub start: Color,
    pub end: Color,
    pub accent: Color,
}

pub const WARM: MoodPalette = MoodPalette {
    name: "warm",
    start: rgb(0xFF, 0xE4, 0xA0),
    end: rgb(0xFF, 0xB8, 0x99),
    accent: rgb(0xF2, 0x8C, 0x5A),
};

pub const CALM: MoodPalette = MoodPalette {
    name: "calm",
    start: rgb(0xA8, 0xE6, 0xCF),
    end: rgb(0xAD, 0xD8, 0xE6),
    accent: rgb(0x5F, 0xA8, 0xA0),
};

pub const SAD: MoodPalette = MoodPalette {
    name: "sad",
    start: rgb(0xA0, 0xB8, 0xD4),
    end: rgb(0x6B, 0x7B, 0x8C),
    accent: rgb(0x3E, 0x4C, 0x5E),
};

pub const INTENSE: MoodPalette = MoodPalette {
    name: "intense",
    start: rgb(0xE8, 0xA0, 0xA0),
    end: rgb(0x72, 0x2F, 0x37),
    accent: rgb(0x4A, 0x1C, 0x24),
};

pub const NEUTRAL: MoodPalette = MoodPalette {
    name: "neutral",
    start: rgb(0xE8, 0xE4, 0xDC),
    end: rgb(0xC4, 0xC4, 0xBC),
    accent: rgb(0x8A, 0x8A, 0x80),
};

/// Palette rules in priority order; the first rule with a keyword present in
/// the lower-cased prompt wins, otherwise [`NEUTRAL`].
///
/// Keywords are chosen so they never occur in the fixed prompt preambles.
pub const PALETTE_RULES: &[(&[&str], MoodPalette)] = &[
    (
        &["joyful", "uplifting", "energetic", "vibrant", "happy"],
        WARM,
    ),
    (
        &["relaxed", "peaceful", "comfortable", "tranquil", "chill"],
        CALM,
    ),
    (
        &["subdued", "weighted", "sinking", "sad", "disappointed"],
        SAD,
    ),
    (
        &["intensity", "pressure", "simmering", "anxious", "angry", "anger"],
        INTENSE,
    ),
];

pub fn select_palette(prompt: &str) -> MoodPalette {
    let lower = prompt.to_lowercase();
    PALETTE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, palette)| *palette)
        .unwrap_or(NEUTRAL)
}

/// Ring radii as fractions of the canvas size, outermost first
const RING_RADII: [f32; 3] = [0.38, 0.26, 0.14];
const RING_WIDTH_FRACTION: f32 = 0.012;

pub fn compose(canvas: &mut Canvas, prompt: &str) {
    let palette = select_palette(prompt);
    let size = canvas.width().min(canvas.height()) as f32;
    let center = Point::new(canvas.width() as f32 / 2.0, canvas.height() as f32 / 2.0);
    let stroke = (size * RING_WIDTH_FRACTION).max(1.0);

    canvas.diagonal_gradient(palette.start, palette.end);
    for fraction in RING_RADII {
        canvas.ring(center, size * fraction, stroke, palette.accent);
    }
}
