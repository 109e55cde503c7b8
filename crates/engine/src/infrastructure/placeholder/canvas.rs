//! Display-list canvas.
//!
//! Layouts describe an image as an ordered list of [`DrawOp`]s; nothing
//! touches pixels until [`Canvas::rasterize`]. Later operations paint over
//! earlier ones. Rasterization samples pixel centers with no antialiasing,
//! so output depends only on the operation list.

use image::{Rgba, RgbaImage};

use super::font;
use super::RenderError;

pub type Color = Rgba<u8>;

/// Opaque color from 8-bit channels
pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Rgba([r, g, b, 255])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One recorded drawing operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Flood the whole canvas
    Fill(Color),
    /// Linear blend from the top-left corner to the bottom-right corner
    DiagonalGradient { from: Color, to: Color },
    /// Filled disc
    Disc {
        center: Point,
        radius: f32,
        color: Color,
    },
    /// Unfilled circle outline
    Ring {
        center: Point,
        radius: f32,
        width: f32,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: Color,
    },
    /// Filled axis-aligned rectangle
    Rect {
        min: Point,
        max: Point,
        color: Color,
    },
    /// Filled polygon (even-odd rule)
    Polygon { points: Vec<Point>, color: Color },
    /// Single line of bitmap text, horizontally centered on `center_x`
    Text {
        center_x: f32,
        top: f32,
        text: String,
        scale: u32,
        color: Color,
    },
}

/// Recorded drawing, rasterized on demand
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    ops: Vec<DrawOp>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn push(&mut self, op: DrawOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn fill(&mut self, color: Color) -> &mut Self {
        self.push(DrawOp::Fill(color))
    }

    pub fn diagonal_gradient(&mut self, from: Color, to: Color) -> &mut Self {
        self.push(DrawOp::DiagonalGradient { from, to })
    }

    pub fn disc(&mut self, center: Point, radius: f32, color: Color) -> &mut Self {
        self.push(DrawOp::Disc {
            center,
            radius,
            color,
        })
    }

    pub fn ring(&mut self, center: Point, radius: f32, width: f32, color: Color) -> &mut Self {
        self.push(DrawOp::Ring {
            center,
            radius,
            width,
            color,
        })
    }

    pub fn line(&mut self, from: Point, to: Point, width: f32, color: Color) -> &mut Self {
        self.push(DrawOp::Line {
            from,
            to,
            width,
            color,
        })
    }

    pub fn rect(&mut self, min: Point, max: Point, color: Color) -> &mut Self {
        self.push(DrawOp::Rect { min, max, color })
    }

    pub fn polygon(&mut self, points: Vec<Point>, color: Color) -> &mut Self {
        self.push(DrawOp::Polygon { points, color })
    }

    pub fn text(
        &mut self,
        center_x: f32,
        top: f32,
        text: impl Into<String>,
        scale: u32,
        color: Color,
    ) -> &mut Self {
        self.push(DrawOp::Text {
            center_x,
            top,
            text: text.into(),
            scale,
            color,
        })
    }

    /// Paint every recorded operation, in order, onto a transparent image.
    pub fn rasterize(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        for op in &self.ops {
            paint(&mut image, op);
        }
        image
    }

    /// Rasterize and encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let image = self.rasterize();
        let mut png_data = Vec::new();
        {
            use image::ImageEncoder;
            let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
            encoder.write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgba8,
            )?;
        }
        Ok(png_data)
    }
}

fn paint(image: &mut RgbaImage, op: &DrawOp) {
    match op {
        DrawOp::Fill(color) => {
            for pixel in image.pixels_mut() {
                *pixel = *color;
            }
        }
        DrawOp::DiagonalGradient { from, to } => {
            let span = (image.width() + image.height()).saturating_sub(2).max(1) as f32;
            for (x, y, pixel) in image.enumerate_pixels_mut() {
                *pixel = lerp(*from, *to, (x + y) as f32 / span);
            }
        }
        DrawOp::Disc {
            center,
            radius,
            color,
        } => {
            let r2 = radius * radius;
            let area = bounds(*center, *radius, image);
            fill_where(image, area, *color, |p| {
                dist2(p, *center) <= r2
            });
        }
        DrawOp::Ring {
            center,
            radius,
            width,
            color,
        } => {
            let half = width / 2.0;
            let area = bounds(*center, radius + half, image);
            fill_where(image, area, *color, |p| {
                (dist2(p, *center).sqrt() - radius).abs() <= half
            });
        }
        DrawOp::Line {
            from,
            to,
            width,
            color,
        } => {
            let half = width / 2.0;
            let area = PixelBounds::around(
                &[*from, *to],
                half,
                image.width(),
                image.height(),
            );
            fill_where(image, area, *color, |p| {
                segment_dist2(p, *from, *to) <= half * half
            });
        }
        DrawOp::Rect { min, max, color } => {
            let area = PixelBounds::around(&[*min, *max], 0.0, image.width(), image.height());
            fill_where(image, area, *color, |p| {
                p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
            });
        }
        DrawOp::Polygon { points, color } => {
            if points.len() < 3 {
                return;
            }
            let area = PixelBounds::around(points, 0.0, image.width(), image.height());
            fill_where(image, area, *color, |p| contains(points, p));
        }
        DrawOp::Text {
            center_x,
            top,
            text,
            scale,
            color,
        } => paint_text(image, *center_x, *top, text, (*scale).max(1), *color),
    }
}

/// Inclusive-exclusive pixel window clipped to the image
#[derive(Debug, Clone, Copy)]
struct PixelBounds {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelBounds {
    fn around(points: &[Point], pad: f32, width: u32, height: u32) -> Self {
        let min_x = points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min) - pad;
        let max_x = points.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max) + pad;
        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min) - pad;
        let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max) + pad;
        Self {
            x0: clamp_coord(min_x.floor(), width),
            y0: clamp_coord(min_y.floor(), height),
            x1: clamp_coord(max_x.ceil() + 1.0, width),
            y1: clamp_coord(max_y.ceil() + 1.0, height),
        }
    }
}

fn clamp_coord(v: f32, limit: u32) -> u32 {
    if v <= 0.0 {
        0
    } else {
        (v as u32).min(limit)
    }
}

fn bounds(center: Point, reach: f32, image: &RgbaImage) -> PixelBounds {
    PixelBounds::around(&[center], reach, image.width(), image.height())
}

fn fill_where(
    image: &mut RgbaImage,
    area: PixelBounds,
    color: Color,
    inside: impl Fn(Point) -> bool,
) {
    for y in area.y0..area.y1 {
        for x in area.x0..area.x1 {
            let sample = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            if inside(sample) {
                image.put_pixel(x, y, color);
            }
        }
    }
}

fn paint_text(image: &mut RgbaImage, center_x: f32, top: f32, text: &str, scale: u32, color: Color) {
    let advance = (font::GLYPH_WIDTH + font::GLYPH_SPACING) * scale;
    let count = text.chars().count() as u32;
    if count == 0 {
        return;
    }
    let total = advance * count - font::GLYPH_SPACING * scale;
    let left = (center_x - total as f32 / 2.0).round() as i64;
    let top = top.round() as i64;

    for (index, ch) in text.chars().enumerate() {
        let rows = font::glyph_or_box(ch);
        let glyph_left = left + (index as u32 * advance) as i64;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..font::GLYPH_WIDTH {
                if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let px = glyph_left + (col * scale) as i64;
                let py = top + (row as u32 * scale) as i64;
                for dy in 0..scale as i64 {
                    for dx in 0..scale as i64 {
                        put_clipped(image, px + dx, py + dy, color);
                    }
                }
            }
        }
    }
}

fn put_clipped(image: &mut RgbaImage, x: i64, y: i64, color: Color) {
    if x >= 0 && y >= 0 && (x as u64) < image.width() as u64 && (y as u64) < image.height() as u64
    {
        image.put_pixel(x as u32, y as u32, color);
    }
}

fn lerp(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let channel = |i: usize| {
        let a = from.0[i] as f32;
        let b = to.0[i] as f32;
        (a + (b - a) * t).round() as u8
    };
    Rgba([channel(0), channel(1), channel(2), channel(3)])
}

fn dist2(a: Point, b: Point) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

fn segment_dist2(p: Point, a: Point, b: Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len2 = abx * abx + aby * aby;
    if len2 == 0.0 {
        return dist2(p, a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
    dist2(p, Point::new(a.x + abx * t, a.y + aby * t))
}

fn contains(points: &[Point], p: Point) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > p.y) != (pj.y > p.y)
            && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
