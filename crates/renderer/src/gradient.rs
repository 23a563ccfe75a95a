//! Colormap rasterization for gridded fields.

use crate::colormap::Colormap;

/// Ranges narrower than this map every sample to the first table entry.
const DEGENERATE_RANGE: f64 = 1e-14;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.max(0.0).min(1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)).round() as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)).round() as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)).round() as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)).round() as u8,
    )
}

/// Display range for the color scale.
///
/// `min > max` is tolerated: values then clamp to `max` and the degenerate
/// range maps everything to the first color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Normalized position of a value in the range, in `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        let clamped = value.max(self.min).min(self.max);
        let range = self.max - self.min;
        if range > DEGENERATE_RANGE {
            ((clamped - self.min) / range).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Table index for a sample, `None` for missing (NaN) samples.
pub fn color_index(value: f64, range: &ValueRange, table_size: usize) -> Option<usize> {
    if value.is_nan() || table_size == 0 {
        return None;
    }
    let last = table_size - 1;
    let t = range.normalize(value);
    let index = (t * last as f64).round();
    Some((index.max(0.0) as usize).min(last))
}

/// Color of a single sample: transparent when missing, opaque table entry otherwise.
pub fn sample_color(value: f64, range: &ValueRange, colormap: &Colormap) -> Color {
    match color_index(value, range, colormap.len()) {
        Some(index) => {
            let c = colormap.entry(index);
            Color::new(c.r, c.g, c.b, 255)
        }
        None => Color::transparent(),
    }
}

/// Row-major RGBA raster, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// Fully transparent image.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height * 4],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * 4;
        Some(Color::new(
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ))
    }
}

/// Render grid data through a colormap.
///
/// # Arguments
/// - `data`: samples in row-major order, NaN for missing
/// - `width`: Number of columns
/// - `height`: Number of rows
/// - `range`: display range; values outside it are clamped
/// - `colormap`: lookup table
///
/// Samples beyond the end of `data` are left transparent.
pub fn render_grid(
    data: &[f64],
    width: usize,
    height: usize,
    range: &ValueRange,
    colormap: &Colormap,
) -> RgbaImage {
    let mut image = RgbaImage::blank(width, height);

    for (value, pixel) in data
        .iter()
        .take(width * height)
        .zip(image.pixels.chunks_exact_mut(4))
    {
        let color = sample_color(*value, range, colormap);
        pixel[0] = color.r;
        pixel[1] = color.g;
        pixel[2] = color.b;
        pixel[3] = color.a;
    }

    image
}
