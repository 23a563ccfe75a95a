//! Raster rendering for gridded fields.
//!
//! - colormaps: fixed-size lookup tables, built in or loaded from JSON
//! - gradient: value range to color index, grid to RGBA raster
//! - png: RGBA and indexed PNG encoding

pub mod colormap;
pub mod gradient;
pub mod png;

use thiserror::Error;

pub use colormap::{Colormap, ColormapRegistry, COLORMAP_SIZE, FALLBACK_COLORMAP};
pub use gradient::{color_index, render_grid, Color, RgbaImage, ValueRange};

/// Rendering and encoding failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid image dimensions {width}x{height} for {len} bytes")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Colormap error: {0}")]
    Colormap(String),
}
