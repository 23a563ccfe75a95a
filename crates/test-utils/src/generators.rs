//! Test data generators for creating synthetic gridded fields.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite. All grids are row-major.

use gribview_common::MISSING_VALUE;

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f64);
        }
    }
    data
}

/// Creates a test grid with temperature-like values in Kelvin.
///
/// The values range from approximately 250K to 310K, cold at the top-left
/// corner and warm at the bottom-right one.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f64 / width.max(1) as f64;
            let y_factor = row as f64 / height.max(1) as f64;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// Creates a linear ramp from `min_val` (first sample) to `max_val` (last sample).
pub fn create_ramp_grid(width: usize, height: usize, min_val: f64, max_val: f64) -> Vec<f64> {
    let n = width * height;
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n)
        .map(|i| min_val + (max_val - min_val) * (i as f64 / last))
        .collect()
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// Creates a grid holding the missing-data sentinel at the given positions.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `missing` - List of (col, row) positions set to the sentinel
///
/// Other cells hold their flat index.
pub fn create_grid_with_missing(width: usize, height: usize, missing: &[(usize, usize)]) -> Vec<f64> {
    let mut data: Vec<f64> = (0..width * height).map(|i| i as f64).collect();
    for &(col, row) in missing {
        if col < width && row < height {
            data[row * width + col] = MISSING_VALUE;
        }
    }
    data
}

/// Creates a grid with NaN values at specified positions, zeros elsewhere.
pub fn create_grid_with_nans(width: usize, height: usize, nan_positions: &[(usize, usize)]) -> Vec<f64> {
    let mut data = vec![0.0; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f64::NAN;
        }
    }
    data
}

/// Creates RGBA pixel data for a simple test pattern.
pub fn create_test_rgba_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            pixels.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    pixels
}
