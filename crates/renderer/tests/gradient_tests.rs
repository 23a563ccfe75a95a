//! Tests for colormap rasterization.

use proptest::prelude::*;
use renderer::gradient::{color_index, render_grid, sample_color, Color, ValueRange};
use renderer::{ColormapRegistry, COLORMAP_SIZE};
use test_utils::{create_grid_with_nans, create_ramp_grid};

// ============================================================================
// Per-sample color mapping
// ============================================================================

proptest! {
    #[test]
    fn opaque_pixels_use_rounded_table_entry(
        value in -1000.0f64..1000.0,
        min in -500.0f64..0.0,
        width in 0.001f64..500.0,
    ) {
        let registry = ColormapRegistry::builtin();
        let colormap = registry.get("jet");
        let range = ValueRange::new(min, min + width);

        let color = sample_color(value, &range, colormap);
        prop_assert_eq!(color.a, 255);

        let t = ((value.max(range.min).min(range.max) - range.min) / (range.max - range.min)).clamp(0.0, 1.0);
        let expected = (t * (COLORMAP_SIZE - 1) as f64).round() as usize;
        let table = colormap.entry(expected);
        prop_assert_eq!((color.r, color.g, color.b), (table.r, table.g, table.b));
    }

    #[test]
    fn color_index_stays_in_table(value in prop::num::f64::ANY, size in 1usize..2048) {
        let range = ValueRange::new(-5.0, 5.0);
        match color_index(value, &range, size) {
            Some(i) => prop_assert!(i < size),
            None => prop_assert!(value.is_nan()),
        }
    }
}

#[test]
fn test_nan_is_transparent() {
    let registry = ColormapRegistry::builtin();
    let color = sample_color(f64::NAN, &ValueRange::new(0.0, 1.0), registry.get("jet"));
    assert_eq!(color, Color::transparent());
}

#[test]
fn test_endpoints_hit_first_and_last_entries() {
    let registry = ColormapRegistry::builtin();
    let grey = registry.get("grey");
    let range = ValueRange::new(0.0, 10.0);

    assert_eq!(sample_color(-3.0, &range, grey), grey.entry(0));
    assert_eq!(sample_color(0.0, &range, grey), grey.entry(0));
    assert_eq!(sample_color(10.0, &range, grey), grey.entry(COLORMAP_SIZE - 1));
    assert_eq!(sample_color(99.0, &range, grey), grey.entry(COLORMAP_SIZE - 1));
}

#[test]
fn test_unknown_colormap_renders_grey() {
    let registry = ColormapRegistry::builtin();
    let range = ValueRange::new(0.0, 1.0);
    assert_eq!(
        sample_color(0.5, &range, registry.get("missing")),
        sample_color(0.5, &range, registry.get("grey"))
    );
}

// ============================================================================
// Whole-grid rendering
// ============================================================================

#[test]
fn test_render_grid_dimensions_and_alpha() {
    let registry = ColormapRegistry::builtin();
    let data = create_grid_with_nans(4, 3, &[(1, 0), (3, 2)]);
    let image = render_grid(&data, 4, 3, &ValueRange::new(0.0, 1.0), registry.get("viridis"));

    assert_eq!(image.width, 4);
    assert_eq!(image.height, 3);
    assert_eq!(image.pixels.len(), 4 * 3 * 4);
    assert_eq!(image.pixel(1, 0).unwrap().a, 0);
    assert_eq!(image.pixel(3, 2).unwrap().a, 0);
    assert_eq!(image.pixel(0, 0).unwrap().a, 255);
    assert!(image.pixel(4, 0).is_none());
}

#[test]
fn test_render_ramp_is_monotonic_in_grey() {
    let registry = ColormapRegistry::builtin();
    let data = create_ramp_grid(16, 1, 0.0, 1.0);
    let image = render_grid(&data, 16, 1, &ValueRange::new(0.0, 1.0), registry.get("grey"));

    let reds: Vec<u8> = (0..16).map(|x| image.pixel(x, 0).unwrap().r).collect();
    assert!(reds.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(reds[0], 0);
    assert_eq!(reds[15], 255);
}

#[test]
fn test_short_data_leaves_trailing_pixels_transparent() {
    let registry = ColormapRegistry::builtin();
    let image = render_grid(&[0.5, 0.5], 2, 2, &ValueRange::new(0.0, 1.0), registry.get("jet"));
    assert_eq!(image.pixel(1, 0).unwrap().a, 255);
    assert_eq!(image.pixel(0, 1).unwrap().a, 0);
}

#[test]
fn test_degenerate_range_uses_first_entry() {
    let registry = ColormapRegistry::builtin();
    let jet = registry.get("jet");
    let image = render_grid(&[5.0, 7.0], 2, 1, &ValueRange::new(5.0, 5.0), jet);
    assert_eq!(image.pixel(0, 0), Some(jet.entry(0)));
    assert_eq!(image.pixel(1, 0), Some(jet.entry(0)));
}
