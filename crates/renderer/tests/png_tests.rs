//! Tests for PNG encoding of rendered rasters.

use std::io::Read;

use renderer::gradient::{render_grid, RgbaImage, ValueRange};
use renderer::png::{create_png, encode_image};
use renderer::{ColormapRegistry, RenderError};
use test_utils::{create_grid_with_nans, create_ramp_grid, create_test_rgba_pixels};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Parsed chunk: type and payload.
fn chunks(png: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    let mut out = Vec::new();
    let mut pos = 8;
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
        let data = png[pos + 8..pos + 8 + len].to_vec();
        let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&kind);
        hasher.update(&data);
        assert_eq!(hasher.finalize(), crc, "bad CRC in {:?}", std::str::from_utf8(&kind));

        out.push((kind, data));
        pos += 12 + len;
    }
    out
}

fn find<'a>(chunks: &'a [([u8; 4], Vec<u8>)], kind: &[u8; 4]) -> Option<&'a Vec<u8>> {
    chunks.iter().find(|(k, _)| k == kind).map(|(_, d)| d)
}

fn inflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .unwrap();
    out
}

// ============================================================================
// RGBA encoding
// ============================================================================

#[test]
fn test_rgba_png_structure() {
    let pixels = create_test_rgba_pixels(5, 3);
    let png = create_png(&pixels, 5, 3).unwrap();
    let parsed = chunks(&png);

    let kinds: Vec<&[u8; 4]> = parsed.iter().map(|(k, _)| k).collect();
    assert_eq!(kinds, vec![b"IHDR", b"IDAT", b"IEND"]);

    let ihdr = find(&parsed, b"IHDR").unwrap();
    assert_eq!(u32::from_be_bytes(ihdr[0..4].try_into().unwrap()), 5);
    assert_eq!(u32::from_be_bytes(ihdr[4..8].try_into().unwrap()), 3);
    assert_eq!(ihdr[8], 8);
    assert_eq!(ihdr[9], 6);
}

#[test]
fn test_rgba_png_scanlines() {
    let pixels = create_test_rgba_pixels(5, 3);
    let png = create_png(&pixels, 5, 3).unwrap();
    let raw = inflate(find(&chunks(&png), b"IDAT").unwrap());

    assert_eq!(raw.len(), 3 * (1 + 5 * 4));
    for (row, line) in raw.chunks(1 + 5 * 4).enumerate() {
        assert_eq!(line[0], 0, "filter byte");
        assert_eq!(&line[1..], &pixels[row * 20..(row + 1) * 20]);
    }
}

#[test]
fn test_mismatched_buffer_is_rejected() {
    let result = create_png(&[0u8; 10], 2, 2);
    assert!(matches!(result, Err(RenderError::InvalidDimensions { .. })));
}

// ============================================================================
// Rendered rasters
// ============================================================================

#[test]
fn test_missing_values_stay_transparent() {
    let registry = ColormapRegistry::builtin();
    let data = create_grid_with_nans(8, 8, &[(0, 0), (7, 7)]);
    let image = render_grid(&data, 8, 8, &ValueRange::new(0.0, 1.0), registry.get("jet"));

    let png = encode_image(&image).unwrap();
    let parsed = chunks(&png);
    assert_eq!(find(&parsed, b"IHDR").unwrap()[9], 6);

    let raw = inflate(find(&parsed, b"IDAT").unwrap());
    let stride = 1 + 8 * 4;
    // Alpha of the first pixel in the first row and last pixel in the last row
    assert_eq!(raw[4], 0);
    assert_eq!(raw[7 * stride + stride - 1], 0);
    assert_eq!(raw[8], 255);
}

#[test]
fn test_smooth_field_round_trips_through_inflate() {
    let registry = ColormapRegistry::builtin();
    let data = create_ramp_grid(64, 64, 0.0, 1.0);
    let image = render_grid(&data, 64, 64, &ValueRange::new(0.0, 1.0), registry.get("turbo"));

    let raw = inflate(find(&chunks(&encode_image(&image).unwrap()), b"IDAT").unwrap());
    let pixels: Vec<u8> = raw.chunks(1 + 64 * 4).flat_map(|line| line[1..].to_vec()).collect();
    assert_eq!(pixels, image.pixels);
}

#[test]
fn test_blank_image_encodes() {
    let image = RgbaImage::blank(3, 2);
    let png = encode_image(&image).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
}
