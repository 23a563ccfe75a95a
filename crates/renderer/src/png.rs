//! RGBA PNG encoding (color type 6, 8 bits per channel, no interlace).
//!
//! Chunks are written by hand; only zlib compression and the chunk CRC
//! come from flate2 and crc32fast.

use std::io::Write;

use crate::gradient::RgbaImage;
use crate::RenderError;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];
const COLOR_TYPE_RGBA: u8 = 6;

/// Encode a rendered raster.
pub fn encode_image(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    create_png(&image.pixels, image.width, image.height)
}

/// Create a PNG from row-major RGBA bytes, top row first.
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, RenderError> {
    if width == 0 || height == 0 || pixels.len() != width * height * 4 {
        return Err(RenderError::InvalidDimensions {
            width,
            height,
            len: pixels.len(),
        });
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height));
    write_chunk(&mut png, b"IDAT", &deflate_scanlines(pixels, width * 4)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: usize, height: usize) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = COLOR_TYPE_RGBA;
    // compression, filter and interlace methods stay 0
    data
}

/// Length, type, payload, then CRC over type and payload.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Each row gets filter byte 0 before the whole buffer is deflated.
fn deflate_scanlines(data: &[u8], stride: usize) -> Result<Vec<u8>, RenderError> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    for row in data.chunks_exact(stride) {
        encoder
            .write_all(&[0])
            .and_then(|_| encoder.write_all(row))
            .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))?;
    }
    encoder
        .finish()
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))
}
