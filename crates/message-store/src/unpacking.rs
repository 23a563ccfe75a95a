//! GRIB2 data unpacking.
//!
//! Simple packing (template 5.0) is unpacked here; other packings are handed
//! to the `grib` crate by the stores. Both paths finish with
//! [`apply_bitmap`] semantics and [`reorder_scan`].

use gribview_common::DecodeError;

/// Unpack simple packed GRIB2 data into `num_points` samples.
///
/// Simple packing formula: value = (reference_value + packed_value * 2^E) * 10^(-D).
/// Points the bitmap marks absent consume no packed bits and come back as NaN.
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: usize,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Result<Vec<f64>, DecodeError> {
    let binary_scale = 2.0_f64.powi(binary_scale_factor as i32);
    let decimal_scale = 10.0_f64.powi(-(decimal_scale_factor as i32));
    let reference = reference_value as f64;
    let bits = bits_per_value as usize;

    let mut values = Vec::with_capacity(num_points);
    let mut bit_position = 0;

    for i in 0..num_points {
        if !bitmap_bit(bitmap, i) {
            values.push(f64::NAN);
            continue;
        }

        let packed_value = if bits == 0 {
            0
        } else {
            let v = extract_bits(packed_data, bit_position, bits)?;
            bit_position += bits;
            v
        };

        values.push((reference + packed_value as f64 * binary_scale) * decimal_scale);
    }

    Ok(values)
}

/// Spread the present values over the bitmap, filling absent points with NaN.
pub fn apply_bitmap(present: &[f64], num_points: usize, bitmap: Option<&[u8]>) -> Vec<f64> {
    let Some(bm) = bitmap else {
        let mut values = present.to_vec();
        values.resize(num_points, f64::NAN);
        return values;
    };

    let mut source = present.iter();
    (0..num_points)
        .map(|i| {
            if bitmap_bit(Some(bm), i) {
                source.next().copied().unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        })
        .collect()
}

fn bitmap_bit(bitmap: Option<&[u8]>, i: usize) -> bool {
    match bitmap {
        // 1 bit per data point, 1 = value present, 0 = missing
        Some(bm) => bm.get(i / 8).map_or(true, |b| (b >> (7 - (i % 8))) & 1 == 1),
        None => true,
    }
}

/// Extract bits from a byte array, MSB first
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> Result<u32, DecodeError> {
    if num_bits > 32 {
        return Err(DecodeError::Unpacking(format!(
            "Invalid number of bits: {}",
            num_bits
        )));
    }

    let mut result = 0u32;
    for i in 0..num_bits {
        let absolute_bit = start_bit + i;
        let byte_idx = absolute_bit / 8;
        let bit_idx = 7 - (absolute_bit % 8);

        let byte = data.get(byte_idx).ok_or_else(|| {
            DecodeError::Unpacking("Not enough data to extract bits".to_string())
        })?;
        result = (result << 1) | ((byte >> bit_idx) & 1) as u32;
    }

    Ok(result)
}

/// Bring samples into row-major order with `ni` values per row.
///
/// Scanning mode flag 0x20 means points run along the j direction first
/// (stored column by column); flag 0x10 means every other row runs in the
/// opposite i direction. Row and column direction otherwise stay as stored,
/// since the grid corners already say which way they run.
pub fn reorder_scan(values: Vec<f64>, ni: usize, nj: usize, scanning_mode: u8) -> Vec<f64> {
    if values.len() != ni * nj || ni == 0 || nj == 0 {
        return values;
    }

    let mut values = if scanning_mode & 0x20 != 0 {
        let mut transposed = vec![f64::NAN; values.len()];
        for i in 0..ni {
            for j in 0..nj {
                transposed[j * ni + i] = values[i * nj + j];
            }
        }
        transposed
    } else {
        values
    };

    if scanning_mode & 0x10 != 0 {
        for row in values.chunks_mut(ni).skip(1).step_by(2) {
            row.reverse();
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bits() {
        let data = vec![0b10110101];
        assert_eq!(extract_bits(&data, 0, 2).unwrap(), 0b10);
        assert_eq!(extract_bits(&data, 2, 2).unwrap(), 0b11);
        assert_eq!(extract_bits(&data, 0, 8).unwrap(), 0b10110101);
        assert!(extract_bits(&data, 4, 8).is_err());
    }

    #[test]
    fn test_simple_unpacking() {
        let values = unpack_simple(&[100, 200], 2, 8, 0.0, 0, 0, None).unwrap();
        assert_eq!(values, vec![100.0, 200.0]);
    }

    #[test]
    fn test_scale_factors() {
        // (10 + 3 * 2^1) / 10^1
        let values = unpack_simple(&[3], 1, 8, 10.0, 1, 1, None).unwrap();
        assert!((values[0] - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_bitmap_points_consume_no_bits() {
        // Bitmap 1010: two packed values for four points
        let bitmap = [0b1010_0000];
        let values = unpack_simple(&[7, 9], 4, 8, 0.0, 0, 0, Some(&bitmap)).unwrap();
        assert_eq!(values[0], 7.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 9.0);
        assert!(values[3].is_nan());
    }

    #[test]
    fn test_constant_field() {
        let values = unpack_simple(&[], 3, 0, 273.5, 0, 0, None).unwrap();
        assert_eq!(values, vec![273.5; 3]);
    }

    #[test]
    fn test_apply_bitmap() {
        let spread = apply_bitmap(&[1.0, 2.0], 3, Some(&[0b0110_0000]));
        assert!(spread[0].is_nan());
        assert_eq!(&spread[1..], &[1.0, 2.0]);

        let padded = apply_bitmap(&[1.0], 2, None);
        assert_eq!(padded[0], 1.0);
        assert!(padded[1].is_nan());
    }

    #[test]
    fn test_reorder_column_major() {
        // ni=3, nj=2 stored column by column
        let stored = vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0];
        assert_eq!(reorder_scan(stored, 3, 2, 0x20), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_reorder_boustrophedon() {
        let stored = vec![0.0, 1.0, 2.0, 5.0, 4.0, 3.0];
        assert_eq!(reorder_scan(stored, 3, 2, 0x10), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_reorder_leaves_plain_rows() {
        let stored = vec![0.0, 1.0, 2.0, 3.0];
        assert_eq!(reorder_scan(stored.clone(), 2, 2, 0x40), stored);
    }
}
