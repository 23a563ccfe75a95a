//! GRIB2 section parsing.
//!
//! A message is walked section by section from the end of the indicator up
//! to the `7777` trailer. Sections 2 to 7 may repeat for multi-field
//! messages; only the first occurrence of each is used, which is the first
//! field of the message.

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use gribview_common::DecodeError;

const MISSING_U32: u32 = 0xFFFF_FFFF;

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone, PartialEq)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub table_version: u8,
    pub local_table_version: u8,
    pub significance_of_reference_time: u8,
    pub reference_time: DateTime<Utc>,
    pub production_status: u8,
    pub data_type: u8,
}

/// Section 3: Grid Definition Section
#[derive(Debug, Clone, PartialEq)]
pub struct GridDefinition {
    pub template: u16,
    pub num_data_points: u32,
    pub shape_of_earth: u8,
    pub ni: u32,
    pub nj: u32,
    /// Corner coordinates and increments in degrees
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
    pub di: Option<f64>,
    pub dj: Option<f64>,
    pub resolution_flags: u8,
    pub scanning_mode: u8,
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefinition {
    pub template: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub generating_process: u8,
    /// Forecast time and level, present for the horizontal-level templates
    pub time_unit: Option<u8>,
    pub forecast_time: Option<i64>,
    pub first_surface: Option<FixedSurface>,
    pub second_surface: Option<FixedSurface>,
    /// Length of the statistical processing interval (templates 4.8 and 4.11)
    pub time_range: Option<(u8, i64)>,
}

/// One fixed surface of section 4: type, scale factor and scaled value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSurface {
    pub surface_type: u8,
    pub scale_factor: i8,
    pub scaled_value: u32,
}

impl FixedSurface {
    /// Surface value in the unit of code table 4.5; zero when missing.
    pub fn value(&self) -> f64 {
        if self.scaled_value == MISSING_U32 {
            return 0.0;
        }
        self.scaled_value as f64 * 10f64.powi(-(self.scale_factor as i32))
    }
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone, PartialEq)]
pub struct DataRepresentation {
    pub num_values: u32,
    pub template: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    pub original_data_type: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub indicator: u8,
    pub data: Bytes,
}

impl Bitmap {
    /// The bitmap bits, if one is actually applied to this field.
    pub fn bits(&self) -> Option<&[u8]> {
        (self.indicator == 0).then_some(self.data.as_ref())
    }
}

/// Section 7: Data Section
#[derive(Debug, Clone, PartialEq)]
pub struct DataSection {
    pub data: Bytes,
}

/// Position of one section within a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub number: u8,
    pub offset: usize,
    pub length: usize,
}

/// Decode a GRIB2 sign-magnitude integer.
///
/// GRIB2 stores signed values with the most significant bit as the sign and
/// the remaining bits as the magnitude, not as two's complement.
pub fn decode_grib2_signed(bytes: &[u8]) -> i64 {
    if bytes.is_empty() {
        return 0;
    }
    let mut raw: u64 = 0;
    for b in bytes {
        raw = (raw << 8) | *b as u64;
    }
    let sign_bit = 1u64 << (bytes.len() * 8 - 1);
    let magnitude = (raw & (sign_bit - 1)) as i64;
    if raw & sign_bit != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn require(section: u8, data: &[u8], len: usize) -> Result<(), DecodeError> {
    if data.len() < len {
        return Err(DecodeError::InvalidSection {
            section,
            reason: format!("need {} bytes, got {}", len, data.len()),
        });
    }
    Ok(())
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, DecodeError> {
    if data.len() < 8 || &data[0..4] != b"GRIB" {
        return Err(DecodeError::Format("Invalid GRIB magic bytes".to_string()));
    }

    let discipline = data[6];
    let edition = data[7];
    let message_length = match edition {
        1 => u32::from_be_bytes([0, data[4], data[5], data[6]]) as u64,
        2 => {
            if data.len() < 16 {
                return Err(DecodeError::Format(
                    "Not enough data for indicator section".to_string(),
                ));
            }
            u64::from_be_bytes([
                data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
            ])
        }
        other => return Err(DecodeError::UnsupportedEdition(other)),
    };

    Ok(Indicator {
        discipline,
        edition,
        message_length,
    })
}

/// Walk the sections of a complete GRIB2 message.
pub fn section_spans(message: &[u8]) -> Result<Vec<SectionSpan>, DecodeError> {
    let mut spans = Vec::new();
    let mut offset = 16;

    loop {
        if offset + 4 > message.len() {
            return Err(DecodeError::Format("Message ends before 7777".to_string()));
        }
        if &message[offset..offset + 4] == b"7777" {
            return Ok(spans);
        }
        if offset + 5 > message.len() {
            return Err(DecodeError::Format("Truncated section header".to_string()));
        }

        let length = read_u32(message, offset) as usize;
        let number = message[offset + 4];
        if length < 5 || offset + length > message.len() {
            return Err(DecodeError::InvalidSection {
                section: number,
                reason: format!("length {} at offset {} overruns message", length, offset),
            });
        }

        spans.push(SectionSpan {
            number,
            offset,
            length,
        });
        offset += length;
    }
}

/// Slice of the first section with the given number.
pub fn find_section<'a>(message: &'a [u8], spans: &[SectionSpan], number: u8) -> Option<&'a [u8]> {
    spans
        .iter()
        .find(|s| s.number == number)
        .map(|s| &message[s.offset..s.offset + s.length])
}

/// Parse Section 1 (Identification)
pub fn parse_identification(data: &[u8]) -> Result<Identification, DecodeError> {
    require(1, data, 21)?;

    let year = read_u16(data, 12) as i32;
    let (month, day, hour, minute, second) = (data[14], data[15], data[16], data[17], data[18]);
    let reference_time = Utc
        .with_ymd_and_hms(year, month as u32, day as u32, hour as u32, minute as u32, second as u32)
        .single()
        .ok_or_else(|| DecodeError::InvalidSection {
            section: 1,
            reason: format!(
                "invalid reference time {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    Ok(Identification {
        center: read_u16(data, 5),
        sub_center: read_u16(data, 7),
        table_version: data[9],
        local_table_version: data[10],
        significance_of_reference_time: data[11],
        reference_time,
        production_status: data[19],
        data_type: data[20],
    })
}

/// Parse Section 3 (Grid Definition).
///
/// Only the latitude/longitude templates (3.0 and Gaussian 3.40) describe a
/// grid the viewer can place; anything else is rejected.
pub fn parse_grid_definition(data: &[u8]) -> Result<GridDefinition, DecodeError> {
    require(3, data, 14)?;

    let num_data_points = read_u32(data, 6);
    let template = read_u16(data, 12);
    if template != 0 && template != 40 {
        return Err(DecodeError::InvalidSection {
            section: 3,
            reason: format!("unsupported grid template 3.{}", template),
        });
    }
    require(3, data, 72)?;

    let ni = read_u32(data, 30);
    let nj = read_u32(data, 34);
    let basic_angle = read_u32(data, 38);
    let subdivisions = read_u32(data, 42);
    // Microdegrees unless a basic angle and subdivisions are given
    let (basic, per) = if basic_angle == 0
        || basic_angle == MISSING_U32
        || subdivisions == 0
        || subdivisions == MISSING_U32
    {
        (1.0, 1e6)
    } else {
        (basic_angle as f64, subdivisions as f64)
    };

    let angle = |at: usize| decode_grib2_signed(&data[at..at + 4]) as f64 * basic / per;
    let increment = |at: usize| {
        let raw = read_u32(data, at);
        (raw != MISSING_U32).then(|| raw as f64 * basic / per)
    };

    Ok(GridDefinition {
        template,
        num_data_points,
        shape_of_earth: data[14],
        ni,
        nj,
        lat1: angle(46),
        lon1: angle(50),
        resolution_flags: data[54],
        lat2: angle(55),
        lon2: angle(59),
        di: increment(63),
        // Template 3.40 carries the number of parallels here instead
        dj: if template == 0 { increment(67) } else { None },
        scanning_mode: data[71],
    })
}

/// Parse Section 4 (Product Definition)
pub fn parse_product_definition(data: &[u8]) -> Result<ProductDefinition, DecodeError> {
    require(4, data, 11)?;

    let template = read_u16(data, 7);
    let mut product = ProductDefinition {
        template,
        parameter_category: data[9],
        parameter_number: data[10],
        generating_process: data.get(11).copied().unwrap_or(255),
        time_unit: None,
        forecast_time: None,
        first_surface: None,
        second_surface: None,
        time_range: None,
    };

    // Templates 4.0 to 4.15 share the horizontal-level layout
    if template > 15 || data.len() < 34 {
        return Ok(product);
    }

    product.time_unit = Some(data[17]);
    product.forecast_time = Some(decode_grib2_signed(&data[18..22]));
    product.first_surface = surface(data, 22);
    product.second_surface = surface(data, 28);

    let range_at = match template {
        8 => Some(48),
        11 => Some(51),
        _ => None,
    };
    if let Some(at) = range_at {
        if data.len() >= at + 5 {
            product.time_range = Some((data[at], decode_grib2_signed(&data[at + 1..at + 5])));
        }
    }

    Ok(product)
}

fn surface(data: &[u8], at: usize) -> Option<FixedSurface> {
    let surface_type = data[at];
    if surface_type == 255 {
        return None;
    }
    Some(FixedSurface {
        surface_type,
        scale_factor: decode_grib2_signed(&data[at + 1..at + 2]) as i8,
        scaled_value: read_u32(data, at + 2),
    })
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, DecodeError> {
    require(5, data, 11)?;

    let num_values = read_u32(data, 5);
    let template = read_u16(data, 9);

    // Templates 5.0, 5.2, 5.3, 5.40 and 5.41 all begin with the simple
    // packing parameters
    if data.len() < 21 {
        return Ok(DataRepresentation {
            num_values,
            template,
            reference_value: 0.0,
            binary_scale_factor: 0,
            decimal_scale_factor: 0,
            bits_per_value: 0,
            original_data_type: 0,
        });
    }

    Ok(DataRepresentation {
        num_values,
        template,
        reference_value: f32::from_be_bytes([data[11], data[12], data[13], data[14]]),
        binary_scale_factor: decode_grib2_signed(&data[15..17]) as i16,
        decimal_scale_factor: decode_grib2_signed(&data[17..19]) as i16,
        bits_per_value: data[19],
        original_data_type: data[20],
    })
}

/// Parse Section 6 (Bitmap)
pub fn parse_bitmap(data: &[u8]) -> Result<Bitmap, DecodeError> {
    require(6, data, 6)?;
    Ok(Bitmap {
        indicator: data[5],
        data: Bytes::copy_from_slice(&data[6..]),
    })
}

/// Parse Section 7 (Data)
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, DecodeError> {
    require(7, data, 5)?;
    Ok(DataSection {
        data: Bytes::copy_from_slice(&data[5..]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_decoding() {
        assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x00, 0x01]), -1);
        assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x03, 0xE8]), 1000);
        assert_eq!(decode_grib2_signed(&[0x80, 0x0E]), -14);
        assert_eq!(decode_grib2_signed(&[0x81]), -1);
        assert_eq!(decode_grib2_signed(&[]), 0);
    }

    #[test]
    fn test_indicator_editions() {
        let mut msg = vec![0u8; 16];
        msg[0..4].copy_from_slice(b"GRIB");
        msg[7] = 2;
        msg[15] = 200;
        let ind = parse_indicator(&msg).unwrap();
        assert_eq!(ind.edition, 2);
        assert_eq!(ind.message_length, 200);

        msg[4..7].copy_from_slice(&[0, 1, 0]);
        msg[7] = 1;
        assert_eq!(parse_indicator(&msg).unwrap().message_length, 256);

        msg[7] = 3;
        assert_eq!(parse_indicator(&msg), Err(DecodeError::UnsupportedEdition(3)));

        assert!(parse_indicator(b"GRIT").is_err());
    }

    #[test]
    fn test_surface_value_scaling() {
        let surface = FixedSurface {
            surface_type: 103,
            scale_factor: 1,
            scaled_value: 25,
        };
        assert!((surface.value() - 2.5).abs() < 1e-12);

        let missing = FixedSurface {
            surface_type: 1,
            scale_factor: 0,
            scaled_value: MISSING_U32,
        };
        assert_eq!(missing.value(), 0.0);
    }
}
