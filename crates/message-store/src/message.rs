//! A parsed GRIB2 message: headers, attributes and sample decoding.

use std::io::Cursor;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use gribview_common::{AttributeTable, DecodeError, DecodedGrid, GridExtent};
use tracing::debug;

use crate::sections::{
    find_section, parse_bitmap, parse_data_representation, parse_data_section,
    parse_grid_definition, parse_identification, parse_indicator, parse_product_definition,
    section_spans, Bitmap, DataRepresentation, DataSection, GridDefinition, Identification,
    Indicator, ProductDefinition,
};
use crate::tables;
use crate::unpacking::{apply_bitmap, reorder_scan, unpack_simple};

/// Largest grid decoded; a 0.01 degree global grid is about 6.5e8 points.
pub const MAX_GRID_POINTS: usize = 1 << 30;

/// One GRIB2 message with the sections of its first field parsed.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    pub raw: Bytes,
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid: GridDefinition,
    pub product: ProductDefinition,
    pub representation: DataRepresentation,
    pub bitmap: Option<Bitmap>,
    pub data: DataSection,
}

impl Grib2Message {
    /// Parse a complete message, `GRIB` through `7777`.
    pub fn parse(raw: Bytes) -> Result<Self, DecodeError> {
        let indicator = parse_indicator(&raw)?;
        if indicator.edition != 2 {
            return Err(DecodeError::UnsupportedEdition(indicator.edition));
        }
        if (indicator.message_length as usize) > raw.len() {
            return Err(DecodeError::Format(format!(
                "message declares {} bytes, only {} available",
                indicator.message_length,
                raw.len()
            )));
        }

        let spans = section_spans(&raw)?;
        let section = |number: u8| {
            find_section(&raw, &spans, number).ok_or_else(|| DecodeError::InvalidSection {
                section: number,
                reason: "missing".to_string(),
            })
        };

        let identification = parse_identification(section(1)?)?;
        let grid = parse_grid_definition(section(3)?)?;
        let product = parse_product_definition(section(4)?)?;
        let representation = parse_data_representation(section(5)?)?;
        let bitmap = find_section(&raw, &spans, 6).map(parse_bitmap).transpose()?;
        let data = parse_data_section(section(7)?)?;

        Ok(Self {
            raw,
            indicator,
            identification,
            grid,
            product,
            representation,
            bitmap,
            data,
        })
    }

    pub fn extent(&self) -> GridExtent {
        GridExtent::new(
            self.grid.ni as usize,
            self.grid.nj as usize,
            self.grid.lat1,
            self.grid.lon1,
            self.grid.lat2,
            self.grid.lon2,
        )
    }

    pub fn short_name(&self) -> &'static str {
        tables::parameter_short_name(
            self.indicator.discipline,
            self.product.parameter_category,
            self.product.parameter_number,
        )
    }

    /// Level value in display units, "0" when the product carries none.
    pub fn level(&self) -> String {
        match self.product.first_surface {
            Some(s) => tables::format_number(tables::level_in_display_unit(
                s.surface_type,
                s.value(),
            )),
            None => "0".to_string(),
        }
    }

    /// Start and end of the forecast step in seconds, for fixed-length units.
    fn step_seconds(&self) -> Option<(i64, i64)> {
        let unit = self.product.time_unit?;
        let start = self.product.forecast_time? * tables::time_unit_seconds(unit)?;
        let end = match self.product.time_range {
            Some((range_unit, length)) => start + length * tables::time_unit_seconds(range_unit)?,
            None => start,
        };
        Some((start, end))
    }

    fn step_strings(&self) -> (String, String) {
        if let Some((start, end)) = self.step_seconds() {
            return (
                tables::format_step_seconds(start),
                tables::format_step_seconds(end),
            );
        }
        match (self.product.forecast_time, self.product.time_unit) {
            (Some(ft), Some(unit)) => {
                let step = tables::format_step(ft, unit);
                (step.clone(), step)
            }
            _ => ("0".to_string(), "0".to_string()),
        }
    }

    pub fn validity_time(&self) -> DateTime<Utc> {
        let reference = self.identification.reference_time;
        match self.step_seconds() {
            Some((_, end)) => tables::valid_time(reference, end, 13),
            None => reference,
        }
    }

    /// The handful of keys listed for every record at load time.
    pub fn bootstrap_attributes(&self) -> AttributeTable {
        let reference = &self.identification.reference_time;
        let validity = self.validity_time();
        let (start, end) = self.step_strings();
        let step_range = if start == end {
            end.clone()
        } else {
            format!("{}-{}", start, end)
        };

        let mut attrs = AttributeTable::new();
        attrs.insert("shortName", self.short_name());
        attrs.insert("level", self.level());
        attrs.insert("dataDate", tables::date_key(reference));
        attrs.insert("dataTime", tables::time_key(reference));
        attrs.insert("Ni", self.grid.ni.to_string());
        attrs.insert("Nj", self.grid.nj.to_string());
        attrs.insert("startStep", start);
        attrs.insert("endStep", end);
        attrs.insert("stepRange", step_range);
        attrs.insert("validityDate", tables::date_key(&validity));
        attrs.insert("validityTime", tables::time_key(&validity));
        attrs
    }

    /// Every key this parser knows, bootstrap keys included.
    pub fn full_attributes(&self) -> AttributeTable {
        let mut attrs = self.bootstrap_attributes();
        let id = &self.identification;
        let grid = &self.grid;
        let product = &self.product;
        let rep = &self.representation;

        attrs.insert("editionNumber", self.indicator.edition.to_string());
        attrs.insert("discipline", self.indicator.discipline.to_string());
        attrs.insert("totalLength", self.indicator.message_length.to_string());
        attrs.insert("centre", tables::centre_name(id.center));
        attrs.insert("subCentre", id.sub_center.to_string());
        attrs.insert("tablesVersion", id.table_version.to_string());
        attrs.insert("localTablesVersion", id.local_table_version.to_string());
        attrs.insert(
            "significanceOfReferenceTime",
            id.significance_of_reference_time.to_string(),
        );
        attrs.insert("productionStatusOfProcessedData", id.production_status.to_string());
        attrs.insert("typeOfProcessedData", id.data_type.to_string());

        attrs.insert("gridType", tables::grid_type_name(grid.template));
        attrs.insert("gridDefinitionTemplateNumber", grid.template.to_string());
        attrs.insert("numberOfDataPoints", grid.num_data_points.to_string());
        attrs.insert("shapeOfTheEarth", grid.shape_of_earth.to_string());
        attrs.insert("latitudeOfFirstGridPointInDegrees", tables::format_number(grid.lat1));
        attrs.insert("longitudeOfFirstGridPointInDegrees", tables::format_number(grid.lon1));
        attrs.insert("latitudeOfLastGridPointInDegrees", tables::format_number(grid.lat2));
        attrs.insert("longitudeOfLastGridPointInDegrees", tables::format_number(grid.lon2));
        if let Some(di) = grid.di {
            attrs.insert("iDirectionIncrementInDegrees", tables::format_number(di));
        }
        if let Some(dj) = grid.dj {
            attrs.insert("jDirectionIncrementInDegrees", tables::format_number(dj));
        }
        attrs.insert("resolutionAndComponentFlags", grid.resolution_flags.to_string());
        attrs.insert("scanningMode", grid.scanning_mode.to_string());
        attrs.insert("iScansNegatively", ((grid.scanning_mode >> 7) & 1).to_string());
        attrs.insert("jScansPositively", ((grid.scanning_mode >> 6) & 1).to_string());
        attrs.insert("jPointsAreConsecutive", ((grid.scanning_mode >> 5) & 1).to_string());

        attrs.insert("productDefinitionTemplateNumber", product.template.to_string());
        attrs.insert("parameterCategory", product.parameter_category.to_string());
        attrs.insert("parameterNumber", product.parameter_number.to_string());
        attrs.insert("typeOfGeneratingProcess", product.generating_process.to_string());
        if let Some(unit) = product.time_unit {
            attrs.insert("indicatorOfUnitOfTimeRange", unit.to_string());
            attrs.insert("stepUnits", tables::time_unit_name(unit));
        }
        if let Some(ft) = product.forecast_time {
            attrs.insert("forecastTime", ft.to_string());
        }
        if let Some((unit, length)) = product.time_range {
            attrs.insert("indicatorOfUnitForTimeRange", unit.to_string());
            attrs.insert("lengthOfTimeRange", length.to_string());
        }
        if let Some(surface) = product.first_surface {
            attrs.insert("typeOfFirstFixedSurface", surface.surface_type.to_string());
            attrs.insert("scaleFactorOfFirstFixedSurface", surface.scale_factor.to_string());
            attrs.insert("scaledValueOfFirstFixedSurface", surface.scaled_value.to_string());
            attrs.insert("typeOfLevel", tables::level_type_name(surface.surface_type));
            attrs.insert(
                "levelDescription",
                tables::level_description(surface.surface_type, &self.level()),
            );
        }
        if let Some(surface) = product.second_surface {
            attrs.insert("typeOfSecondFixedSurface", surface.surface_type.to_string());
            attrs.insert("scaleFactorOfSecondFixedSurface", surface.scale_factor.to_string());
            attrs.insert("scaledValueOfSecondFixedSurface", surface.scaled_value.to_string());
        }

        attrs.insert("dataRepresentationTemplateNumber", rep.template.to_string());
        attrs.insert("packingType", tables::packing_type_name(rep.template));
        attrs.insert("numberOfValues", rep.num_values.to_string());
        attrs.insert("referenceValue", rep.reference_value.to_string());
        attrs.insert("binaryScaleFactor", rep.binary_scale_factor.to_string());
        attrs.insert("decimalScaleFactor", rep.decimal_scale_factor.to_string());
        attrs.insert("bitsPerValue", rep.bits_per_value.to_string());

        let bitmap_indicator = self.bitmap.as_ref().map_or(255, |b| b.indicator);
        attrs.insert("bitMapIndicator", bitmap_indicator.to_string());
        attrs.insert("bitmapPresent", u8::from(bitmap_indicator == 0).to_string());

        // Bulk arrays are summarized, never dumped
        attrs.insert("values", format!("<{} values>", grid.num_data_points));
        if let Some(bits) = self.bitmap.as_ref().and_then(|b| b.bits()) {
            attrs.insert("bitmap", format!("<{} bytes>", bits.len()));
        }

        attrs
    }

    /// Number of grid points, once the header sizes agree with each other
    /// and with the bytes actually present.
    fn checked_num_points(&self) -> Result<usize, DecodeError> {
        let declared = self.grid.num_data_points as usize;
        let num_points = (self.grid.ni as usize)
            .checked_mul(self.grid.nj as usize)
            .filter(|n| *n == declared)
            .ok_or_else(|| {
                DecodeError::Format(format!(
                    "grid is {}x{} but declares {} data points",
                    self.grid.ni, self.grid.nj, declared
                ))
            })?;
        if num_points == 0 || num_points > MAX_GRID_POINTS {
            return Err(DecodeError::Format(format!("grid of {} points", num_points)));
        }

        if self.representation.template == 0 {
            let present = match self.bitmap.as_ref().and_then(|b| b.bits()) {
                Some(bits) => count_present(bits, num_points),
                None => num_points,
            };
            let needed = (self.representation.bits_per_value as usize * present).div_ceil(8);
            if needed > self.data.data.len() {
                return Err(DecodeError::Format(format!(
                    "{} values of {} bits need {} bytes, data section has {}",
                    present,
                    self.representation.bits_per_value,
                    needed,
                    self.data.data.len()
                )));
            }
        }

        Ok(num_points)
    }

    /// Decode the samples into a row-major grid.
    pub fn decode(&self) -> Result<DecodedGrid, DecodeError> {
        let extent = self.extent();
        let num_points = self.checked_num_points()?;
        let bitmap = self.bitmap.as_ref().and_then(|b| b.bits());

        let stored = if self.representation.template == 0 {
            unpack_simple(
                &self.data.data,
                num_points,
                self.representation.bits_per_value,
                self.representation.reference_value,
                self.representation.binary_scale_factor,
                self.representation.decimal_scale_factor,
                bitmap,
            )?
        } else {
            let values = decode_with_grib_crate(&self.raw)?;
            if values.len() == num_points {
                values
            } else {
                apply_bitmap(&values, num_points, bitmap)
            }
        };

        if stored.len() != num_points {
            return Err(DecodeError::Unpacking(format!(
                "decoded {} values for a {}x{} grid",
                stored.len(),
                extent.ni,
                extent.nj
            )));
        }

        let values = reorder_scan(stored, extent.ni, extent.nj, self.grid.scanning_mode);
        Ok(DecodedGrid::new(extent, values))
    }
}

/// Set bits among the first `num_points` bitmap bits; missing bytes count as present.
fn count_present(bits: &[u8], num_points: usize) -> usize {
    let covered = bits.len().saturating_mul(8).min(num_points);
    let full = covered / 8;
    let mut count: usize = bits[..full].iter().map(|b| b.count_ones() as usize).sum();
    if covered % 8 != 0 {
        count += (bits[full] >> (8 - covered % 8)).count_ones() as usize;
    }
    count + (num_points - covered)
}

/// Decode the first field of a message through the `grib` crate.
fn decode_with_grib_crate(raw: &[u8]) -> Result<Vec<f64>, DecodeError> {
    let grib2 = grib::from_reader(Cursor::new(raw))
        .map_err(|e| DecodeError::Format(format!("grib crate: {}", e)))?;

    let (position, submessage) = grib2
        .iter()
        .next()
        .ok_or_else(|| DecodeError::Format("message has no fields".to_string()))?;
    debug!(position = ?position, "Decoding field through grib crate");

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| DecodeError::Unpacking(format!("{}", e)))?;
    let values = decoder
        .dispatch()
        .map_err(|e| DecodeError::Unpacking(format!("{}", e)))?;

    let samples: Vec<f64> = values.map(|v| v as f64).collect();
    Ok(samples)
}
