//! GRIB2 code table lookups used to label records.

use chrono::{DateTime, Duration, Utc};

/// Short parameter name for a discipline/category/number triple.
///
/// Unknown parameters fall back to "unknown".
pub fn parameter_short_name(discipline: u8, category: u8, number: u8) -> &'static str {
    match (discipline, category, number) {
        // Discipline 0: Meteorological products
        (0, 0, 0) => "TMP",
        (0, 0, 1) => "VTMP",
        (0, 0, 2) => "POT",
        (0, 0, 4) => "TMAX",
        (0, 0, 5) => "TMIN",
        (0, 0, 6) => "DPT",
        (0, 1, 0) => "SPFH",
        (0, 1, 1) => "RH",
        (0, 1, 3) => "PWAT",
        (0, 1, 7) => "PRATE",
        (0, 1, 8) => "APCP",
        (0, 1, 9) => "NCPCP",
        (0, 1, 10) => "ACPCP",
        (0, 1, 13) => "WEASD",
        (0, 2, 0) => "WDIR",
        (0, 2, 1) => "WIND",
        (0, 2, 2) => "UGRD",
        (0, 2, 3) => "VGRD",
        (0, 2, 8) => "VVEL",
        (0, 2, 10) => "ABSV",
        (0, 2, 22) => "GUST",
        (0, 3, 0) => "PRES",
        (0, 3, 1) => "PRMSL",
        (0, 3, 5) => "HGT",
        (0, 6, 1) => "TCDC",
        (0, 6, 3) => "LCDC",
        (0, 6, 4) => "MCDC",
        (0, 6, 5) => "HCDC",
        (0, 6, 6) => "CWAT",
        (0, 7, 6) => "CAPE",
        (0, 7, 7) => "CIN",
        (0, 7, 8) => "HLCY",
        (0, 16, 195) => "REFD",
        (0, 16, 196) => "REFC",
        (0, 19, 0) => "VIS",
        (0, 19, 11) => "TKE",

        // Discipline 2: Land surface
        (2, 0, 0) => "LAND",
        (2, 0, 192) => "SOILW",

        // Discipline 10: Oceanographic
        (10, 0, 3) => "HTSGW",
        (10, 3, 0) => "WTMP",

        _ => "unknown",
    }
}

/// ecCodes-style name for a fixed surface type (code table 4.5).
pub fn level_type_name(surface_type: u8) -> &'static str {
    match surface_type {
        1 => "surface",
        2 => "cloudBase",
        3 => "cloudTop",
        4 => "isothermZero",
        6 => "maxWind",
        7 => "tropopause",
        8 => "nominalTop",
        10 => "entireAtmosphere",
        100 => "isobaricInhPa",
        101 => "meanSea",
        102 => "heightAboveSea",
        103 => "heightAboveGround",
        104 => "sigma",
        105 => "hybrid",
        106 => "depthBelowLand",
        108 => "pressureFromGroundLayer",
        200 => "entireAtmosphere",
        _ => "unknown",
    }
}

/// Level value in the unit the level type is usually quoted in.
///
/// Isobaric surfaces are stored in Pa and reported in hPa.
pub fn level_in_display_unit(surface_type: u8, value: f64) -> f64 {
    if surface_type == 100 {
        value / 100.0
    } else {
        value
    }
}

/// Human description of a level, e.g. "850 hPa" or "2 m above ground".
pub fn level_description(surface_type: u8, level: &str) -> String {
    match surface_type {
        1 => "surface".to_string(),
        7 => "tropopause".to_string(),
        10 | 200 => "entire atmosphere".to_string(),
        100 => format!("{} hPa", level),
        101 => "mean sea level".to_string(),
        102 => format!("{} m above MSL", level),
        103 => format!("{} m above ground", level),
        105 => format!("hybrid level {}", level),
        106 => format!("{} m below surface", level),
        _ => format!("Level type {} value {}", surface_type, level),
    }
}

/// Format a number the way record attributes carry it: integers without a
/// fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Seconds per unit of GRIB2 code table 4.4, for the fixed-length units.
pub fn time_unit_seconds(unit: u8) -> Option<i64> {
    match unit {
        0 => Some(60),
        1 => Some(3_600),
        2 => Some(86_400),
        10 => Some(3 * 3_600),
        11 => Some(6 * 3_600),
        12 => Some(12 * 3_600),
        13 => Some(1),
        _ => None,
    }
}

/// Name of a GRIB2 time unit, for the full attribute dump.
pub fn time_unit_name(unit: u8) -> &'static str {
    match unit {
        0 => "m",
        1 => "h",
        2 => "D",
        3 => "M",
        4 => "Y",
        10 => "3h",
        11 => "6h",
        12 => "12h",
        13 => "s",
        _ => "unknown",
    }
}

/// A step expressed as hours when whole, otherwise minutes or seconds with
/// a unit suffix.
pub fn format_step_seconds(seconds: i64) -> String {
    if seconds % 3_600 == 0 {
        (seconds / 3_600).to_string()
    } else if seconds % 60 == 0 {
        format!("{}m", seconds / 60)
    } else {
        format!("{}s", seconds)
    }
}

/// Step text for a value in an arbitrary unit.
pub fn format_step(value: i64, unit: u8) -> String {
    match time_unit_seconds(unit) {
        Some(seconds) => format_step_seconds(value * seconds),
        None => format!("{}{}", value, time_unit_name(unit)),
    }
}

/// Reference time shifted by a step, when the unit has a fixed length.
pub fn valid_time(reference: DateTime<Utc>, value: i64, unit: u8) -> DateTime<Utc> {
    time_unit_seconds(unit)
        .and_then(|s| reference.checked_add_signed(Duration::seconds(value * s)))
        .unwrap_or(reference)
}

/// `YYYYMMDD` date key.
pub fn date_key(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%d").to_string()
}

/// `HHMM` time key without leading zeros, e.g. "0" for midnight, "1200".
pub fn time_key(time: &DateTime<Utc>) -> String {
    use chrono::Timelike;
    (time.hour() * 100 + time.minute()).to_string()
}

/// Name of a data representation template (code table 5.0).
pub fn packing_type_name(template: u16) -> &'static str {
    match template {
        0 => "grid_simple",
        2 => "grid_complex",
        3 => "grid_complex_spatial_differencing",
        40 => "grid_jpeg",
        41 => "grid_png",
        200 => "grid_run_length",
        _ => "unknown",
    }
}

/// Name of a grid definition template (code table 3.1).
pub fn grid_type_name(template: u16) -> &'static str {
    match template {
        0 => "regular_ll",
        1 => "rotated_ll",
        10 => "mercator",
        20 => "polar_stereographic",
        30 => "lambert",
        40 => "regular_gg",
        90 => "space_view",
        _ => "unknown",
    }
}

/// Originating centre acronym (common code table C-11).
pub fn centre_name(center: u16) -> String {
    match center {
        7 => "kwbc".to_string(),
        34 => "rjtd".to_string(),
        54 => "cwao".to_string(),
        74 => "egrr".to_string(),
        78 => "edzw".to_string(),
        85 => "lfpw".to_string(),
        98 => "ecmf".to_string(),
        other => other.to_string(),
    }
}
