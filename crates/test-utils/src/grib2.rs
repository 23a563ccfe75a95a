//! Synthetic GRIB2 messages.
//!
//! Builds minimal but well-formed edition 2 messages: regular lat/lon grid
//! (template 3.0), analysis/forecast product (template 4.0), simple packing
//! (template 5.0) with 16 bits per value, and a bitmap whenever the data
//! contains NaN.

/// Build a minimal GRIB2 message with the specified parameters
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    // Grid definition
    ni: u32,
    nj: u32,
    la1: i32, // microdegrees
    lo1: i32,
    la2: i32,
    lo2: i32,
    di: u32,
    dj: u32,
    scanning_mode: u8,
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    time_unit: u8,
    forecast_time: u32,
    // Data
    data_values: Vec<f64>,
}

impl Default for Grib2Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Grib2Builder {
    /// 2x2 temperature field at 850 hPa covering lat 10..0, lon 0..10.
    pub fn new() -> Self {
        Self {
            discipline: 0,
            center: 98,
            year: 2024,
            month: 1,
            day: 15,
            hour: 12,
            minute: 0,
            ni: 2,
            nj: 2,
            la1: 10_000_000,
            lo1: 0,
            la2: 0,
            lo2: 10_000_000,
            di: 10_000_000,
            dj: 10_000_000,
            scanning_mode: 0,
            param_category: 0,
            param_number: 0,
            level_type: 100,
            level_value: 85_000,
            time_unit: 1,
            forecast_time: 0,
            data_values: vec![280.0, 281.0, 282.0, 283.0],
        }
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    /// Resize the grid; data is reset to zeros.
    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self.update_increments();
        self
    }

    /// Corner coordinates in degrees (first and last grid point).
    pub fn with_corners(mut self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        self.la1 = (lat1 * 1e6).round() as i32;
        self.lo1 = (lon1 * 1e6).round() as i32;
        self.la2 = (lat2 * 1e6).round() as i32;
        self.lo2 = (lon2 * 1e6).round() as i32;
        self.update_increments();
        self
    }

    pub fn with_discipline(mut self, discipline: u8) -> Self {
        self.discipline = discipline;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_level(mut self, level_type: u8, level_value: u32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.time_unit = 1;
        self.forecast_time = hour;
        self
    }

    /// Forecast time in an arbitrary unit of GRIB2 code table 4.4.
    pub fn with_forecast_time(mut self, unit: u8, value: u32) -> Self {
        self.time_unit = unit;
        self.forecast_time = value;
        self
    }

    pub fn with_scanning_mode(mut self, mode: u8) -> Self {
        self.scanning_mode = mode;
        self
    }

    pub fn with_constant_value(mut self, value: f64) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    pub fn with_gradient(mut self, min_val: f64, max_val: f64) -> Self {
        let n = (self.ni * self.nj) as usize;
        let last = n.saturating_sub(1).max(1) as f64;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f64 / last))
            .collect();
        self
    }

    /// Row-major samples; NaN marks a point missing from the bitmap.
    pub fn with_data(mut self, data: Vec<f64>) -> Self {
        self.data_values = data;
        self
    }

    fn update_increments(&mut self) {
        if self.ni > 1 {
            self.di = ((self.lo2 as i64 - self.lo1 as i64).unsigned_abs() / (self.ni as u64 - 1)) as u32;
        }
        if self.nj > 1 {
            self.dj = ((self.la2 as i64 - self.la1 as i64).unsigned_abs() / (self.nj as u64 - 1)) as u32;
        }
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Vec<u8> {
        let section1 = self.build_section1();
        let section3 = self.build_section3();
        let section4 = self.build_section4();
        let section5 = self.build_section5();
        let section6 = self.build_section6();
        let section7 = self.build_section7();

        let message_length = 16
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4;

        let mut message = Vec::with_capacity(message_length);

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]);
        message.push(self.discipline);
        message.push(2);
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        message.extend_from_slice(&section1);
        message.extend_from_slice(&section3);
        message.extend_from_slice(&section4);
        message.extend_from_slice(&section5);
        message.extend_from_slice(&section6);
        message.extend_from_slice(&section7);

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(0); // Local table version
        section.push(1); // Start of forecast

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(self.minute);
        section.push(0); // Second

        section.push(0); // Operational products
        section.push(1); // Forecast products

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&72u32.to_be_bytes());
        section.push(3);

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0);
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 3.0

        section.push(6); // Shape of Earth
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes()); // Subdivisions

        section.extend_from_slice(&sign_magnitude_32(self.la1));
        section.extend_from_slice(&sign_magnitude_32(self.lo1));
        section.push(48); // Resolution and component flags
        section.extend_from_slice(&sign_magnitude_32(self.la2));
        section.extend_from_slice(&sign_magnitude_32(self.lo2));
        section.extend_from_slice(&self.di.to_be_bytes());
        section.extend_from_slice(&self.dj.to_be_bytes());
        section.push(self.scanning_mode);

        section
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&34u32.to_be_bytes());
        section.push(4);

        section.extend_from_slice(&0u16.to_be_bytes()); // Coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 4.0

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Forecast
        section.push(0);
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(self.time_unit);
        section.extend_from_slice(&self.forecast_time.to_be_bytes());

        section.push(self.level_type);
        section.push(0);
        section.extend_from_slice(&self.level_value.to_be_bytes());

        section.push(255); // No second surface
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data_values.iter().copied().filter(|v| !v.is_nan())
    }

    fn has_bitmap(&self) -> bool {
        self.data_values.iter().any(|v| v.is_nan())
    }

    /// Reference value, binary scale factor and bits per value.
    fn packing_parameters(&self) -> (f32, i16, u8) {
        let (min_val, max_val) = self
            .present_values()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

        if !min_val.is_finite() {
            return (0.0, 0, 0);
        }

        let range = max_val - min_val;
        if range == 0.0 {
            return (min_val as f32, 0, 0);
        }

        // value = R + X * 2^E with X < 2^16
        let binary_scale_factor = (range / 65535.0).log2().ceil() as i16;
        (min_val as f32, binary_scale_factor, 16)
    }

    fn build_section5(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing_parameters();
        let num_values = self.present_values().count() as u32;

        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5);

        section.extend_from_slice(&num_values.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&reference_value.to_be_bytes());
        section.extend_from_slice(&sign_magnitude_16(binary_scale_factor));
        section.extend_from_slice(&sign_magnitude_16(0)); // Decimal scale factor
        section.push(bits_per_value);
        section.push(0); // Floating point

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::new();
        if !self.has_bitmap() {
            section.extend_from_slice(&6u32.to_be_bytes());
            section.push(6);
            section.push(255);
            return section;
        }

        let mut bitmap = vec![0u8; self.data_values.len().div_ceil(8)];
        for (i, v) in self.data_values.iter().enumerate() {
            if !v.is_nan() {
                bitmap[i / 8] |= 0x80 >> (i % 8);
            }
        }

        section.extend_from_slice(&(6 + bitmap.len() as u32).to_be_bytes());
        section.push(6);
        section.push(0);
        section.extend_from_slice(&bitmap);
        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let packed_data = self.pack_simple();

        let mut section = Vec::new();
        section.extend_from_slice(&(5 + packed_data.len() as u32).to_be_bytes());
        section.push(7);
        section.extend_from_slice(&packed_data);
        section
    }

    fn pack_simple(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing_parameters();
        if bits_per_value == 0 {
            return Vec::new();
        }

        let binary_scale = 2.0_f64.powi(binary_scale_factor as i32);
        let mut packed = Vec::new();
        for val in self.present_values() {
            let scaled = ((val - reference_value as f64) / binary_scale).round();
            let packed_value = scaled.clamp(0.0, u16::MAX as f64) as u16;
            packed.extend_from_slice(&packed_value.to_be_bytes());
        }
        packed
    }
}

/// GRIB2 signed integers: sign bit followed by the magnitude.
fn sign_magnitude_32(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 { magnitude | 0x8000_0000 } else { magnitude };
    raw.to_be_bytes()
}

fn sign_magnitude_16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}

/// A syntactically framed GRIB edition 1 message of `total_len` bytes.
///
/// Only the indicator and end marker are meaningful; the body is zeros.
pub fn grib1_stub(total_len: usize) -> Vec<u8> {
    let total_len = total_len.max(12);
    let mut message = vec![0u8; total_len];
    message[0..4].copy_from_slice(b"GRIB");
    let len = (total_len as u32).to_be_bytes();
    message[4..7].copy_from_slice(&len[1..4]);
    message[7] = 1;
    message[total_len - 4..].copy_from_slice(b"7777");
    message
}

/// Overwrite Ni and Nj in a message built by [`Grib2Builder`], leaving the
/// declared number of data points alone.
pub fn overwrite_grid_dimensions(message: &mut [u8], ni: u32, nj: u32) {
    // Indicator, then the 21-byte section 1; Ni and Nj sit at octets 31-38 of section 3
    let ni_at = 16 + 21 + 30;
    message[ni_at..ni_at + 4].copy_from_slice(&ni.to_be_bytes());
    message[ni_at + 4..ni_at + 8].copy_from_slice(&nj.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_default_message() {
        let msg = Grib2Builder::new().build();
        assert_eq!(&msg[0..4], b"GRIB");
        assert_eq!(msg[7], 2);
        assert_eq!(&msg[msg.len() - 4..], b"7777");

        let declared = u64::from_be_bytes(msg[8..16].try_into().unwrap());
        assert_eq!(declared as usize, msg.len());
    }

    #[test]
    fn test_bitmap_only_when_missing() {
        let plain = Grib2Builder::new().build();
        let with_gap = Grib2Builder::new()
            .with_data(vec![1.0, f64::NAN, 3.0, 4.0])
            .build();
        // One bitmap byte, one fewer packed value (2 bytes)
        assert_eq!(with_gap.len() + 1, plain.len());
    }

    #[test]
    fn test_sign_magnitude() {
        assert_eq!(sign_magnitude_32(-1), [0x80, 0, 0, 1]);
        assert_eq!(sign_magnitude_16(-14), [0x80, 14]);
        assert_eq!(sign_magnitude_16(3), [0, 3]);
    }

    #[test]
    fn test_grib1_stub_framing() {
        let msg = grib1_stub(40);
        assert_eq!(msg.len(), 40);
        assert_eq!(msg[7], 1);
        assert_eq!(&msg[4..7], &[0, 0, 40]);
    }
}
