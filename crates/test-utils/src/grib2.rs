//! Synthetic GRIB2 message builder.
//!
//! Produces small but structurally complete GRIB2 edition 2 messages
//! (sections 0-8, grid template 3.0, product template 4.0, simple packing
//! 5.0) so parser and pipeline tests can run without downloading model data.

/// Build a minimal GRIB2 message with the specified parameters
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    // Grid definition
    ni: u32,
    nj: u32,
    la1: i32, // microdegrees
    lo1: i32,
    di: u32,
    dj: u32,
    scanning_mode: u8,
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    // Data, NaN marks a missing point (written through a bitmap)
    data_values: Vec<f32>,
}

impl Grib2Builder {
    /// 10x10 one-degree grid over the western US, 2 m temperature.
    pub fn new_gfs() -> Self {
        let ni = 10;
        let nj = 10;
        Self {
            discipline: 0,
            center: 7, // NCEP
            year: 2024,
            month: 3,
            day: 5,
            hour: 12,
            ni,
            nj,
            la1: 45_000_000,
            lo1: 230_000_000, // 230°E = 130°W
            di: 1_000_000,
            dj: 1_000_000,
            scanning_mode: 0, // +i, -j, i consecutive
            param_category: 0,
            param_number: 0, // TMP
            level_type: 103,
            level_value: 2,
            forecast_hour: 0,
            data_values: vec![288.15; (ni * nj) as usize],
        }
    }

    /// Surface wind gust on the same grid as `new_gfs`.
    pub fn new_gust() -> Self {
        Self::new_gfs()
            .with_parameter(2, 22)
            .with_level(1, 0)
            .with_constant_value(10.0)
    }

    /// Composite reflectivity on the same grid as `new_gfs`.
    pub fn new_reflectivity() -> Self {
        Self::new_gfs()
            .with_parameter(16, 196)
            .with_level(10, 0)
            .with_constant_value(0.0)
    }

    /// Whole-globe grid in the GFS layout: starts at 0°E, 90°N, runs
    /// north to south. `ni` columns span 360°, `nj` rows span 180°.
    pub fn with_global_grid(mut self, ni: u32, nj: u32) -> Self {
        let step = 360_000_000 / ni;
        self.ni = ni;
        self.nj = nj;
        self.la1 = 90_000_000;
        self.lo1 = 0;
        self.di = step;
        self.dj = 180_000_000 / nj.saturating_sub(1).max(1);
        self.scanning_mode = 0;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.data_values = vec![0.0; (ni * nj) as usize];
        self
    }

    /// First grid point and increments, in degrees.
    pub fn with_origin(mut self, lat: f64, lon: f64, di: f64, dj: f64) -> Self {
        self.la1 = (lat * 1e6).round() as i32;
        self.lo1 = (lon * 1e6).round() as i32;
        self.di = (di * 1e6).round() as u32;
        self.dj = (dj * 1e6).round() as u32;
        self
    }

    pub fn with_scanning_mode(mut self, flag: u8) -> Self {
        self.scanning_mode = flag;
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
        self.forecast_hour = hour;
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    pub fn with_gradient(mut self, min_val: f32, max_val: f32) -> Self {
        let n = (self.ni * self.nj) as usize;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f32 / n as f32))
            .collect();
        self
    }

    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data_values = data;
        self
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Vec<u8> {
        let sections = [
            self.build_section1(),
            self.build_section3(),
            self.build_section4(),
            self.build_section5(),
            self.build_section6(),
            self.build_section7(),
        ];

        let message_length = 16 + sections.iter().map(Vec::len).sum::<usize>() + 4;

        let mut message = Vec::with_capacity(message_length);
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]);
        message.push(self.discipline);
        message.push(2);
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        for section in &sections {
            message.extend_from_slice(section);
        }

        message.extend_from_slice(b"7777");
        message
    }

    fn la2(&self) -> i32 {
        let span = (self.nj.saturating_sub(1) * self.dj) as i32;
        if self.scanning_mode & 0x40 != 0 {
            self.la1 + span
        } else {
            self.la1 - span
        }
    }

    fn lo2(&self) -> i32 {
        let span = (self.ni.saturating_sub(1) as i64 * self.di as i64) as i32;
        if self.scanning_mode & 0x80 != 0 {
            self.lo1 - span
        } else {
            self.lo1 + span
        }
    }

    fn present_values(&self) -> Vec<f32> {
        self.data_values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect()
    }

    /// (reference value, binary scale factor, bits per value)
    fn packing(&self) -> (f32, i16, u8) {
        let present = self.present_values();
        let (min_val, max_val) = present.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &v| (min.min(v), max.max(v)),
        );

        if present.is_empty() {
            return (0.0, 0, 0);
        }

        let range = max_val - min_val;
        if range == 0.0 {
            return (min_val, 0, 0);
        }

        // 16-bit packing: range = 65535 * 2^E
        let binary_scale_factor = (range / 65535.0).log2().ceil() as i16;
        (min_val, binary_scale_factor, 16)
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Start of forecast

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0);
        section.push(0);

        section.push(0); // Operational
        section.push(1); // Forecast

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let section_length: u32 = 14 + 58;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(3);

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0);
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 3.0

        section.push(6); // Spherical earth, radius 6371229 m
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

        section.extend_from_slice(&encode_signed32(self.la1));
        section.extend_from_slice(&encode_signed32(self.lo1));
        section.push(48); // Resolution and component flags
        section.extend_from_slice(&encode_signed32(self.la2()));
        section.extend_from_slice(&encode_signed32(self.lo2()));
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
        section.push(96); // GFS generating process
        section.extend_from_slice(&0u16.to_be_bytes());
        section.push(0);
        section.push(1); // Hours
        section.extend_from_slice(&self.forecast_hour.to_be_bytes());

        section.push(self.level_type);
        section.push(0);
        section.extend_from_slice(&self.level_value.to_be_bytes());

        section.push(255); // No second surface
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_section5(&self) -> Vec<u8> {
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing();

        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5);

        section.extend_from_slice(&(self.present_values().len() as u32).to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&reference_value.to_be_bytes());
        section.extend_from_slice(&encode_signed16(binary_scale_factor));
        section.extend_from_slice(&encode_signed16(0));
        section.push(bits_per_value);
        section.push(0); // Floating point

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let has_missing = self.data_values.iter().any(|v| v.is_nan());

        let mut section = Vec::new();
        if !has_missing {
            section.extend_from_slice(&6u32.to_be_bytes());
            section.push(6);
            section.push(255); // No bitmap
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
        section.push(0); // Bitmap follows
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
        let (reference_value, binary_scale_factor, bits_per_value) = self.packing();
        if bits_per_value == 0 {
            return Vec::new();
        }

        let binary_scale = 2.0_f64.powi(binary_scale_factor as i32);
        self.present_values()
            .iter()
            .flat_map(|&val| {
                let packed = ((val as f64 - reference_value as f64) / binary_scale)
                    .round()
                    .clamp(0.0, 65535.0) as u16;
                packed.to_be_bytes()
            })
            .collect()
    }
}

/// GRIB2 sign-magnitude encoding of a 32-bit integer.
pub fn encode_signed32(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 { magnitude | 0x8000_0000 } else { magnitude };
    raw.to_be_bytes()
}

/// GRIB2 sign-magnitude encoding of a 16-bit integer.
pub fn encode_signed16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_gfs_message() {
        let data = Grib2Builder::new_gfs().build();

        assert_eq!(&data[0..4], b"GRIB");
        assert_eq!(data[6], 0);
        assert_eq!(data[7], 2);
        assert_eq!(&data[data.len() - 4..], b"7777");

        let length = u64::from_be_bytes(data[8..16].try_into().unwrap());
        assert_eq!(length as usize, data.len());
    }

    #[test]
    fn test_missing_values_write_bitmap() {
        let mut values = vec![1.0f32; 16];
        values[3] = f32::NAN;
        let data = Grib2Builder::new_gfs()
            .with_grid(4, 4)
            .with_data(values)
            .build();
        let plain = Grib2Builder::new_gfs().with_grid(4, 4).build();

        // Two bitmap bytes added, one constant-valued point dropped (0 bits each)
        assert_eq!(data.len(), plain.len() + 2);
    }

    #[test]
    fn test_sign_magnitude() {
        assert_eq!(encode_signed32(-90_000_000), [0x85, 0x5D, 0x4A, 0x80]);
        assert_eq!(encode_signed32(90_000_000), [0x05, 0x5D, 0x4A, 0x80]);
        assert_eq!(encode_signed16(-10), [0x80, 0x0A]);
    }
}
