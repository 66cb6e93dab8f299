//! GRIB2 section parsing.
//!
//! This module handles parsing of individual GRIB2 message sections.
//! Each GRIB2 message consists of multiple sections containing
//! metadata, grid information, and compressed data.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use gfs_common::{GridSpec, ScanMode};

use crate::tables::Grib2Tables;
use crate::Grib2Error;

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
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
///
/// Coordinates are kept in microdegrees as transmitted.
#[derive(Debug, Clone)]
pub struct GridDefinition {
    pub template: u16,
    pub num_data_points: u32,
    pub grid_shape: u8,
    pub num_points_latitude: u32,
    pub num_points_longitude: u32,
    pub first_latitude_microdegrees: i32,
    pub first_longitude_microdegrees: i32,
    pub last_latitude_microdegrees: i32,
    pub last_longitude_microdegrees: i32,
    /// Di: increment between columns
    pub longitude_increment_microdegrees: u32,
    /// Dj: increment between rows
    pub latitude_increment_microdegrees: u32,
    pub scanning_mode: u8,
}

impl GridDefinition {
    /// Convert a template 3.0 grid into a regular lat/lon grid spec.
    pub fn to_grid_spec(&self) -> Result<GridSpec, Grib2Error> {
        if self.template != 0 {
            return Err(Grib2Error::UnsupportedTemplate {
                section: 3,
                template: self.template,
            });
        }

        let scan_mode = ScanMode::from_grib2_flag(self.scanning_mode);
        let di = self.longitude_increment_microdegrees as f64 / 1e6;
        let dj = self.latitude_increment_microdegrees as f64 / 1e6;

        Ok(GridSpec::new(
            self.num_points_longitude as usize,
            self.num_points_latitude as usize,
            if scan_mode.i_negative { -di } else { di },
            if scan_mode.j_positive { dj } else { -dj },
            self.first_longitude_microdegrees as f64 / 1e6,
            self.first_latitude_microdegrees as f64 / 1e6,
            scan_mode,
        ))
    }
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub parameter_short_name: String,
    pub level_type: u8,
    pub level_value: u32,
    pub level_description: String,
    pub forecast_hour: u32,
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    pub num_data_points: u32,
    pub template: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    pub original_data_type: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub indicator: u8,
    pub data: Bytes,
}

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 1-4: "GRIB", 5-6: reserved, 7: discipline, 8: edition,
    // 9-16: total message length (8-byte big-endian)
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}",
            edition
        )));
    }

    let message_length = u64::from_be_bytes([
        data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
    ]);

    Ok(Indicator {
        discipline,
        edition,
        message_length,
    })
}

/// Parse Section 1 (Identification)
pub fn parse_identification(data: &[u8]) -> Result<Identification, Grib2Error> {
    let section_offset = find_section(data, 1)?;
    let sec = &data[section_offset..];

    if sec.len() < 21 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: "Not enough data".to_string(),
        });
    }

    let center = u16::from_be_bytes([sec[5], sec[6]]);
    let sub_center = u16::from_be_bytes([sec[7], sec[8]]);
    let table_version = sec[9];
    let local_table_version = sec[10];
    let significance_of_reference_time = sec[11];

    let year = u16::from_be_bytes([sec[12], sec[13]]);
    let (month, day, hour, minute, second) = (sec[14], sec[15], sec[16], sec[17], sec[18]);

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "Invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    Ok(Identification {
        center,
        sub_center,
        table_version,
        local_table_version,
        significance_of_reference_time,
        reference_time: DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc),
        production_status: sec[19],
        data_type: sec[20],
    })
}

/// Parse Section 3 (Grid Definition)
pub fn parse_grid_definition(data: &[u8]) -> Result<GridDefinition, Grib2Error> {
    let section_offset = find_section(data, 3)?;
    let section_data = &data[section_offset..];
    if section_data.len() < 14 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Not enough data".to_string(),
        });
    }

    // Bytes 6-9: number of data points, 12-13: template number,
    // template data from byte 14
    let num_data_points = u32::from_be_bytes([
        section_data[6],
        section_data[7],
        section_data[8],
        section_data[9],
    ]);
    let template = u16::from_be_bytes([section_data[12], section_data[13]]);
    let gd = &section_data[14..];

    if template != 0 {
        // Other projections keep only the point count; to_grid_spec rejects them.
        return Ok(GridDefinition {
            template,
            num_data_points,
            grid_shape: gd.first().copied().unwrap_or(0),
            num_points_latitude: 0,
            num_points_longitude: 0,
            first_latitude_microdegrees: 0,
            first_longitude_microdegrees: 0,
            last_latitude_microdegrees: 0,
            last_longitude_microdegrees: 0,
            longitude_increment_microdegrees: 0,
            latitude_increment_microdegrees: 0,
            scanning_mode: 0,
        });
    }

    // Template 3.0: Latitude/longitude (equidistant cylindrical)
    //
    // Byte 0: Shape of the Earth
    // Bytes 16-19: Ni, 20-23: Nj
    // Bytes 32-35: La1, 36-39: Lo1, 40: resolution flags
    // Bytes 41-44: La2, 45-48: Lo2
    // Bytes 49-52: Di, 53-56: Dj, 57: scanning mode
    if gd.len() < 58 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: format!("Template 0 needs at least 58 bytes, got {}", gd.len()),
        });
    }

    Ok(GridDefinition {
        template,
        num_data_points,
        grid_shape: gd[0],
        num_points_longitude: u32::from_be_bytes([gd[16], gd[17], gd[18], gd[19]]),
        num_points_latitude: u32::from_be_bytes([gd[20], gd[21], gd[22], gd[23]]),
        first_latitude_microdegrees: decode_grib2_signed(&gd[32..36]),
        first_longitude_microdegrees: decode_grib2_signed(&gd[36..40]),
        last_latitude_microdegrees: decode_grib2_signed(&gd[41..45]),
        last_longitude_microdegrees: decode_grib2_signed(&gd[45..49]),
        longitude_increment_microdegrees: u32::from_be_bytes([gd[49], gd[50], gd[51], gd[52]]),
        latitude_increment_microdegrees: u32::from_be_bytes([gd[53], gd[54], gd[55], gd[56]]),
        scanning_mode: gd[57],
    })
}

/// Parse Section 4 (Product Definition)
pub fn parse_product_definition(
    data: &[u8],
    discipline: u8,
    tables: &Grib2Tables,
) -> Result<ProductDefinition, Grib2Error> {
    let section_offset = find_section(data, 4)?;
    let section_data = &data[section_offset..];

    if section_data.len() < 28 {
        return Err(Grib2Error::InvalidSection {
            section: 4,
            reason: "Not enough data".to_string(),
        });
    }

    // Bytes 7-8: template, 9: category, 10: number, 17: time unit,
    // 18-21: forecast time, 22: first surface type, 23: scale factor,
    // 24-27: scaled value. Templates 4.0 and 4.8 share this prefix.
    let template = u16::from_be_bytes([section_data[7], section_data[8]]);
    let parameter_category = section_data[9];
    let parameter_number = section_data[10];
    let time_unit = section_data[17];
    let forecast_time = u32::from_be_bytes([
        section_data[18],
        section_data[19],
        section_data[20],
        section_data[21],
    ]);
    let forecast_hour = match time_unit {
        0 => forecast_time / 60,
        2 => forecast_time * 24,
        _ => forecast_time,
    };

    let level_type = section_data[22];
    let scale_factor = section_data[23] as i8;
    let scaled_value = u32::from_be_bytes([
        section_data[24],
        section_data[25],
        section_data[26],
        section_data[27],
    ]);
    let level_value = if scale_factor == 0 || scaled_value == u32::MAX {
        scaled_value
    } else {
        (scaled_value as f64 / 10f64.powi(scale_factor as i32)).round() as u32
    };

    Ok(ProductDefinition {
        template,
        parameter_category,
        parameter_number,
        parameter_short_name: tables.parameter_name(
            discipline,
            parameter_category,
            parameter_number,
        ),
        level_type,
        level_value,
        level_description: tables.level_name(level_type, level_value),
        forecast_hour,
    })
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let section_offset = find_section(data, 5)?;
    let section_data = &data[section_offset..];

    if section_data.len() < 21 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 6-9 [5-8]: number of packed values, 10-11 [9-10]: template.
    // Templates 5.0, 5.2, 5.3, 5.40 and 5.41 share the next fields:
    // [11-14] reference value (IEEE float), [15-16] binary scale (E),
    // [17-18] decimal scale (D), [19] bits per value, [20] original type.
    let num_data_points = u32::from_be_bytes([
        section_data[5],
        section_data[6],
        section_data[7],
        section_data[8],
    ]);
    let template = u16::from_be_bytes([section_data[9], section_data[10]]);

    Ok(DataRepresentation {
        num_data_points,
        template,
        reference_value: f32::from_be_bytes([
            section_data[11],
            section_data[12],
            section_data[13],
            section_data[14],
        ]),
        binary_scale_factor: decode_grib2_signed16(&section_data[15..17]),
        decimal_scale_factor: decode_grib2_signed16(&section_data[17..19]),
        bits_per_value: section_data[19],
        original_data_type: section_data[20],
    })
}

/// Parse Section 6 (Bitmap). Returns None when the indicator says no bitmap.
pub fn parse_bitmap(data: &[u8]) -> Result<Option<Bitmap>, Grib2Error> {
    let section_offset = match find_section(data, 6) {
        Ok(offset) => offset,
        Err(_) => return Ok(None),
    };
    let section_data = &data[section_offset..];

    if section_data.len() < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: "Not enough data".to_string(),
        });
    }

    let section_length = section_length_at(section_data, 0);
    if section_length < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Section length {} leaves no bitmap indicator", section_length),
        });
    }
    let indicator = section_data[5];

    match indicator {
        255 => Ok(None),
        0 => Ok(Some(Bitmap {
            indicator,
            data: Bytes::copy_from_slice(&section_data[6..section_length]),
        })),
        other => Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Unsupported bitmap indicator {}", other),
        }),
    }
}

/// Parse Section 7 (Data)
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, Grib2Error> {
    let section_offset = find_section(data, 7)?;
    let section_data = &data[section_offset..];
    let section_length = section_length_at(section_data, 0);

    let data_bytes = if section_length > 5 {
        Bytes::copy_from_slice(&section_data[5..section_length])
    } else {
        Bytes::new()
    };

    Ok(DataSection { data: data_bytes })
}

// ===== Helper Functions =====

/// Decode a 4-byte GRIB2 sign-magnitude integer (MSB is the sign bit).
///
/// Any other slice length decodes as 0.
pub fn decode_grib2_signed(bytes: &[u8]) -> i32 {
    let Ok(raw) = <[u8; 4]>::try_from(bytes) else {
        return 0;
    };
    let raw = u32::from_be_bytes(raw);
    let magnitude = (raw & 0x7FFF_FFFF) as i32;
    if raw & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Decode a 2-byte GRIB2 sign-magnitude integer.
pub fn decode_grib2_signed16(bytes: &[u8]) -> i16 {
    let Ok(raw) = <[u8; 2]>::try_from(bytes) else {
        return 0;
    };
    let raw = u16::from_be_bytes(raw);
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn section_length_at(data: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]) as usize
}

/// Find a section by number within a message
fn find_section(data: &[u8], section_num: u8) -> Result<usize, Grib2Error> {
    let mut offset = 16; // After Section 0

    loop {
        if offset + 4 <= data.len() && &data[offset..offset + 4] == b"7777" {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Reached end of message without finding section".to_string(),
            });
        }

        if offset + 5 > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Section not found".to_string(),
            });
        }

        let section_length = section_length_at(data, offset);

        if section_length < 5 || offset + section_length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Invalid section length".to_string(),
            });
        }

        if data[offset + 4] == section_num {
            return Ok(offset);
        }

        offset += section_length;
    }
}
