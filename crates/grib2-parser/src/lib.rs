//! GRIB2 parser implementation (WMO FM 92 GRIB Edition 2).
//!
//! Splits a GRIB2 file into messages, parses the metadata sections and
//! unpacks the data values of regular lat/lon fields such as the GFS 0.25°
//! products.
//!
//! ```no_run
//! use bytes::Bytes;
//! use grib2_parser::Grib2Reader;
//!
//! # fn demo(data: Bytes) -> Result<(), grib2_parser::Grib2Error> {
//! let mut reader = Grib2Reader::new(data);
//! while let Some(message) = reader.next_message()? {
//!     println!("{} @ {}", message.parameter(), message.level());
//! }
//! # Ok(())
//! # }
//! ```

pub mod sections;
pub mod tables;
pub mod unpacking;

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use gfs_common::GridSpec;
use thiserror::Error;
use tracing::{debug, trace};

pub use sections::{
    Bitmap, DataRepresentation, DataSection, GridDefinition, Identification, Indicator,
    ProductDefinition,
};
pub use tables::{Grib2Tables, LevelDescription};

/// Errors raised while reading GRIB2 data.
#[derive(Error, Debug)]
pub enum Grib2Error {
    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Unsupported template {template} in section {section}")]
    UnsupportedTemplate { section: u8, template: u16 },

    #[error("Unpacking error: {0}")]
    UnpackingError(String),

    #[error("No {parameter} field at level type {level_type} in GRIB2 data")]
    FieldNotFound { parameter: String, level_type: u8 },

    #[error("Grid error: {0}")]
    Grid(#[from] gfs_common::GfsError),
}

/// One parsed GRIB2 message.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    /// Byte offset of the message in the source buffer
    pub offset: usize,
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    pub bitmap: Option<Bitmap>,
    pub data_section: DataSection,
    /// The complete message, "GRIB" through "7777"
    pub raw_data: Bytes,
}

impl Grib2Message {
    /// Parameter short name, e.g. "GUST".
    pub fn parameter(&self) -> &str {
        &self.product_definition.parameter_short_name
    }

    /// Human-readable level, e.g. "2 m above ground".
    pub fn level(&self) -> &str {
        &self.product_definition.level_description
    }

    pub fn level_type(&self) -> u8 {
        self.product_definition.level_type
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.identification.reference_time
    }

    pub fn forecast_hour(&self) -> u32 {
        self.product_definition.forecast_hour
    }

    pub fn valid_time(&self) -> DateTime<Utc> {
        self.reference_time() + Duration::hours(self.forecast_hour() as i64)
    }

    /// Grid dimensions as (rows, columns).
    pub fn grid_dims(&self) -> (u32, u32) {
        (
            self.grid_definition.num_points_latitude,
            self.grid_definition.num_points_longitude,
        )
    }

    pub fn grid_spec(&self) -> Result<GridSpec, Grib2Error> {
        self.grid_definition.to_grid_spec()
    }

    /// Decode all grid values in scan order. Missing points are NaN.
    pub fn unpack_data(&self) -> Result<Vec<f32>, Grib2Error> {
        let num_points = self.grid_definition.num_data_points as usize;
        let dr = &self.data_representation;
        let bitmap = self.bitmap.as_ref().map(|b| b.data.as_ref());

        let values = match dr.template {
            0 => unpacking::unpack_simple(
                &self.data_section.data,
                self.grid_definition.num_data_points,
                dr.bits_per_value,
                dr.reference_value,
                dr.binary_scale_factor,
                dr.decimal_scale_factor,
                bitmap,
            )?,
            template => {
                trace!(template, "Decoding packed field with grib crate");
                self.unpack_with_grib_crate(num_points, bitmap)?
            }
        };

        if values.len() != num_points {
            return Err(Grib2Error::UnpackingError(format!(
                "decoded {} values, grid has {}",
                values.len(),
                num_points
            )));
        }

        Ok(values)
    }

    fn unpack_with_grib_crate(
        &self,
        num_points: usize,
        bitmap: Option<&[u8]>,
    ) -> Result<Vec<f32>, Grib2Error> {
        let grib_file = grib::from_reader(Cursor::new(self.raw_data.as_ref()))
            .map_err(|e| Grib2Error::UnpackingError(format!("grib reader: {}", e)))?;

        let (_, submessage) = grib_file
            .iter()
            .next()
            .ok_or_else(|| Grib2Error::UnpackingError("no submessage".to_string()))?;

        let decoder = grib::Grib2SubmessageDecoder::from(submessage)
            .map_err(|e| Grib2Error::UnpackingError(format!("grib decoder: {}", e)))?;
        let values = decoder
            .dispatch()
            .map_err(|e| Grib2Error::UnpackingError(format!("grib dispatch: {}", e)))?;

        // The bitmap decoder yields one value per bitmap bit, padding included
        Ok(if bitmap.is_some() {
            values.take(num_points).collect()
        } else {
            values.collect()
        })
    }
}

/// Sequential reader over the messages in a GRIB2 buffer.
pub struct Grib2Reader {
    data: Bytes,
    offset: usize,
    tables: Arc<Grib2Tables>,
}

impl Grib2Reader {
    /// Reader using the built-in GFS tables.
    pub fn new(data: Bytes) -> Self {
        Self::with_tables(data, Arc::new(Grib2Tables::gfs()))
    }

    pub fn with_tables(data: Bytes, tables: Arc<Grib2Tables>) -> Self {
        Self {
            data,
            offset: 0,
            tables,
        }
    }

    /// Parse the next message, or None at end of data.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>, Grib2Error> {
        // Skip anything between messages until the next "GRIB"
        let start = match find_magic(&self.data[self.offset.min(self.data.len())..]) {
            Some(pos) => self.offset + pos,
            None => {
                self.offset = self.data.len();
                return Ok(None);
            }
        };

        let indicator = sections::parse_indicator(&self.data[start..])?;
        let length = usize::try_from(indicator.message_length).map_err(|_| {
            Grib2Error::InvalidFormat(format!(
                "message length {} too large",
                indicator.message_length
            ))
        })?;
        let end = start
            .checked_add(length)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                Grib2Error::InvalidFormat(format!(
                    "message at offset {} claims {} bytes, only {} available",
                    start,
                    length,
                    self.data.len() - start
                ))
            })?;

        if length < 20 || &self.data[end - 4..end] != b"7777" {
            return Err(Grib2Error::InvalidFormat(format!(
                "message at offset {} is missing the 7777 end marker",
                start
            )));
        }

        let raw = self.data.slice(start..end);
        self.offset = end;

        let message = parse_message(start, indicator, raw, &self.tables)?;
        debug!(
            offset = start,
            parameter = %message.parameter(),
            level = %message.level(),
            forecast_hour = message.forecast_hour(),
            "Parsed GRIB2 message"
        );
        Ok(Some(message))
    }

    /// Parse every remaining message.
    pub fn messages(&mut self) -> Result<Vec<Grib2Message>, Grib2Error> {
        let mut out = Vec::new();
        while let Some(message) = self.next_message()? {
            out.push(message);
        }
        Ok(out)
    }
}

fn parse_message(
    offset: usize,
    indicator: Indicator,
    raw: Bytes,
    tables: &Grib2Tables,
) -> Result<Grib2Message, Grib2Error> {
    let identification = sections::parse_identification(&raw)?;
    let grid_definition = sections::parse_grid_definition(&raw)?;
    let product_definition =
        sections::parse_product_definition(&raw, indicator.discipline, tables)?;
    let data_representation = sections::parse_data_representation(&raw)?;
    let bitmap = sections::parse_bitmap(&raw)?;
    let data_section = sections::parse_data_section(&raw)?;

    Ok(Grib2Message {
        offset,
        indicator,
        identification,
        grid_definition,
        product_definition,
        data_representation,
        bitmap,
        data_section,
        raw_data: raw,
    })
}

fn find_magic(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"GRIB")
}

/// A decoded field ready for rendering.
#[derive(Debug, Clone)]
pub struct DecodedField {
    pub parameter: String,
    pub level: String,
    pub reference_time: DateTime<Utc>,
    pub forecast_hour: u32,
    pub grid: GridSpec,
    pub values: Vec<f32>,
}

/// Find and decode the first message with the given parameter and level type.
pub fn find_field(
    data: Bytes,
    parameter: &str,
    level_type: u8,
) -> Result<DecodedField, Grib2Error> {
    let mut reader = Grib2Reader::new(data);

    while let Some(message) = reader.next_message()? {
        if message.parameter() != parameter || message.level_type() != level_type {
            continue;
        }

        let grid = message.grid_spec()?;
        let values = message.unpack_data()?;
        grid.validate(values.len())?;

        return Ok(DecodedField {
            parameter: message.parameter().to_string(),
            level: message.level().to_string(),
            reference_time: message.reference_time(),
            forecast_hour: message.forecast_hour(),
            grid,
            values,
        });
    }

    Err(Grib2Error::FieldNotFound {
        parameter: parameter.to_string(),
        level_type,
    })
}
