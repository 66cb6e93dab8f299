//! Code tables mapping GRIB2 numbers to short names.
//!
//! Only the entries the GFS products need are built in; anything else
//! falls back to a name derived from the raw codes.

use std::collections::HashMap;

/// How a fixed-surface type (code table 4.5) is written out.
#[derive(Debug, Clone)]
pub enum LevelDescription {
    /// The level value carries no information, e.g. "surface".
    Static(String),
    /// Height in metres, e.g. "2 m above ground".
    MetersAboveGround,
    /// Pressure in Pa written as mb, e.g. "500 mb".
    Isobaric,
}

impl LevelDescription {
    pub fn format(&self, value: u32) -> String {
        match self {
            LevelDescription::Static(name) => name.clone(),
            LevelDescription::MetersAboveGround => format!("{} m above ground", value),
            LevelDescription::Isobaric => format!("{} mb", value / 100),
        }
    }
}

/// Parameter and level names used while reading product definitions.
#[derive(Debug, Clone, Default)]
pub struct Grib2Tables {
    /// (discipline, category, number) -> short name
    parameters: HashMap<(u8, u8, u8), String>,
    levels: HashMap<u8, LevelDescription>,
}

impl Grib2Tables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parameter(&mut self, discipline: u8, category: u8, number: u8, name: impl Into<String>) {
        self.parameters.insert((discipline, category, number), name.into());
    }

    pub fn add_level(&mut self, level_type: u8, description: LevelDescription) {
        self.levels.insert(level_type, description);
    }

    /// Short name such as "GUST", or "P{d}_{c}_{n}" for unknown codes.
    pub fn parameter_name(&self, discipline: u8, category: u8, number: u8) -> String {
        match self.parameters.get(&(discipline, category, number)) {
            Some(name) => name.clone(),
            None => format!("P{}_{}_{}", discipline, category, number),
        }
    }

    pub fn level_name(&self, level_type: u8, level_value: u32) -> String {
        self.levels
            .get(&level_type)
            .map(|desc| desc.format(level_value))
            .unwrap_or_else(|| format!("Level type {} value {}", level_type, level_value))
    }

    /// Meteorological (discipline 0) fields published on the GFS 0.25° grid.
    pub fn gfs() -> Self {
        let mut tables = Self::new();

        const PARAMETERS: [(u8, u8, &str); 10] = [
            (0, 0, "TMP"),
            (1, 1, "RH"),
            (1, 8, "APCP"),
            (2, 2, "UGRD"),
            (2, 3, "VGRD"),
            (2, 22, "GUST"),
            (3, 1, "PRMSL"),
            (3, 5, "HGT"),
            (3, 192, "MSLET"),
            (16, 196, "REFC"),
        ];
        for (category, number, name) in PARAMETERS {
            tables.add_parameter(0, category, number, name);
        }

        let named = |s: &str| LevelDescription::Static(s.to_string());
        tables.add_level(1, named("surface"));
        tables.add_level(10, named("entire atmosphere"));
        tables.add_level(100, LevelDescription::Isobaric);
        tables.add_level(101, named("mean sea level"));
        tables.add_level(103, LevelDescription::MetersAboveGround);
        // NCEP local code for the single-layer column
        tables.add_level(200, named("entire atmosphere"));

        tables
    }
}
