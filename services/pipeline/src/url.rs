//! NOMADS filter service URLs and GRIB file names.

use gfs_common::{ForecastStep, ModelRun};

use crate::config::FieldConfig;

/// Public NOMADS filter endpoint for the 0.25° GFS.
pub const DEFAULT_BASE_URL: &str = "https://nomads.ncep.noaa.gov/cgi-bin/filter_gfs_0p25.pl";

/// Builds filter URLs against a base endpoint (NOMADS or a mirror).
#[derive(Debug, Clone)]
pub struct FilterService {
    base_url: String,
}

impl FilterService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('?').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL selecting one variable at one level from a run's step file.
    pub fn url(&self, run: &ModelRun, step: ForecastStep, field: &FieldConfig) -> String {
        format!(
            "{}?dir=%2Fgfs.{}%2F{}%2Fatmos&file={}&var_{}=on&lev_{}=on",
            self.base_url,
            run.date_str(),
            run.hour_str(),
            remote_file_name(run, step),
            field.variable,
            field.level
        )
    }
}

impl Default for FilterService {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// `gfs.tHHz.pgrb2.0p25.fNNN`
pub fn remote_file_name(run: &ModelRun, step: ForecastStep) -> String {
    format!("gfs.t{}z.pgrb2.0p25.{}", run.hour_str(), step.label())
}

/// Local name of a downloaded step file.
pub fn local_file_name(run: &ModelRun, step: ForecastStep) -> String {
    format!("{}.grib2", remote_file_name(run, step))
}
