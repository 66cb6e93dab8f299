//! Model runs and forecast steps.
//!
//! GFS is initialized every 6 hours (00Z, 06Z, 12Z, 18Z). A forecast step is
//! an hour offset from the run, labeled `fNNN` on the distribution server.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::GfsError;

/// Hours between model initializations.
pub const RUN_INTERVAL_HOURS: u32 = 6;

/// A model initialization time, identified by UTC date and hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelRun {
    pub date: NaiveDate,
    pub hour: u32,
}

impl ModelRun {
    pub fn new(date: NaiveDate, hour: u32) -> Result<Self, GfsError> {
        if hour >= 24 || hour % RUN_INTERVAL_HOURS != 0 {
            return Err(GfsError::InvalidRunHour(hour));
        }
        Ok(Self { date, hour })
    }

    /// The run whose 6-hour window contains `now`.
    pub fn latest(now: DateTime<Utc>) -> Self {
        Self {
            date: now.date_naive(),
            hour: (now.hour() / RUN_INTERVAL_HOURS) * RUN_INTERVAL_HOURS,
        }
    }

    /// The run issued 6 hours before this one. 00Z rolls back to 18Z of the
    /// previous day.
    pub fn previous(&self) -> Self {
        if self.hour >= RUN_INTERVAL_HOURS {
            Self {
                date: self.date,
                hour: self.hour - RUN_INTERVAL_HOURS,
            }
        } else {
            Self {
                date: self.date - Duration::days(1),
                hour: 24 - RUN_INTERVAL_HOURS,
            }
        }
    }

    /// Runs to try, in order: the latest, then the one before it.
    pub fn candidates(now: DateTime<Utc>) -> [ModelRun; 2] {
        let latest = Self::latest(now);
        [latest, latest.previous()]
    }

    /// `YYYYMMDD`
    pub fn date_str(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// `HH`
    pub fn hour_str(&self) -> String {
        format!("{:02}", self.hour)
    }

    /// Initialization time as a UTC timestamp.
    pub fn reference_time(&self) -> DateTime<Utc> {
        let naive = self
            .date
            .and_hms_opt(self.hour, 0, 0)
            .unwrap_or_else(|| self.date.and_time(chrono::NaiveTime::MIN));
        DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
    }
}

impl fmt::Display for ModelRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}z", self.date_str(), self.hour)
    }
}

/// A forecast offset in hours from the run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForecastStep(pub u32);

impl ForecastStep {
    /// Distribution label, e.g. `f006`.
    pub fn label(&self) -> String {
        format!("f{:03}", self.0)
    }

    pub fn hours(&self) -> u32 {
        self.0
    }

    /// Hourly through 12 hours, then every 6 hours through 96.
    pub fn default_steps() -> Vec<ForecastStep> {
        Self::from_ranges(&StepRange::defaults())
    }

    /// Expand ranges into a sorted, duplicate-free step list.
    pub fn from_ranges(ranges: &[StepRange]) -> Vec<ForecastStep> {
        let mut steps: Vec<ForecastStep> = ranges
            .iter()
            .flat_map(StepRange::hours)
            .map(ForecastStep)
            .collect();
        steps.sort_unstable();
        steps.dedup();
        steps
    }
}

impl fmt::Display for ForecastStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{:03}", self.0)
    }
}

impl FromStr for ForecastStep {
    type Err = GfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('f')
            .ok_or_else(|| GfsError::InvalidStep(s.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GfsError::InvalidStep(s.to_string()));
        }
        digits
            .parse()
            .map(ForecastStep)
            .map_err(|_| GfsError::InvalidStep(s.to_string()))
    }
}

/// An inclusive range of forecast hours, as written in product configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRange {
    pub start: u32,
    pub end: u32,
    pub step: u32,
}

impl StepRange {
    pub fn new(start: u32, end: u32, step: u32) -> Result<Self, GfsError> {
        let range = Self { start, end, step };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), GfsError> {
        if self.step == 0 || self.start > self.end {
            return Err(GfsError::InvalidStepRange {
                start: self.start,
                end: self.end,
                step: self.step,
            });
        }
        Ok(())
    }

    /// Generate the list of forecast hours.
    pub fn hours(&self) -> Vec<u32> {
        if self.step == 0 {
            return Vec::new();
        }
        (self.start..=self.end).step_by(self.step as usize).collect()
    }

    /// f000..f012 hourly, f012..f096 every 6 hours.
    pub fn defaults() -> Vec<StepRange> {
        vec![
            StepRange { start: 0, end: 12, step: 1 },
            StepRange { start: 12, end: 96, step: 6 },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_latest_floors_to_six_hours() {
        let run = ModelRun::latest(at(2024, 3, 5, 17, 42));
        assert_eq!(run.hour, 12);
        assert_eq!(run.date_str(), "20240305");
        assert_eq!(run.hour_str(), "12");

        assert_eq!(ModelRun::latest(at(2024, 3, 5, 0, 1)).hour, 0);
        assert_eq!(ModelRun::latest(at(2024, 3, 5, 23, 59)).hour, 18);
    }

    #[test]
    fn test_previous_rolls_back_a_day_at_midnight() {
        let run = ModelRun::latest(at(2024, 3, 1, 3, 0));
        let prev = run.previous();
        assert_eq!(prev.hour, 18);
        assert_eq!(prev.date_str(), "20240229");
    }

    #[test]
    fn test_candidates_order() {
        let [current, previous] = ModelRun::candidates(at(2024, 7, 4, 13, 0));
        assert_eq!(current.hour, 12);
        assert_eq!(previous.hour, 6);
        assert_eq!(current.date, previous.date);
    }

    #[test]
    fn test_new_rejects_off_cycle_hours() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(ModelRun::new(date, 6).is_ok());
        assert!(ModelRun::new(date, 7).is_err());
        assert!(ModelRun::new(date, 24).is_err());
    }

    #[test]
    fn test_display() {
        let run = ModelRun::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 6).unwrap();
        assert_eq!(run.to_string(), "20240102/06z");
        assert_eq!(run.reference_time(), at(2024, 1, 2, 6, 0));
    }

    #[test]
    fn test_default_steps() {
        let steps = ForecastStep::default_steps();
        let labels: Vec<String> = steps.iter().map(ForecastStep::label).collect();

        assert_eq!(labels.first().map(String::as_str), Some("f000"));
        assert_eq!(labels.last().map(String::as_str), Some("f096"));
        // 13 hourly steps plus f018..f096 every 6 hours, f012 only once
        assert_eq!(steps.len(), 13 + 14);
        assert_eq!(labels.iter().filter(|l| *l == "f012").count(), 1);
        assert!(labels.contains(&"f018".to_string()));
        assert!(!labels.contains(&"f013".to_string()));
    }

    #[test]
    fn test_parse_step_label() {
        assert_eq!("f006".parse::<ForecastStep>().unwrap(), ForecastStep(6));
        assert_eq!("f120".parse::<ForecastStep>().unwrap(), ForecastStep(120));
        assert!("006".parse::<ForecastStep>().is_err());
        assert!("f".parse::<ForecastStep>().is_err());
        assert!("f0x6".parse::<ForecastStep>().is_err());
    }

    #[test]
    fn test_step_range_validation() {
        assert!(StepRange::new(0, 12, 3).is_ok());
        assert!(StepRange::new(0, 12, 0).is_err());
        assert!(StepRange::new(12, 0, 1).is_err());
        assert_eq!(StepRange::new(0, 12, 3).unwrap().hours(), vec![0, 3, 6, 9, 12]);
    }
}
