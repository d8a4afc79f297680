//! Runtime settings: how long each counter takes to reveal and the earliest
//! accepted birth year.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::validate::MIN_YEAR;

pub const YEARS_MS_ENV: &str = "AGECALC_YEARS_MS";
pub const MONTHS_MS_ENV: &str = "AGECALC_MONTHS_MS";
pub const DAYS_MS_ENV: &str = "AGECALC_DAYS_MS";
pub const MIN_YEAR_ENV: &str = "AGECALC_MIN_YEAR";

/// Reveal length per counter. They differ so the counters settle one after
/// another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealDurations {
    #[serde(with = "millis")]
    pub years: Duration,
    #[serde(with = "millis")]
    pub months: Duration,
    #[serde(with = "millis")]
    pub days: Duration,
}

impl Default for RevealDurations {
    fn default() -> Self {
        Self {
            years: Duration::from_millis(1500),
            months: Duration::from_millis(2000),
            days: Duration::from_millis(2500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub reveal: RevealDurations,
    pub min_year: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reveal: RevealDurations::default(),
            min_year: MIN_YEAR,
        }
    }
}

impl Config {
    /// Defaults, overridden by any `AGECALC_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, YEARS_MS_ENV)? {
            config.reveal.years = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, MONTHS_MS_ENV)? {
            config.reveal.months = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, DAYS_MS_ENV)? {
            config.reveal.days = Duration::from_millis(ms);
        }
        if let Some(year) = parse_var::<i32>(&lookup, MIN_YEAR_ENV)? {
            config.min_year = year;
        }

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let value = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} environment variable is not a valid number: {raw:?}"))?;
    Ok(Some(value))
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
