//! validate.rs
//!
//! Turns the three raw text fields of the birth date form into a real
//! calendar date, or into a per-field map of user-facing messages.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Earliest accepted birth year unless configured otherwise
pub const MIN_YEAR: i32 = 1900;

/// The form contents exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDateInput {
    pub day: String,
    pub month: String,
    pub year: String,
}

impl RawDateInput {
    pub fn new(day: impl Into<String>, month: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            month: month.into(),
            year: year.into(),
        }
    }

    /// Splits a line such as `14 06 1992` or `14/06/1992` into the three
    /// fields. Missing fields are left empty; extra parts are kept in `year`
    /// so that they fail validation instead of being dropped.
    pub fn from_line(line: &str) -> Self {
        let is_sep = |c: char| c.is_whitespace() || matches!(c, '/' | '-' | '.');
        let parts: Vec<&str> = line.split(is_sep).filter(|s| !s.is_empty()).collect();
        let part = |i: usize| parts.get(i).copied().unwrap_or_default().to_string();
        Self {
            day: part(0),
            month: part(1),
            year: parts.get(2..).map(|rest| rest.join(" ")).unwrap_or_default(),
        }
    }
}

/// Which part of the form a message belongs to. `Date` is for problems with
/// the combination of all three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Day,
    Month,
    Year,
    Date,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Day => "day",
            Field::Month => "month",
            Field::Year => "year",
            Field::Date => "date",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single reason a field was rejected. The `Display` text is what the user
/// sees.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,

    #[error("Must be a valid day")]
    InvalidDay,

    #[error("Must be a valid month")]
    InvalidMonth,

    /// Not 1-4 digits
    #[error("Must be a valid year")]
    InvalidYear,

    #[error("Must be after {min_year}")]
    BeforeMinYear { min_year: i32 },

    #[error("Must be in the past")]
    InFuture,

    /// The fields are individually fine but the day does not exist in that
    /// month (e.g. 30 February)
    #[error("Must be a valid date")]
    InvalidDate,
}

/// Messages keyed by field, at most one per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<ValidationError> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, ValidationError)> + '_ {
        self.0.iter().map(|(field, error)| (*field, *error))
    }

    /// The errors to show: per-field errors when there are any, otherwise
    /// the cross-field `date` error.
    pub fn displayed(&self) -> impl Iterator<Item = (Field, ValidationError)> + '_ {
        let has_field_errors = self.0.keys().any(|field| *field != Field::Date);
        self.iter()
            .filter(move |(field, _)| !has_field_errors || *field != Field::Date)
    }

    fn insert(&mut self, field: Field, error: ValidationError) {
        self.0.entry(field).or_insert(error);
    }

    fn record(&mut self, field: Field, parsed: Result<u32, ValidationError>) -> Option<u32> {
        match parsed {
            Ok(value) => Some(value),
            Err(error) => {
                self.insert(field, error);
                None
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, error)) in self.displayed().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(field, error)| (field, error.to_string())))
    }
}

/// Validates the form against `today`.
///
/// The `date` check runs whenever all three fields are numeric, so the
/// returned map can hold both field errors and a `date` error; see
/// [`ValidationErrors::displayed`] for which ones to show.
pub fn validate(
    input: &RawDateInput,
    today: NaiveDate,
    min_year: i32,
) -> Result<NaiveDate, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let day = errors.record(
        Field::Day,
        parse_digits(&input.day, 2, ValidationError::InvalidDay),
    );
    if day.is_some_and(|d| !(1..=31).contains(&d)) {
        errors.insert(Field::Day, ValidationError::InvalidDay);
    }

    let month = errors.record(
        Field::Month,
        parse_digits(&input.month, 2, ValidationError::InvalidMonth),
    );
    if month.is_some_and(|m| !(1..=12).contains(&m)) {
        errors.insert(Field::Month, ValidationError::InvalidMonth);
    }

    let year = errors.record(
        Field::Year,
        parse_digits(&input.year, 4, ValidationError::InvalidYear),
    );
    if let Some(y) = year {
        let y = y as i32;
        if y < min_year {
            errors.insert(Field::Year, ValidationError::BeforeMinYear { min_year });
        } else if y > today.year() {
            errors.insert(Field::Year, ValidationError::InFuture);
        }
    }

    let (Some(day), Some(month), Some(year)) = (day, month, year) else {
        return Err(errors);
    };

    match NaiveDate::from_ymd_opt(year as i32, month, day) {
        None => errors.insert(Field::Date, ValidationError::InvalidDate),
        Some(date) if date > today => errors.insert(Field::Date, ValidationError::InFuture),
        Some(date) if errors.is_empty() => return Ok(date),
        Some(_) => {}
    }
    Err(errors)
}

/// Required, at most `max_len` ASCII digits
fn parse_digits(
    raw: &str,
    max_len: usize,
    invalid: ValidationError,
) -> Result<u32, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Required);
    }
    if raw.len() > max_len || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid);
    }
    raw.parse().map_err(|_| invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn check(day: &str, month: &str, year: &str) -> Result<NaiveDate, ValidationErrors> {
        validate(&RawDateInput::new(day, month, year), today(), MIN_YEAR)
    }

    #[test]
    fn accepts_real_past_date() {
        assert_eq!(
            check("14", "6", "1992").unwrap(),
            NaiveDate::from_ymd_opt(1992, 6, 14).unwrap()
        );
        assert_eq!(
            check("01", "01", "1900").unwrap(),
            NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
        );
    }

    #[test]
    fn accepts_today() {
        assert_eq!(check("15", "03", "2024").unwrap(), today());
    }

    #[test]
    fn every_field_required() {
        let errors = check("", " ", "").unwrap_err();
        assert_eq!(errors.len(), 3);
        for field in [Field::Day, Field::Month, Field::Year] {
            assert_eq!(errors.get(field), Some(ValidationError::Required));
        }
        assert_eq!(errors.get(Field::Date), None);
    }

    #[test]
    fn rejects_bad_day() {
        for day in ["0", "32", "99", "1a", "123", "-1", "+5"] {
            let errors = check(day, "1", "2000").unwrap_err();
            assert_eq!(errors.get(Field::Day), Some(ValidationError::InvalidDay), "{day}");
        }
    }

    #[test]
    fn rejects_bad_month() {
        for month in ["0", "13", "ab", "001"] {
            let errors = check("1", month, "2000").unwrap_err();
            assert_eq!(errors.get(Field::Month), Some(ValidationError::InvalidMonth), "{month}");
        }
    }

    #[test]
    fn rejects_malformed_year() {
        for year in ["19x0", "20000", "2k"] {
            let errors = check("1", "1", year).unwrap_err();
            assert_eq!(errors.get(Field::Year), Some(ValidationError::InvalidYear), "{year}");
        }
    }

    #[test]
    fn rejects_year_before_minimum() {
        let errors = check("1", "1", "1899").unwrap_err();
        let error = errors.get(Field::Year).unwrap();
        assert_eq!(error, ValidationError::BeforeMinYear { min_year: 1900 });
        assert_eq!(error.to_string(), "Must be after 1900");
    }

    #[test]
    fn rejects_future_year() {
        let errors = check("1", "1", "2025").unwrap_err();
        let error = errors.get(Field::Year).unwrap();
        assert_eq!(error, ValidationError::InFuture);
        assert_eq!(error.to_string(), "Must be in the past");
    }

    #[test]
    fn impossible_date_is_reported_on_date_key_only() {
        let errors = check("30", "02", "2023").unwrap_err();
        assert_eq!(errors.len(), 1);
        let error = errors.get(Field::Date).unwrap();
        assert_eq!(error.to_string(), "Must be a valid date");
        assert_eq!(errors.get(Field::Day), None);
        assert_eq!(errors.get(Field::Month), None);
        assert_eq!(errors.get(Field::Year), None);
    }

    #[test]
    fn leap_day() {
        assert!(check("29", "02", "2020").is_ok());
        assert_eq!(
            check("29", "02", "2023").unwrap_err().get(Field::Date),
            Some(ValidationError::InvalidDate)
        );
    }

    #[test]
    fn later_day_this_year_is_in_the_future() {
        let errors = check("16", "03", "2024").unwrap_err();
        assert_eq!(errors.get(Field::Date), Some(ValidationError::InFuture));
        assert_eq!(errors.get(Field::Year), None);
    }

    #[test]
    fn field_errors_hide_date_error() {
        // the date check still runs on an out-of-range day
        let errors = check("45", "2", "2020").unwrap_err();
        assert_eq!(errors.get(Field::Date), Some(ValidationError::InvalidDate));
        let shown: Vec<_> = errors.displayed().collect();
        assert_eq!(shown, vec![(Field::Day, ValidationError::InvalidDay)]);
    }

    #[test]
    fn date_error_shown_alone() {
        let errors = check("31", "4", "2001").unwrap_err();
        let shown: Vec<_> = errors.displayed().collect();
        assert_eq!(shown, vec![(Field::Date, ValidationError::InvalidDate)]);
        assert_eq!(errors.to_string(), "date: Must be a valid date");
    }

    #[test]
    fn custom_minimum_year() {
        let input = RawDateInput::new("1", "1", "1950");
        let errors = validate(&input, today(), 1970).unwrap_err();
        assert_eq!(errors.get(Field::Year).unwrap().to_string(), "Must be after 1970");
    }

    #[test]
    fn serializes_as_field_map() {
        let errors = check("", "13", "1899").unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "day": "This field is required",
                "month": "Must be a valid month",
                "year": "Must be after 1900",
            })
        );
    }

    #[test]
    fn splits_lines() {
        assert_eq!(RawDateInput::from_line("14 06 1992"), RawDateInput::new("14", "06", "1992"));
        assert_eq!(RawDateInput::from_line("14/6/1992\n"), RawDateInput::new("14", "6", "1992"));
        assert_eq!(RawDateInput::from_line(" 14  06 1992"), RawDateInput::new("14", "06", "1992"));
        assert_eq!(RawDateInput::from_line("14"), RawDateInput::new("14", "", ""));
        assert_eq!(RawDateInput::from_line("1 2 3 4"), RawDateInput::new("1", "2", "3 4"));
    }
}
