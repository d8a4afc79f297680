//! age.rs
//!
//! Elapsed calendar time between a birth date and "today", as whole
//! years, months and days.
//!
//! Chrono does not provide a built-in year/month/day diff, so the borrowing
//! rules are applied by hand:
//!   • day underflow borrows the length of the month *before today's month*
//!   • month underflow (checked after the day borrow) borrows a year
//!
//! The day borrow always uses today's previous month, never the birth
//! month, so e.g. 31 May → 1 June yields one day rather than a full month.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Years, months and days elapsed since a birth date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeComponents {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

/// Computes the age of someone born on `birthdate` as of `today`.
///
/// `birthdate` must not be after `today`; the validator guarantees this for
/// user input. A later birth date is clamped to zero rather than panicking.
pub fn age_between(birthdate: NaiveDate, today: NaiveDate) -> AgeComponents {
    let mut years = today.year() - birthdate.year();
    let mut months = today.month() as i32 - birthdate.month() as i32;
    let mut days = today.day() as i32 - birthdate.day() as i32;

    // Fix day underflow. Borrowing a 28-30 day month can still leave `days`
    // negative (31 Jan → 1 Mar); that is floored to zero below.
    if days < 0 {
        months -= 1;
        let (prev_year, prev_month) = previous_month(today.year(), today.month());
        days += days_in_month(prev_year, prev_month) as i32;
    }

    // Fix month underflow
    if months < 0 {
        years -= 1;
        months += 12;
    }

    // Floor at zero: a short borrowed month can leave `days` negative, and a
    // birth date after `today` would make every component negative.
    AgeComponents {
        years: years.max(0) as u32,
        months: months.max(0) as u32,
        days: days.max(0) as u32,
    }
}

impl fmt::Display for AgeComponents {
    /// "X years, Y months, Z days"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} year{}, {} month{}, {} day{}",
            self.years,
            plural(self.years),
            self.months,
            plural(self.months),
            self.days,
            plural(self.days)
        )
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Returns number of days in a given year/month (handles leap years)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// Leap-year rule (Gregorian):
///   - divisible by 4 → leap year
///   - except divisible by 100 → not leap year
///   - except divisible by 400 → leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
