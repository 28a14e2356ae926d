use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ValidationError;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A reservation date reduced to its calendar-day identity.
///
/// Two values are equal exactly when they name the same day, whatever
/// time-of-day or offset the input carried. Timestamps with an
/// offset are moved to UTC before the day is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for CalendarDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Ok(date) = NaiveDate::parse_from_str(s, DAY_FORMAT) {
            return Ok(Self(date));
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(ts.with_timezone(&Utc).date_naive()));
        }

        // No offset at all: the written day is the day.
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self(ts.date()));
        }

        Err(ValidationError::InvalidDate(s.to_string()))
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl TryFrom<String> for CalendarDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CalendarDay> for String {
    fn from(value: CalendarDay) -> Self {
        value.to_string()
    }
}
