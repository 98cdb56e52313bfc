use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::BACKEND_DATETIME_FORMAT;

/// Which end of a date range an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    From,
    To,
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::From => write!(f, "From Date"),
            Bound::To => write!(f, "To Date"),
        }
    }
}

/// Raw bounds as typed into the date pickers, e.g. `2024-01-01T00:00`.
///
/// The validator clears a bound whose year is out of range so the
/// operator has to pick it again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRangeForm {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

impl DateRangeForm {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn bound(&self, bound: Bound) -> &str {
        match bound {
            Bound::From => &self.from,
            Bound::To => &self.to,
        }
    }

    pub fn clear(&mut self, bound: Bound) {
        match bound {
            Bound::From => self.from.clear(),
            Bound::To => self.to.clear(),
        }
    }
}

/// Validated interval: `from < to`, both years within the accepted range.
///
/// Only built through the date range validator, including when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DateRangeForm", into = "DateRangeForm")]
pub struct DateRange {
    from: NaiveDateTime,
    to: NaiveDateTime,
}

impl DateRange {
    pub(crate) fn new_unchecked(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    /// `startDate` query value, `YYYY-MM-DD HH:MM:SS`
    pub fn query_from(&self) -> String {
        self.from.format(BACKEND_DATETIME_FORMAT).to_string()
    }

    /// `endDate` query value, `YYYY-MM-DD HH:MM:SS`
    pub fn query_to(&self) -> String {
        self.to.format(BACKEND_DATETIME_FORMAT).to_string()
    }
}

impl From<DateRange> for DateRangeForm {
    fn from(range: DateRange) -> Self {
        DateRangeForm::new(range.query_from(), range.query_to())
    }
}
