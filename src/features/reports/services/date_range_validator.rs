//! Validation and normalization of operator-supplied report date ranges.
//!
//! Checks run in a fixed order: missing bounds, unparseable bounds, years
//! outside the accepted range, then ordering. A bound with an out-of-range
//! year is cleared in the form so it cannot be resubmitted unnoticed.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::features::reports::errors::ValidationError;
use crate::features::reports::models::{Bound, DateRange, DateRangeForm};
use crate::shared::constants::{MAX_REPORT_YEAR, MIN_REPORT_YEAR};

lazy_static! {
    /// Date picker value: `YYYY-MM-DD` then `T` or a space, `HH:MM`, optional `:SS`.
    /// The year takes up to six digits so typos reach the year check.
    static ref BOUND_REGEX: Regex =
        Regex::new(r"^(\d{1,6})-(\d{2})-(\d{2})[T ](\d{2}):(\d{2})(?::(\d{2}))?$").unwrap();
}

/// A bound that matched the date picker pattern
struct ParsedBound {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

impl ParsedBound {
    fn to_datetime(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?;
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, self.second)?;
        Some(NaiveDateTime::new(date, time))
    }
}

fn parse_bound(form: &DateRangeForm, bound: Bound) -> Result<ParsedBound, ValidationError> {
    let value = form.bound(bound).trim();
    let unparseable = || ValidationError::UnparseableBound {
        bound,
        value: value.to_string(),
    };

    let captures = BOUND_REGEX.captures(value).ok_or_else(unparseable)?;
    let field = |index: usize| -> Result<u32, ValidationError> {
        captures
            .get(index)
            .map_or(Ok(0), |m| m.as_str().parse::<u32>())
            .map_err(|_| unparseable())
    };

    Ok(ParsedBound {
        year: field(1)? as i32,
        month: field(2)?,
        day: field(3)?,
        hour: field(4)?,
        minute: field(5)?,
        second: field(6)?,
    })
}

fn year_in_range(year: i32) -> bool {
    (MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(&year)
}

/// Validate the form and produce a normalized [`DateRange`].
///
/// On `YearOutOfRange` every offending bound is cleared in `form`; all other
/// failures leave the form untouched.
pub fn validate(form: &mut DateRangeForm) -> Result<DateRange, ValidationError> {
    for bound in [Bound::From, Bound::To] {
        if form.bound(bound).trim().is_empty() {
            return Err(ValidationError::MissingBound { bound });
        }
    }

    let from = parse_bound(form, Bound::From)?;
    let to = parse_bound(form, Bound::To)?;

    let offending: Vec<Bound> = [(Bound::From, from.year), (Bound::To, to.year)]
        .into_iter()
        .filter(|(_, year)| !year_in_range(*year))
        .map(|(bound, _)| bound)
        .collect();

    if !offending.is_empty() {
        for bound in &offending {
            form.clear(*bound);
        }
        tracing::debug!("Cleared date range bounds with out-of-range years: {:?}", offending);
        return Err(ValidationError::YearOutOfRange { offending });
    }

    let from_at = from
        .to_datetime()
        .ok_or_else(|| ValidationError::UnparseableBound {
            bound: Bound::From,
            value: form.from.trim().to_string(),
        })?;
    let to_at = to
        .to_datetime()
        .ok_or_else(|| ValidationError::UnparseableBound {
            bound: Bound::To,
            value: form.to.trim().to_string(),
        })?;

    if to_at <= from_at {
        return Err(ValidationError::InvalidOrder);
    }

    Ok(DateRange::new_unchecked(from_at, to_at))
}

impl TryFrom<DateRangeForm> for DateRange {
    type Error = ValidationError;

    fn try_from(mut form: DateRangeForm) -> Result<Self, Self::Error> {
        validate(&mut form)
    }
}
