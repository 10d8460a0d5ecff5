//! Checks applied to the optional `dt` argument of forecast requests.

use chrono::{Duration, Local, NaiveDate};

use crate::error::{AtmosError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// How far ahead of today a forecast date may lie, inclusive.
pub const FORECAST_WINDOW_DAYS: i64 = 14;

/// Returns whether `text` is a calendar date written exactly as `YYYY-MM-DD`.
pub fn validate_format(text: &str) -> bool {
    parse_date(text).is_some()
}

/// Validates `text` against the format and against the forecast window
/// starting at today's local date.
pub fn validate_datetime(text: &str) -> Result<()> {
    validate_datetime_on(text, Local::now().date_naive()).map(|_| ())
}

/// Same as [`validate_datetime`] with an explicit "today"; returns the parsed date.
pub fn validate_datetime_on(text: &str, today: NaiveDate) -> Result<NaiveDate> {
    let date = parse_date(text).ok_or_else(|| AtmosError::InvalidDateFormat(text.to_string()))?;

    let latest = today + Duration::days(FORECAST_WINDOW_DAYS);
    if date < today || date > latest {
        return Err(AtmosError::OutOfRangeDate { date, earliest: today, latest });
    }

    Ok(date)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // chrono's `%Y`/`%m`/`%d` accept signs and unpadded numbers, so pin the
    // shape down before handing it over.
    let bytes = text.as_bytes();
    if bytes.len() != 10 {
        return None;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}
