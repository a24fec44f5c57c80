//! Display-date normalization
//!
//! The archive prints strip dates as "D.M.YYYY", except for strips published
//! in the current calendar year, where the year is omitted ("D.M."). Some
//! pages prefix the date with a weekday abbreviation ("ma 5.3."); only the
//! last whitespace-separated token is the date.

use crate::{Result, StrippiError};
use chrono::{Datelike, NaiveDate};

/// Normalizes a display date into a calendar date
///
/// A missing year means the strip was published in `today`'s year; this is a
/// format rule of the archive, not a guess.
///
/// # Arguments
///
/// * `text` - The raw date text from the page
/// * `today` - Reference date supplying the implied year
pub fn parse_date_text(text: &str, today: NaiveDate) -> Result<NaiveDate> {
    let token = text
        .split_whitespace()
        .last()
        .ok_or_else(|| StrippiError::DateFormat(text.to_string()))?;

    let parts: Vec<&str> = token.split('.').filter(|p| !p.is_empty()).collect();

    let (day_text, month_text, year_text) = match parts.as_slice() {
        [d, m, y] => (*d, *m, Some(*y)),
        [d, m] => (*d, *m, None),
        _ => return Err(StrippiError::DateFormat(text.to_string())),
    };

    let day: u32 = day_text
        .parse()
        .map_err(|_| StrippiError::DateFormat(text.to_string()))?;
    let month: u32 = month_text
        .parse()
        .map_err(|_| StrippiError::DateFormat(text.to_string()))?;
    let year: i32 = match year_text {
        Some(y) => y
            .parse()
            .map_err(|_| StrippiError::DateFormat(text.to_string()))?,
        None => today.year(),
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| StrippiError::DateFormat(text.to_string()))
}
