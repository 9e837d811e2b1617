use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extractor::fields::strip_accents;

static WEEK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)SEMAINE\s+DU\s+(\d{1,2})(?:ER)?\s+(?:(\p{L}+)\s+)?(?:AU|À|A)\s+(\d{1,2})(?:ER)?\s+(\p{L}+)\s+(\d{4})",
    )
    .expect("invalid regex: week declaration")
});

/// Monday-to-Sunday span the listing applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateError {
    #[error("no week declaration found")]
    NotFound,

    #[error("unknown month name: {0}")]
    UnknownMonth(String),

    #[error("invalid date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

pub fn month_number(name: &str) -> Option<u32> {
    let month = match strip_accents(name.trim()).to_lowercase().as_str() {
        "janvier" => 1,
        "fevrier" => 2,
        "mars" => 3,
        "avril" => 4,
        "mai" => 5,
        "juin" => 6,
        "juillet" => 7,
        "aout" => 8,
        "septembre" => 9,
        "octobre" => 10,
        "novembre" => 11,
        "decembre" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parses `SEMAINE DU <d> <mois> AU <d> <mois> <année>`.
///
/// The year is printed once, after the end date. A week whose end month
/// precedes its start month crosses new year, so the end date moves to the
/// following year. When the start month is omitted (`DU 3 AU 9 MARS`), the
/// end month is used for both dates.
pub fn parse_week_declaration(text: &str) -> Result<WeekRange, DateError> {
    let caps = WEEK_REGEX.captures(text).ok_or(DateError::NotFound)?;

    let start_day: u32 = caps[1].parse().map_err(|_| DateError::NotFound)?;
    let end_day: u32 = caps[3].parse().map_err(|_| DateError::NotFound)?;
    let year: i32 = caps[5].parse().map_err(|_| DateError::NotFound)?;

    let end_month =
        month_number(&caps[4]).ok_or_else(|| DateError::UnknownMonth(caps[4].to_string()))?;
    let start_month = match caps.get(2) {
        Some(name) => month_number(name.as_str())
            .ok_or_else(|| DateError::UnknownMonth(name.as_str().to_string()))?,
        None => end_month,
    };

    let end_year = if end_month < start_month { year + 1 } else { year };

    let start = date(year, start_month, start_day)?;
    let end = date(end_year, end_month, end_day)?;

    Ok(WeekRange { start, end })
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, DateError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::InvalidDate { year, month, day })
}

/// The Monday-to-Sunday week containing `today`.
pub fn current_week(today: NaiveDate) -> WeekRange {
    let offset = u64::from(today.weekday().num_days_from_monday());
    let start = today - Days::new(offset);
    WeekRange {
        start,
        end: start + Days::new(6),
    }
}

/// Finds the week declaration in the page text, falling back to the week
/// containing `today` when it is absent or unusable. Never fails.
pub fn extract_week(text: &str, today: NaiveDate) -> WeekRange {
    match parse_week_declaration(text) {
        Ok(week) => {
            debug!(start = %week.start, end = %week.end, "week declaration parsed");
            week
        }
        Err(err) => {
            let week = current_week(today);
            warn!(
                error = %err,
                start = %week.start,
                end = %week.end,
                "could not read week declaration, using current calendar week"
            );
            week
        }
    }
}
