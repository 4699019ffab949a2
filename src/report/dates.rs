//! Date helpers for report filters. Tax periods are addressed by Buddhist
//! calendar year; the backend wants Gregorian timestamps.

use chrono::{Datelike, NaiveDate};

use crate::error::{AcctError, Result};

const BE_OFFSET: i32 = 543;

pub fn be_year(ad_year: i32) -> i32 {
    ad_year + BE_OFFSET
}

pub fn ad_year(be_year: i32) -> i32 {
    be_year - BE_OFFSET
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .ok_or(AcctError::InvalidMonth(month))
}

/// Timestamp bounds for one tax period: first second of the first day to
/// last second of the last day, Gregorian.
pub fn period_range(year_be: i32, month: u32) -> Result<(String, String)> {
    let year = ad_year(year_be);
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(AcctError::InvalidMonth(month))?;
    let last = last_day_of_month(year, month)?;
    Ok((
        format!("{} 00:00:00", first.format("%Y-%m-%d")),
        format!("{} 23:59:59", last.format("%Y-%m-%d")),
    ))
}

pub fn format_date_api(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AcctError::InvalidDate(value.to_string()))
}

/// Render a backend date string as Thai dd/mm/yyyy with a Buddhist year.
/// Accepts anything starting with `YYYY-MM-DD`; other shapes pass through
/// as a dash, matching how the screens show missing dates.
pub fn format_date_thai(value: &str) -> String {
    let head: String = value.chars().take(10).collect();
    match NaiveDate::parse_from_str(&head, "%Y-%m-%d") {
        Ok(date) => format!(
            "{:02}/{:02}/{}",
            date.day(),
            date.month(),
            be_year(date.year())
        ),
        Err(_) => "-".to_string(),
    }
}
