use anyhow::{Result, bail};
use chrono::NaiveDate;
use puppy_notify::parse_iso_date;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a `YYYY-MM-DD` CLI argument, or `today` for the local date.
pub fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    if value.eq_ignore_ascii_case("today") {
        return Ok(chrono::Local::now().date_naive());
    }
    match parse_iso_date(value) {
        Some(date) => Ok(date),
        None => bail!("invalid date `{value}` (expected YYYY-MM-DD or `today`)"),
    }
}
