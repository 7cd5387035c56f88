//! Cron parsing helpers for the daemon loop.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use cron::Schedule;

/// Normalize a 5-field cron expression to 6-field by prepending "0" for
/// seconds. The `cron` crate wants `sec min hour dom month dow`; operators
/// usually write the standard 5-field form.
pub fn normalize_cron(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Parse a cron expression, accepting both 5- and 6-field forms.
pub fn parse_cron(expr: &str) -> Result<Schedule, cron::error::Error> {
    Schedule::from_str(&normalize_cron(expr))
}

/// Time from `now` until the schedule's next fire, if it has one.
pub fn time_to_next<Tz: TimeZone>(schedule: &Schedule, now: DateTime<Tz>) -> Option<Duration> {
    let next = schedule.after(&now).next()?;
    (next - now).to_std().ok()
}
