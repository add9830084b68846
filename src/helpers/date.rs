//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone};

use crate::i18n::Locale;

/// Format a date the way post listings show it, e.g. "January 15, 2024"
/// or "2024年1月15日"
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, locale: Locale) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match locale {
        Locale::Zh => format!("{}年{}月{}日", date.year(), date.month(), date.day()),
        Locale::En => date.format("%B %-d, %Y").to_string(),
    }
}
