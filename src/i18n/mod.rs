//! Supported locales

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A locale the blog publishes content in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Zh,
    En,
}

impl Locale {
    /// Every supported locale, in routing order
    pub const ALL: [Locale; 2] = [Locale::Zh, Locale::En];

    /// The locale code as used in front-matter and URLs
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::Zh
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a string is not a supported locale code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale: {0}")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zh" => Ok(Locale::Zh),
            "en" => Ok(Locale::En),
            other => Err(UnsupportedLocale(other.to_string())),
        }
    }
}

/// Check whether a string names a supported locale
pub fn is_locale(value: &str) -> bool {
    value.parse::<Locale>().is_ok()
}
