//! Blog configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::i18n::Locale;

/// Main blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    /// Directory holding one `.md`/`.mdx` file per post, relative to the base dir
    pub content_dir: String,
    pub default_locale: Locale,

    /// Number of files read concurrently while building the index
    pub batch_size: usize,
    pub words_per_minute: usize,
    pub latest_limit: usize,

    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub toc: TocConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            content_dir: "content/posts".to_string(),
            default_locale: Locale::default(),
            batch_size: 5,
            words_per_minute: 230,
            latest_limit: 3,
            highlight: HighlightConfig::default(),
            toc: TocConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl BlogConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: BlogConfig = serde_yaml::from_str(&content)?;
        Ok(config.normalized())
    }

    /// Clamp values that would stall the loader or divide by zero
    fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self.words_per_minute = self.words_per_minute.max(1);
        self
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Table of contents configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Shallowest heading level collected (2 skips the page title)
    pub heading: u8,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self { heading: 2 }
    }
}
