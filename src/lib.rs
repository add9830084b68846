//! hopes-blog: content engine for a multilingual Markdown/MDX blog
//!
//! This crate validates post front-matter, builds a per-locale index of
//! posts, tags and categories, renders post bodies to HTML, and serves all
//! of it from an in-memory cache that rebuilds when the content changes.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod i18n;
pub mod server;

use anyhow::Result;
use std::path::Path;

pub use cache::ContentCache;
pub use i18n::Locale;

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Blog configuration
    pub config: config::BlogConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Directory holding the post files
    pub content_dir: std::path::PathBuf,
    cache: ContentCache,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::BlogConfig::load(&config_path)?
        } else {
            config::BlogConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let cache = ContentCache::new(&content_dir, &config);

        Ok(Self {
            config,
            base_dir,
            content_dir,
            cache,
        })
    }

    /// Shared handle to the content cache; clones see the same index
    pub fn content_cache(&self) -> ContentCache {
        self.cache.clone()
    }

    /// Resolve an optional locale argument against the configured default
    pub fn locale_or_default(&self, locale: Option<Locale>) -> Locale {
        locale.unwrap_or(self.config.default_locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.content_dir, dir.path().join("content/posts"));
        assert_eq!(blog.locale_or_default(None), Locale::Zh);
        assert_eq!(blog.locale_or_default(Some(Locale::En)), Locale::En);
    }

    #[tokio::test]
    async fn test_new_with_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "content_dir: posts\ndefault_locale: en\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("posts")).unwrap();
        fs::write(
            dir.path().join("posts/hi.md"),
            "---\ntitle: Hi\nslug: hi\npublishedAt: 2024-01-01\nlocale: en\n---\nHi!\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.content_dir, dir.path().join("posts"));
        assert_eq!(blog.locale_or_default(None), Locale::En);

        let first = blog.content_cache().get_or_build().await.unwrap();
        let second = blog.content_cache().get_or_build().await.unwrap();
        assert_eq!(first.generation(), second.generation());
        assert_eq!(first.len(), 1);
    }
}
