//! Post models

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use super::frontmatter::FrontMatter;
use super::markdown::RenderedContent;
use crate::i18n::Locale;

/// Words a reader gets through per minute, used when no config is supplied
pub const DEFAULT_WORDS_PER_MINUTE: usize = 230;

/// Everything a listing needs about a post, without its body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub locale: Locale,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    /// Estimated minutes to read, never below 1
    pub reading_time: usize,
    /// Source file, for diagnostics
    pub file_path: PathBuf,
}

impl PostSummary {
    /// Key used by the slug lookup and the render cache
    pub fn key(&self) -> String {
        post_key(self.locale, &self.slug)
    }

    /// Case-insensitive substring match over title, excerpt, tags and categories
    ///
    /// `needle` must already be trimmed and lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.excerpt.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
            || self
                .categories
                .iter()
                .any(|c| c.to_lowercase().contains(needle))
    }
}

/// A post as loaded from disk: summary plus unparsed body
#[derive(Debug, Clone, PartialEq)]
pub struct RawPost {
    pub summary: PostSummary,
    pub body: String,
}

impl RawPost {
    /// Build a post from validated front-matter and its body
    pub fn new(fm: FrontMatter, body: &str, file_path: PathBuf, words_per_minute: usize) -> Self {
        let summary = PostSummary {
            title: fm.title,
            slug: fm.slug,
            excerpt: fm.excerpt,
            cover_image: fm.cover_image,
            published_at: fm.published_at,
            locale: fm.locale,
            tags: fm.tags,
            categories: fm.categories,
            reading_time: reading_time(body, words_per_minute),
            file_path,
        };
        Self {
            summary,
            body: body.to_string(),
        }
    }
}

/// A post together with its rendered body
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub content: RenderedContent,
}

/// A tag or category with the number of posts carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyCount {
    pub name: String,
    pub count: usize,
}

/// Build the `"{locale}:{slug}"` key
pub fn post_key(locale: Locale, slug: &str) -> String {
    format!("{}:{}", locale, slug)
}

/// Minutes needed to read `text`: whitespace-separated words over the
/// reading speed, rounded half up, at least 1
pub fn reading_time(text: &str, words_per_minute: usize) -> usize {
    let words = text.split_whitespace().count();
    let minutes = (words as f64 / words_per_minute.max(1) as f64).round() as usize;
    minutes.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time("", DEFAULT_WORDS_PER_MINUTE), 1);
        assert_eq!(reading_time(&words(100), DEFAULT_WORDS_PER_MINUTE), 1);
        assert_eq!(reading_time(&words(230), DEFAULT_WORDS_PER_MINUTE), 1);
        assert_eq!(reading_time(&words(345), DEFAULT_WORDS_PER_MINUTE), 2);
        assert_eq!(reading_time(&words(700), DEFAULT_WORDS_PER_MINUTE), 3);
    }

    #[test]
    fn test_reading_time_counts_whitespace_runs() {
        let text = "  one\n\ntwo\t\tthree   four ";
        assert_eq!(text.split_whitespace().count(), 4);
        assert_eq!(reading_time(text, 2), 2);
    }

    #[test]
    fn test_summary_matches() {
        let summary = PostSummary {
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            excerpt: "An Introduction".to_string(),
            cover_image: None,
            published_at: Utc::now(),
            locale: Locale::En,
            tags: vec!["react".to_string()],
            categories: vec!["Frontend".to_string()],
            reading_time: 1,
            file_path: PathBuf::from("hello.mdx"),
        };
        assert!(summary.matches("react"));
        assert!(summary.matches("introduction"));
        assert!(summary.matches("front"));
        assert!(!summary.matches("rust"));
        assert_eq!(summary.key(), "en:hello");
    }
}
