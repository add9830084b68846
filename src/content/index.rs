//! In-memory content index snapshot

use indexmap::IndexMap;
use std::collections::HashMap;
use std::time::SystemTime;

use super::error::DocumentError;
use super::post::{post_key, PostSummary, RawPost, TaxonomyCount};
use crate::i18n::Locale;

/// Optional narrowing applied to a locale's post list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Substring query; blank means no query filter
    pub query: Option<String>,
    /// Exact category name
    pub category: Option<String>,
    /// Exact tag name
    pub tag: Option<String>,
}

/// A consistent snapshot of every valid post
#[derive(Debug, Clone, PartialEq)]
pub struct ContentIndex {
    generation: u64,
    modified: SystemTime,
    /// Posts per locale, newest first
    posts: HashMap<Locale, Vec<RawPost>>,
    /// `"{locale}:{slug}"` -> position in the locale list
    slugs: HashMap<String, usize>,
    categories: HashMap<Locale, IndexMap<String, usize>>,
    tags: HashMap<Locale, IndexMap<String, usize>>,
}

impl ContentIndex {
    /// Build the index from posts in file enumeration order
    ///
    /// A post reusing an existing `(locale, slug)` is skipped with a warning,
    /// so the first file in enumeration order wins.
    pub fn build(loaded: Vec<RawPost>, modified: SystemTime, generation: u64) -> Self {
        let mut first_seen: HashMap<String, String> = HashMap::new();
        let mut posts: HashMap<Locale, Vec<RawPost>> = HashMap::new();

        for post in loaded {
            let key = post.summary.key();
            if let Some(first) = first_seen.get(&key) {
                let err = DocumentError::DuplicateSlug {
                    locale: post.summary.locale.to_string(),
                    slug: post.summary.slug.clone(),
                    first: first.clone(),
                };
                tracing::warn!("Skipping post {:?}: {}", post.summary.file_path, err);
                continue;
            }
            first_seen.insert(key, post.summary.file_path.display().to_string());
            posts.entry(post.summary.locale).or_default().push(post);
        }

        let mut slugs = HashMap::new();
        let mut categories: HashMap<Locale, IndexMap<String, usize>> = HashMap::new();
        let mut tags: HashMap<Locale, IndexMap<String, usize>> = HashMap::new();

        for (locale, list) in posts.iter_mut() {
            // Stable, so equal dates keep enumeration order
            list.sort_by(|a, b| b.summary.published_at.cmp(&a.summary.published_at));

            let locale_categories = categories.entry(*locale).or_default();
            let locale_tags = tags.entry(*locale).or_default();
            for (position, post) in list.iter().enumerate() {
                slugs.insert(post.summary.key(), position);
                for category in &post.summary.categories {
                    *locale_categories.entry(category.clone()).or_insert(0) += 1;
                }
                for tag in &post.summary.tags {
                    *locale_tags.entry(tag.clone()).or_insert(0) += 1;
                }
            }
        }

        Self {
            generation,
            modified,
            posts,
            slugs,
            categories,
            tags,
        }
    }

    /// Build number, increasing with every rebuild of the owning cache
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Directory modification time observed when this snapshot was built
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Total number of posts across all locales
    pub fn len(&self) -> usize {
        self.posts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn raw_posts(&self, locale: Locale) -> &[RawPost] {
        self.posts.get(&locale).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All posts of a locale, newest first
    pub fn all_posts(&self, locale: Locale) -> Vec<PostSummary> {
        self.raw_posts(locale)
            .iter()
            .map(|p| p.summary.clone())
            .collect()
    }

    /// The first `limit` posts of a locale
    pub fn latest_posts(&self, locale: Locale, limit: usize) -> Vec<PostSummary> {
        self.raw_posts(locale)
            .iter()
            .take(limit)
            .map(|p| p.summary.clone())
            .collect()
    }

    /// Look up a post with its unrendered body
    pub fn raw_post(&self, locale: Locale, slug: &str) -> Option<&RawPost> {
        let position = *self.slugs.get(&post_key(locale, slug))?;
        self.raw_posts(locale).get(position)
    }

    /// Category counts in order of first appearance
    pub fn categories(&self, locale: Locale) -> Vec<TaxonomyCount> {
        counts(self.categories.get(&locale))
    }

    /// Tag counts in order of first appearance
    pub fn tags(&self, locale: Locale) -> Vec<TaxonomyCount> {
        counts(self.tags.get(&locale))
    }

    /// Posts whose title, excerpt, tags or categories contain `query`
    ///
    /// A blank query matches nothing.
    pub fn search(&self, locale: Locale, query: &str) -> Vec<PostSummary> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.raw_posts(locale)
            .iter()
            .filter(|p| p.summary.matches(&needle))
            .map(|p| p.summary.clone())
            .collect()
    }

    /// Apply every set field of `filter`; all conditions must hold
    pub fn filter(&self, locale: Locale, filter: &PostFilter) -> Vec<PostSummary> {
        let needle = filter
            .query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        // An empty category or tag means no filter, same as an empty query
        let category = filter.category.as_deref().filter(|c| !c.is_empty());
        let tag = filter.tag.as_deref().filter(|t| !t.is_empty());

        self.raw_posts(locale)
            .iter()
            .map(|p| &p.summary)
            .filter(|s| needle.as_deref().map_or(true, |n| s.matches(n)))
            .filter(|s| category.map_or(true, |c| s.categories.iter().any(|x| x == c)))
            .filter(|s| tag.map_or(true, |t| s.tags.iter().any(|x| x == t)))
            .cloned()
            .collect()
    }

    /// Every `(locale, slug)` pair, locales in routing order, newest first
    pub fn all_slugs(&self) -> Vec<(Locale, String)> {
        Locale::ALL
            .iter()
            .flat_map(|locale| {
                self.raw_posts(*locale)
                    .iter()
                    .map(move |p| (*locale, p.summary.slug.clone()))
            })
            .collect()
    }
}

fn counts(map: Option<&IndexMap<String, usize>>) -> Vec<TaxonomyCount> {
    map.map(|m| {
        m.iter()
            .map(|(name, count)| TaxonomyCount {
                name: name.clone(),
                count: *count,
            })
            .collect()
    })
    .unwrap_or_default()
}
