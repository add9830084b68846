//! Content cache
//!
//! Owns the current [`ContentIndex`] snapshot and the rendered bodies derived
//! from it. The index is built lazily, rebuilt in full when the content
//! directory's modification time moves forward, and concurrent callers share
//! a single in-flight build.
//!
//! Rendered bodies are keyed by `"{locale}:{slug}"`. Installing a new snapshot
//! clears them under the same lock, so a rebuilt post is never served with a
//! body rendered from an older version of its file.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Instant, SystemTime};

use crate::config::BlogConfig;
use crate::content::{
    ContentError, ContentIndex, ContentLoader, MarkdownRenderer, Post, PostFilter, PostSummary,
    RenderedContent, TaxonomyCount,
};
use crate::i18n::Locale;

type BuildResult = Result<Arc<ContentIndex>, ContentError>;
type InFlightBuild = Shared<BoxFuture<'static, BuildResult>>;

#[derive(Default)]
struct CacheState {
    index: Option<Arc<ContentIndex>>,
    in_flight: Option<InFlightBuild>,
    /// Rendered bodies with the index generation they were rendered from
    rendered: HashMap<String, (u64, Arc<RenderedContent>)>,
    /// Bumped by `clear`, so a build started before it is not installed
    epoch: u64,
    last_generation: u64,
}

/// Shared, cloneable handle to the content index and render cache
#[derive(Clone)]
pub struct ContentCache {
    loader: Arc<ContentLoader>,
    renderer: Arc<MarkdownRenderer>,
    latest_limit: usize,
    state: Arc<Mutex<CacheState>>,
}

impl ContentCache {
    /// Create a cache over `content_dir`; nothing is read until first use
    pub fn new<P: AsRef<Path>>(content_dir: P, config: &BlogConfig) -> Self {
        Self {
            loader: Arc::new(ContentLoader::new(content_dir, config)),
            renderer: Arc::new(MarkdownRenderer::with_options(
                &config.highlight,
                &config.toc,
            )),
            latest_limit: config.latest_limit,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the current snapshot, building it first if it is missing or stale
    pub async fn get_or_build(&self) -> BuildResult {
        let modified = self.loader.modified_time().await?;

        let build = {
            let mut state = self.lock();
            if let Some(index) = &state.index {
                if modified <= index.modified() {
                    tracing::debug!("Content index hit (generation {})", index.generation());
                    return Ok(index.clone());
                }
                tracing::debug!("Content directory changed, rebuilding index");
            }
            if let Some(build) = state.in_flight.clone() {
                tracing::debug!("Joining in-flight content build");
                build
            } else {
                self.start_build(&mut state)
            }
        };

        build.await
    }

    /// Spawn a build task and record it as the in-flight build
    fn start_build(&self, state: &mut CacheState) -> InFlightBuild {
        state.last_generation += 1;
        let generation = state.last_generation;
        let epoch = state.epoch;
        let loader = self.loader.clone();
        let shared_state = self.state.clone();

        let task = tokio::spawn(async move {
            let result = build_index(&loader, generation).await;

            let mut state = shared_state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.epoch == epoch {
                state.in_flight = None;
                if let Ok(index) = &result {
                    state.index = Some(index.clone());
                    state.rendered.clear();
                }
            }
            result
        });

        let build = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(ContentError::BuildAborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        state.in_flight = Some(build.clone());
        build
    }

    /// Drop the index and every rendered body; the next access rebuilds
    pub fn clear(&self) {
        let mut state = self.lock();
        state.index = None;
        state.in_flight = None;
        state.rendered.clear();
        state.epoch += 1;
        tracing::info!("Content cache cleared");
    }

    /// All posts of a locale, newest first
    pub async fn all_posts(&self, locale: Locale) -> Result<Vec<PostSummary>, ContentError> {
        Ok(self.get_or_build().await?.all_posts(locale))
    }

    /// The newest `limit` posts, or the configured default
    pub async fn latest_posts(
        &self,
        locale: Locale,
        limit: Option<usize>,
    ) -> Result<Vec<PostSummary>, ContentError> {
        let limit = limit.unwrap_or(self.latest_limit);
        Ok(self.get_or_build().await?.latest_posts(locale, limit))
    }

    /// A post with its rendered body, or `None` if no such post exists
    pub async fn post_by_slug(
        &self,
        locale: Locale,
        slug: &str,
    ) -> Result<Option<Post>, ContentError> {
        let index = self.get_or_build().await?;
        let Some(raw) = index.raw_post(locale, slug) else {
            return Ok(None);
        };
        let key = raw.summary.key();

        let cached = self
            .lock()
            .rendered
            .get(&key)
            .filter(|(generation, _)| *generation == index.generation())
            .map(|(_, content)| content.clone());
        let content = match cached {
            Some(content) => {
                tracing::debug!("Render cache hit for {}", key);
                content
            }
            None => {
                let renderer = self.renderer.clone();
                let body = raw.body.clone();
                let content = tokio::task::spawn_blocking(move || renderer.render(&body))
                    .await
                    .map(Arc::new)
                    .map_err(|e| ContentError::Render {
                        key: key.clone(),
                        message: e.to_string(),
                    })?;

                let mut state = self.lock();
                // Only keep it if this snapshot is still the current one
                if state
                    .index
                    .as_ref()
                    .is_some_and(|current| current.generation() == index.generation())
                {
                    state
                        .rendered
                        .insert(key, (index.generation(), content.clone()));
                }
                content
            }
        };

        Ok(Some(Post {
            summary: raw.summary.clone(),
            content: (*content).clone(),
        }))
    }

    /// Category counts of a locale, in order of first appearance
    pub async fn categories(&self, locale: Locale) -> Result<Vec<TaxonomyCount>, ContentError> {
        Ok(self.get_or_build().await?.categories(locale))
    }

    /// Tag counts of a locale, in order of first appearance
    pub async fn tags(&self, locale: Locale) -> Result<Vec<TaxonomyCount>, ContentError> {
        Ok(self.get_or_build().await?.tags(locale))
    }

    /// Case-insensitive search; a blank query returns nothing
    pub async fn search_posts(
        &self,
        locale: Locale,
        query: &str,
    ) -> Result<Vec<PostSummary>, ContentError> {
        Ok(self.get_or_build().await?.search(locale, query))
    }

    /// Narrow a locale's posts by query, category and tag
    pub async fn filter_posts(
        &self,
        locale: Locale,
        filter: &PostFilter,
    ) -> Result<Vec<PostSummary>, ContentError> {
        Ok(self.get_or_build().await?.filter(locale, filter))
    }

    /// Every `(locale, slug)` pair that has a page
    pub async fn all_slugs(&self) -> Result<Vec<(Locale, String)>, ContentError> {
        Ok(self.get_or_build().await?.all_slugs())
    }

    /// Number of rendered bodies currently cached
    pub fn rendered_len(&self) -> usize {
        self.lock().rendered.len()
    }
}

async fn build_index(loader: &ContentLoader, generation: u64) -> BuildResult {
    let start = Instant::now();
    // Read before listing so changes made during the build trigger another one
    let modified: SystemTime = loader.modified_time().await?;
    let loaded = loader.load_posts().await?;
    let skipped = loaded.skipped;

    let index = ContentIndex::build(loaded.posts, modified, generation);
    tracing::info!(
        "Indexed {} posts from {:?} ({} skipped) in {:.2}ms",
        index.len(),
        loader.content_dir(),
        skipped,
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(Arc::new(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn write_post(dir: &Path, file: &str, locale: &str, slug: &str, date: &str, tags: &[&str]) {
        let content = format!(
            "---\ntitle: {slug}\nslug: {slug}\npublishedAt: {date}\nlocale: {locale}\ntags: [{}]\n---\n# {slug}\n\nHello from {slug}.\n",
            tags.join(", ")
        );
        fs::write(dir.join(file), content).unwrap();
    }

    /// Move the directory mtime forward so the change is visible regardless
    /// of file system timestamp granularity
    fn touch_dir(dir: &Path, offset_secs: u64) {
        let when = SystemTime::now() + Duration::from_secs(offset_secs);
        fs::File::open(dir).unwrap().set_modified(when).unwrap();
    }

    fn e2e_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_post(dir.path(), "a.mdx", "zh", "hello", "2024-01-01", &["intro"]);
        write_post(
            dir.path(),
            "b.mdx",
            "zh",
            "world",
            "2024-02-01",
            &["intro", "update"],
        );
        dir
    }

    fn cache_for(dir: &Path) -> ContentCache {
        ContentCache::new(dir, &BlogConfig::default())
    }

    #[tokio::test]
    async fn test_end_to_end_listing_and_tags() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        let posts = cache.all_posts(Locale::Zh).await.unwrap();
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["world", "hello"]);
        assert!(cache.all_posts(Locale::En).await.unwrap().is_empty());

        let tags: Vec<_> = cache
            .tags(Locale::Zh)
            .await
            .unwrap()
            .into_iter()
            .map(|t| (t.name, t.count))
            .collect();
        assert_eq!(
            tags,
            vec![("intro".to_string(), 2), ("update".to_string(), 1)]
        );
        assert!(cache.categories(Locale::Zh).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_spurious_rebuild() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        let first = cache.get_or_build().await.unwrap();
        let second = cache.get_or_build().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.generation(), second.generation());
        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn test_clear_forces_rebuild() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        let first = cache.get_or_build().await.unwrap();
        cache.clear();
        let second = cache.get_or_build().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.generation() > first.generation());
        assert_eq!(first.all_posts(Locale::Zh), second.all_posts(Locale::Zh));
    }

    #[tokio::test]
    async fn test_directory_change_triggers_rebuild() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        let first = cache.get_or_build().await.unwrap();
        assert_eq!(first.len(), 2);

        write_post(dir.path(), "c.mdx", "en", "news", "2024-03-01", &[]);
        touch_dir(dir.path(), 5);

        let second = cache.get_or_build().await.unwrap();
        assert!(second.generation() > first.generation());
        assert_eq!(second.len(), 3);
        assert_eq!(cache.all_posts(Locale::En).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_build() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_or_build().await })
            })
            .collect();

        let mut generations = Vec::new();
        for handle in handles {
            generations.push(handle.await.unwrap().unwrap().generation());
        }
        assert!(generations.iter().all(|g| *g == 1));
    }

    #[tokio::test]
    async fn test_invalid_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_post(dir.path(), "good.md", "en", "good", "2024-01-01", &[]);
        fs::write(
            dir.path().join("bad.md"),
            "---\ntitle: Missing the rest\n---\nBody\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("bad-date.md"),
            "---\ntitle: T\nslug: t\npublishedAt: someday\nlocale: en\n---\n",
        )
        .unwrap();

        let cache = cache_for(dir.path());
        let index = cache.get_or_build().await.unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.raw_post(Locale::En, "good").is_some());
    }

    #[tokio::test]
    async fn test_missing_directory_fails_and_retries() {
        let dir = tempfile::tempdir().unwrap();
        let content_dir = dir.path().join("posts");
        let cache = cache_for(&content_dir);

        assert!(matches!(
            cache.all_posts(Locale::Zh).await,
            Err(ContentError::Directory { .. })
        ));

        // A later call retries from scratch
        fs::create_dir(&content_dir).unwrap();
        write_post(&content_dir, "a.md", "zh", "hello", "2024-01-01", &[]);
        assert_eq!(cache.all_posts(Locale::Zh).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_post_by_slug_renders_and_caches() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        let post = cache.post_by_slug(Locale::Zh, "hello").await.unwrap().unwrap();
        assert_eq!(post.summary.slug, "hello");
        assert!(post.content.html.contains(r#"<h1 id="hello">hello</h1>"#));
        assert_eq!(cache.rendered_len(), 1);

        let again = cache.post_by_slug(Locale::Zh, "hello").await.unwrap().unwrap();
        assert_eq!(again.content, post.content);
        assert_eq!(cache.rendered_len(), 1);
    }

    #[tokio::test]
    async fn test_post_by_slug_not_found() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        assert!(cache
            .post_by_slug(Locale::Zh, "nonexistent-slug")
            .await
            .unwrap()
            .is_none());
        // Right slug, wrong locale
        assert!(cache.post_by_slug(Locale::En, "hello").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rebuild_drops_stale_renders() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        let before = cache.post_by_slug(Locale::Zh, "hello").await.unwrap().unwrap();
        assert!(before.content.html.contains("Hello from hello."));

        fs::write(
            dir.path().join("a.mdx"),
            "---\ntitle: hello\nslug: hello\npublishedAt: 2024-01-01\nlocale: zh\n---\nRewritten body.\n",
        )
        .unwrap();
        touch_dir(dir.path(), 5);

        let after = cache.post_by_slug(Locale::Zh, "hello").await.unwrap().unwrap();
        assert!(after.content.html.contains("Rewritten body."));
        assert!(!after.content.html.contains("Hello from hello."));
    }

    #[tokio::test]
    async fn test_render_from_other_generation_is_not_served() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        let index = cache.get_or_build().await.unwrap();
        let stale = RenderedContent {
            html: "<p>from another snapshot</p>".to_string(),
            toc: Vec::new(),
        };
        cache.lock().rendered.insert(
            "zh:hello".to_string(),
            (index.generation() + 1, Arc::new(stale)),
        );

        let post = cache.post_by_slug(Locale::Zh, "hello").await.unwrap().unwrap();
        assert!(post.content.html.contains("Hello from hello."));
        assert!(!post.content.html.contains("another snapshot"));
        let (generation, _) = cache.lock().rendered.get("zh:hello").cloned().unwrap();
        assert_eq!(generation, index.generation());
    }

    #[tokio::test]
    async fn test_clear_drops_renders() {
        let dir = e2e_dir();
        let cache = cache_for(dir.path());

        cache.post_by_slug(Locale::Zh, "world").await.unwrap();
        assert_eq!(cache.rendered_len(), 1);
        cache.clear();
        assert_eq!(cache.rendered_len(), 0);
    }

    #[tokio::test]
    async fn test_search_filter_latest_and_slugs() {
        let dir = e2e_dir();
        write_post(dir.path(), "c.md", "en", "react-tips", "2024-03-01", &["react"]);
        let cache = cache_for(dir.path());

        assert!(cache.search_posts(Locale::En, "").await.unwrap().is_empty());
        let found = cache.search_posts(Locale::En, "REACT").await.unwrap();
        assert_eq!(found.len(), 1);

        let filtered = cache
            .filter_posts(
                Locale::Zh,
                &PostFilter {
                    tag: Some("update".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].slug, "world");

        assert_eq!(cache.latest_posts(Locale::Zh, Some(1)).await.unwrap().len(), 1);
        assert_eq!(cache.latest_posts(Locale::Zh, None).await.unwrap().len(), 2);
        assert_eq!(cache.all_slugs().await.unwrap().len(), 3);
    }
}
