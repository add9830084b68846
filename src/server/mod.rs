//! JSON read API over the content cache, with optional file watching

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::cache::ContentCache;
use crate::content::{ContentError, PostFilter};
use crate::i18n::Locale;
use crate::Blog;

/// Errors returned by API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Content(e) => {
                tracing::error!("Content error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Unsupported locales are treated as missing pages
fn parse_locale(locale: &str) -> std::result::Result<Locale, ApiError> {
    locale.parse().map_err(|_| ApiError::NotFound)
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    q: Option<String>,
    category: Option<String>,
    tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Default, Deserialize)]
struct LatestParams {
    limit: Option<usize>,
}

/// Build the API router around an already constructed cache
pub fn router(cache: ContentCache) -> Router {
    Router::new()
        .route("/api/slugs", get(slugs_handler))
        .route("/api/cache/clear", post(clear_handler))
        .route("/api/:locale/posts", get(posts_handler))
        .route("/api/:locale/posts/:slug", get(post_handler))
        .route("/api/:locale/latest", get(latest_handler))
        .route("/api/:locale/search", get(search_handler))
        .route("/api/:locale/tags", get(tags_handler))
        .route("/api/:locale/categories", get(categories_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(cache)
}

async fn posts_handler(
    State(cache): State<ContentCache>,
    Path(locale): Path<String>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<crate::content::PostSummary>> {
    let locale = parse_locale(&locale)?;
    let filter = PostFilter {
        query: params.q,
        category: params.category,
        tag: params.tag,
    };
    let posts = if filter == PostFilter::default() {
        cache.all_posts(locale).await?
    } else {
        cache.filter_posts(locale, &filter).await?
    };
    Ok(Json(posts))
}

async fn post_handler(
    State(cache): State<ContentCache>,
    Path((locale, slug)): Path<(String, String)>,
) -> ApiResult<crate::content::Post> {
    let locale = parse_locale(&locale)?;
    cache
        .post_by_slug(locale, &slug)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn latest_handler(
    State(cache): State<ContentCache>,
    Path(locale): Path<String>,
    Query(params): Query<LatestParams>,
) -> ApiResult<Vec<crate::content::PostSummary>> {
    let locale = parse_locale(&locale)?;
    Ok(Json(cache.latest_posts(locale, params.limit).await?))
}

async fn search_handler(
    State(cache): State<ContentCache>,
    Path(locale): Path<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<crate::content::PostSummary>> {
    let locale = parse_locale(&locale)?;
    Ok(Json(cache.search_posts(locale, &params.q).await?))
}

async fn tags_handler(
    State(cache): State<ContentCache>,
    Path(locale): Path<String>,
) -> ApiResult<Vec<crate::content::TaxonomyCount>> {
    let locale = parse_locale(&locale)?;
    Ok(Json(cache.tags(locale).await?))
}

async fn categories_handler(
    State(cache): State<ContentCache>,
    Path(locale): Path<String>,
) -> ApiResult<Vec<crate::content::TaxonomyCount>> {
    let locale = parse_locale(&locale)?;
    Ok(Json(cache.categories(locale).await?))
}

async fn slugs_handler(State(cache): State<ContentCache>) -> ApiResult<serde_json::Value> {
    let slugs = cache.all_slugs().await?;
    let routes: Vec<_> = slugs
        .into_iter()
        .map(|(locale, slug)| serde_json::json!({ "locale": locale, "slug": slug }))
        .collect();
    Ok(Json(serde_json::Value::Array(routes)))
}

async fn clear_handler(State(cache): State<ContentCache>) -> StatusCode {
    cache.clear();
    StatusCode::NO_CONTENT
}

/// Start the API server
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool) -> Result<()> {
    let cache = blog.content_cache();

    // Build once up front so a broken content directory fails fast
    let index = cache.get_or_build().await?;
    tracing::info!("Serving {} posts", index.len());

    if watch {
        let content_dir = blog.content_dir.clone();
        let watched = cache.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_clear(content_dir, watched) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    if watch {
        println!("Watching content for changes...");
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(cache)).await?;

    Ok(())
}

/// Watch the content directory and drop the cache whenever a file changes
///
/// Directory mtimes miss in-place edits, so the watcher covers those.
fn watch_and_clear(content_dir: PathBuf, cache: ContentCache) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    debouncer
        .watcher()
        .watch(&content_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching: {:?}", content_dir);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|e| {
                    e.path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext == "md" || ext == "mdx")
                });
                if relevant {
                    for event in &events {
                        tracing::info!("File changed: {}", event.path.display());
                    }
                    cache.clear();
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}
