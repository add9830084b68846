//! Content loader - reads posts from the content directory in bounded batches

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use futures::future::join_all;

use super::error::{ContentError, DocumentError};
use super::frontmatter::FrontMatter;
use super::post::RawPost;
use crate::config::BlogConfig;

/// Posts read from disk in file-name order, plus how many files were skipped
#[derive(Debug, Default)]
pub struct LoadedPosts {
    pub posts: Vec<RawPost>,
    pub skipped: usize,
}

/// Loads posts from a single content directory
#[derive(Debug, Clone)]
pub struct ContentLoader {
    content_dir: PathBuf,
    batch_size: usize,
    words_per_minute: usize,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new<P: AsRef<Path>>(content_dir: P, config: &BlogConfig) -> Self {
        Self {
            content_dir: content_dir.as_ref().to_path_buf(),
            batch_size: config.batch_size.max(1),
            words_per_minute: config.words_per_minute.max(1),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Last modification time of the content directory itself
    pub async fn modified_time(&self) -> Result<SystemTime, ContentError> {
        let metadata = tokio::fs::metadata(&self.content_dir)
            .await
            .map_err(|e| ContentError::directory(&self.content_dir, e))?;
        if !metadata.is_dir() {
            return Err(ContentError::directory(
                &self.content_dir,
                std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
            ));
        }
        metadata
            .modified()
            .map_err(|e| ContentError::directory(&self.content_dir, e))
    }

    /// List content files, sorted by file name so loading is reproducible
    pub async fn list_files(&self) -> Result<Vec<PathBuf>, ContentError> {
        let mut entries = tokio::fs::read_dir(&self.content_dir)
            .await
            .map_err(|e| ContentError::directory(&self.content_dir, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ContentError::directory(&self.content_dir, e))?
        {
            let path = entry.path();
            if !is_content_file(&path) {
                continue;
            }
            // Follows symlinks; dangling links are simply not files
            match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Load every valid post
    ///
    /// Files are read `batch_size` at a time. Invalid files are logged and
    /// skipped; only a failure to list the directory is an error.
    pub async fn load_posts(&self) -> Result<LoadedPosts, ContentError> {
        let files = self.list_files().await?;
        let mut loaded = LoadedPosts {
            posts: Vec::with_capacity(files.len()),
            skipped: 0,
        };

        for batch in files.chunks(self.batch_size) {
            let results = join_all(
                batch
                    .iter()
                    .map(|path| load_post(path, self.words_per_minute)),
            )
            .await;

            for (path, result) in batch.iter().zip(results) {
                match result {
                    Ok(post) => loaded.posts.push(post),
                    Err(e) => {
                        tracing::warn!("Skipping post {:?}: {}", path, e);
                        loaded.skipped += 1;
                    }
                }
            }
        }

        Ok(loaded)
    }
}

/// Load a single post from a file
pub async fn load_post(path: &Path, words_per_minute: usize) -> Result<RawPost, DocumentError> {
    let content = tokio::fs::read_to_string(path).await?;
    let (fm, body) = FrontMatter::parse(&content)?;
    Ok(RawPost::new(fm, body, path.to_path_buf(), words_per_minute))
}

/// Check if a file has a content extension
fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "mdx")
        .unwrap_or(false)
}
