//! Error types for content loading and rendering

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// A failure that affects the whole content index
///
/// Cloneable so a single in-flight build can hand the same outcome to
/// every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContentError {
    #[error("cannot read content directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("content build aborted: {0}")]
    BuildAborted(String),

    #[error("failed to render {key}: {message}")]
    Render { key: String, message: String },
}

impl ContentError {
    pub(crate) fn directory(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ContentError::Directory {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// One problem found while validating a front-matter field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl FieldIssue {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Why a single document was left out of the index
///
/// These never abort a build; the loader logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read file: {0}")]
    Read(#[from] io::Error),

    #[error("missing front-matter block")]
    MissingFrontMatter,

    #[error("front-matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid front-matter: {}", join_issues(.0))]
    Invalid(Vec<FieldIssue>),

    #[error("invalid publishedAt date: {0:?}")]
    InvalidDate(String),

    #[error("duplicate slug {slug:?} for locale {locale}, already defined by {first:?}")]
    DuplicateSlug {
        locale: String,
        slug: String,
        first: String,
    },
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
