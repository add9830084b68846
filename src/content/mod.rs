//! Content module - front-matter validation, loading, indexing and rendering

mod error;
pub mod frontmatter;
mod index;
pub mod loader;
mod markdown;
mod post;

pub use error::{ContentError, DocumentError, FieldIssue};
pub use frontmatter::FrontMatter;
pub use index::{ContentIndex, PostFilter};
pub use loader::ContentLoader;
pub use markdown::{MarkdownRenderer, RenderedContent, TocEntry};
pub use post::{post_key, reading_time, Post, PostSummary, RawPost, TaxonomyCount};
