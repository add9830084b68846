//! Show a single post

use anyhow::Result;

use crate::helpers::format_date;
use crate::i18n::Locale;
use crate::Blog;

/// Print a post's metadata and table of contents, optionally its HTML
pub async fn run(blog: &Blog, slug: &str, locale: Locale, html: bool) -> Result<()> {
    let cache = blog.content_cache();

    let Some(post) = cache.post_by_slug(locale, slug).await? else {
        anyhow::bail!("No post with slug {:?} in locale {}", slug, locale);
    };
    let summary = &post.summary;

    println!("{}", summary.title);
    println!(
        "  {} · {} min · {}",
        format_date(&summary.published_at, locale),
        summary.reading_time,
        summary.file_path.display()
    );
    if !summary.excerpt.is_empty() {
        println!("  {}", summary.excerpt);
    }
    if !summary.categories.is_empty() {
        println!("  Categories: {}", summary.categories.join(", "));
    }
    if !summary.tags.is_empty() {
        println!("  Tags: {}", summary.tags.join(", "));
    }

    if !post.content.toc.is_empty() {
        println!("\nContents:");
        for entry in &post.content.toc {
            let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
            println!("{}- {} (#{})", indent, entry.text, entry.id);
        }
    }

    if html {
        println!("\n{}", post.content.html);
    }

    Ok(())
}
