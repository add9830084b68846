//! Search posts

use anyhow::Result;

use crate::content::PostFilter;
use crate::helpers::format_date;
use crate::i18n::Locale;
use crate::Blog;

/// Search a locale's posts, optionally narrowed to a category or tag
pub async fn run(
    blog: &Blog,
    query: &str,
    locale: Locale,
    category: Option<String>,
    tag: Option<String>,
) -> Result<()> {
    let cache = blog.content_cache();

    let posts = if category.is_none() && tag.is_none() {
        cache.search_posts(locale, query).await?
    } else {
        let filter = PostFilter {
            query: Some(query.to_string()),
            category,
            tag,
        };
        cache.filter_posts(locale, &filter).await?
    };

    if posts.is_empty() {
        println!("No posts found.");
        return Ok(());
    }

    println!("Found {} posts:", posts.len());
    for post in posts {
        println!(
            "  {} - {} [{}]",
            format_date(&post.published_at, locale),
            post.title,
            post.slug
        );
    }

    Ok(())
}
