//! List site content

use anyhow::Result;

use crate::helpers::format_date;
use crate::i18n::Locale;
use crate::Blog;

/// List site content by type
pub async fn run(blog: &Blog, content_type: &str, locale: Locale) -> Result<()> {
    let cache = blog.content_cache();

    match content_type {
        "post" | "posts" => {
            let posts = cache.all_posts(locale).await?;
            println!("Posts [{}] ({}):", locale, posts.len());
            for post in posts {
                println!(
                    "  {} - {} ({} min) [{}]",
                    format_date(&post.published_at, locale),
                    post.title,
                    post.reading_time,
                    post.slug
                );
            }
        }
        "tag" | "tags" => {
            let tags = cache.tags(locale).await?;
            println!("Tags [{}] ({}):", locale, tags.len());
            for tag in tags {
                println!("  {} ({})", tag.name, tag.count);
            }
        }
        "category" | "categories" => {
            let categories = cache.categories(locale).await?;
            println!("Categories [{}] ({}):", locale, categories.len());
            for category in categories {
                println!("  {} ({})", category.name, category.count);
            }
        }
        "slug" | "slugs" => {
            let slugs = cache.all_slugs().await?;
            println!("Routes ({}):", slugs.len());
            for (locale, slug) in slugs {
                println!("  /{}/blog/{}", locale, slug);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, tag, category, slug",
                content_type
            );
        }
    }

    Ok(())
}
