//! CLI entry point for hopes-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use hopes_blog::Locale;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hopes-blog")]
#[command(version)]
#[command(about = "Index, search and serve a multilingual Markdown/MDX blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List posts, tags, categories or routes
    List {
        /// Type of content to list (post, tag, category, slug)
        #[arg(default_value = "post")]
        r#type: String,

        /// Locale to list (defaults to the configured locale)
        #[arg(short, long)]
        locale: Option<Locale>,
    },

    /// Show a single post
    Show {
        /// Slug of the post
        slug: String,

        #[arg(short, long)]
        locale: Option<Locale>,

        /// Print the rendered HTML body
        #[arg(long)]
        html: bool,
    },

    /// Search posts by title, excerpt, tag or category
    Search {
        query: String,

        #[arg(short, long)]
        locale: Option<Locale>,

        /// Only posts in this category
        #[arg(long)]
        category: Option<String>,

        /// Only posts with this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Serve the content API
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Clear the cache whenever a content file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "hopes_blog=debug,info"
    } else {
        "hopes_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::List { r#type, locale } => {
            let blog = hopes_blog::Blog::new(&base_dir)?;
            let locale = blog.locale_or_default(locale);
            hopes_blog::commands::list::run(&blog, &r#type, locale).await?;
        }

        Commands::Show { slug, locale, html } => {
            let blog = hopes_blog::Blog::new(&base_dir)?;
            let locale = blog.locale_or_default(locale);
            hopes_blog::commands::show::run(&blog, &slug, locale, html).await?;
        }

        Commands::Search {
            query,
            locale,
            category,
            tag,
        } => {
            let blog = hopes_blog::Blog::new(&base_dir)?;
            let locale = blog.locale_or_default(locale);
            hopes_blog::commands::search::run(&blog, &query, locale, category, tag).await?;
        }

        Commands::Serve { port, ip, watch } => {
            let blog = hopes_blog::Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            hopes_blog::server::start(&blog, &ip, port, watch).await?;
        }

        Commands::Version => {
            println!("hopes-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
