use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use community_feed_engine::client::{ApiClient, FeedFetcher, FeedQuery};
use community_feed_engine::config::Config;
use community_feed_engine::feed::normalize_post;

/// One-shot diagnostic run: fetch the first feed page, normalize it, and
/// print the result. Useful for inspecting what the UI would receive from a
/// given backend without booting the app.
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(api_base_url = %config.api_base_url, "Configuration loaded");

    let client = ApiClient::new(&config).context("Failed to build API client")?;

    let query = FeedQuery {
        page: Some(1),
        limit: Some(config.page_size),
        ..FeedQuery::default()
    };
    let page = client
        .fetch_feed(&query)
        .await
        .context("Failed to fetch feed page")?;

    info!(
        posts = page.posts.len(),
        files = page.files.len(),
        users = page.users.len(),
        comments = page.comments.len(),
        "Feed page fetched"
    );

    let mut normalized = Vec::new();
    for raw in &page.posts {
        match normalize_post(raw, &page.files, &page.users, &page.comments, &client).await {
            Some(post) => normalized.push(post),
            None => warn!("Skipped unrecoverable post record"),
        }
    }

    info!(
        normalized = normalized.len(),
        dropped = page.posts.len() - normalized.len(),
        "Normalization complete"
    );

    let rendered =
        serde_json::to_string_pretty(&normalized).context("Failed to serialize posts")?;
    println!("{rendered}");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,community_feed_engine=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
