//! concept-annotator - concept annotation service for clinical free text.

use concept_annotator::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // RUST_LOG wins; otherwise APP_LOG_LEVEL, bumped to debug by --verbose
    let level = std::env::var("APP_LOG_LEVEL")
        .map(|l| match l.to_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            other => other.to_string(),
        })
        .unwrap_or_else(|_| {
            if cli::is_verbose() {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });
    let default_filter = format!("concept_annotator={level},tower_http={level}");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
