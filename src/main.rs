//! Svar CLI entry point.

use anyhow::Result;
use clap::Parser;
use svar::cli::{commands, Cli, Commands};
use svar::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("svar={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Build { force } => {
            commands::run_build(*force, settings).await?;
        }

        Commands::Ask { question, json } => {
            commands::run_ask(question, *json, settings).await?;
        }

        Commands::Search {
            query,
            limit,
            modality,
        } => {
            commands::run_search(query, *limit, modality.clone(), settings).await?;
        }

        Commands::Status => {
            commands::run_status(settings).await?;
        }

        Commands::Summary => {
            commands::run_summary(settings).await?;
        }
    }

    Ok(())
}
