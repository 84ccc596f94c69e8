//! docsync - push a local Markdown docs tree to a remote document store.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docsync::{
    client::config::DEFAULT_BASE_URL, validate_tree, ClientConfig, ReadmeClient, SyncConfig,
    Syncer,
};

/// Sync a local docs tree to a remote document store.
#[derive(Parser)]
#[command(name = "docsync", about = "Sync a local Markdown docs tree to a remote document store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the tree, then sync it.
    Sync {
        /// API key for the remote store.
        #[arg(long, env = "README_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Documentation version to sync into.
        #[arg(long, env = "README_VERSION")]
        version: String,

        /// Root of the local docs tree.
        #[arg(long, env = "DOCS_ROOT")]
        docs: PathBuf,

        /// Only sync this category (repeatable).
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Log what would change without calling the remote store.
        #[arg(long)]
        dry_run: bool,

        /// API root of the remote store.
        #[arg(long, env = "README_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },

    /// Validate the tree only.
    Validate {
        /// Root of the local docs tree.
        #[arg(long, env = "DOCS_ROOT")]
        docs: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let ok = match cli.command {
        Commands::Sync {
            api_key,
            version,
            docs,
            categories,
            dry_run,
            base_url,
        } => {
            let client_config = ClientConfig::new(api_key, version).with_base_url(base_url);
            let sync_config = SyncConfig::new(docs)
                .with_categories(categories)
                .with_dry_run(dry_run);
            run_sync(client_config, sync_config).await?
        }

        Commands::Validate { docs } => run_validate(&docs)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Validate the docs tree and log every problem found.
fn run_validate(docs: &Path) -> Result<bool> {
    let report = validate_tree(docs)
        .with_context(|| format!("Failed to read docs tree at {}", docs.display()))?;
    report.log();
    Ok(report.is_ok())
}

/// Validate, then reconcile the remote store with the docs tree.
async fn run_sync(client_config: ClientConfig, config: SyncConfig) -> Result<bool> {
    if !run_validate(&config.docs_root)? {
        tracing::error!("Not syncing: fix the validation errors above first");
        return Ok(false);
    }

    tracing::info!(
        docs = %config.docs_root.display(),
        version = %client_config.version,
        dry_run = config.dry_run,
        "Starting sync"
    );

    let client = ReadmeClient::new(client_config);
    let report = Syncer::new(&client, &config).run().await?;

    for group in &report.skipped_groups {
        tracing::warn!(path = %group.display(), "Group was skipped");
    }

    Ok(report.is_complete())
}
