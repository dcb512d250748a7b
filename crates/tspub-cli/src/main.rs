//! tspub: publish a local product bundle to the marketplace.
//!
//! Settings are read from `settings.yml` (see `tspub init`) and can be
//! overridden with TSPUB_TOKEN, TSPUB_SERVER, TSPUB_DEBUG and TSPUB_UPLOAD_TIMEOUT.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tspub_api_client::{ApiClient, PublishingApi};
use tspub_cli::{init_tracing, prompt_token};
use tspub_core::models::ProductBundle;
use tspub_core::{FailurePolicy, Settings, DEFAULT_SETTINGS_FILE};
use tspub_publisher::{DraftPipeline, RunOptions};
use tspub_storage::S3SessionFactory;

#[derive(Parser)]
#[command(name = "tspub", about = "Marketplace publishing CLI")]
struct Cli {
    /// Path to the settings file
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,
    /// Log raw API responses
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the settings file, prompting for the API token if needed
    Init {
        /// API token (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,
        /// Base URL of the publishing API
        #[arg(long)]
        server: Option<String>,
    },
    /// Check a bundle locally without contacting the API
    Validate {
        /// Bundle directory or product.json file
        path: PathBuf,
    },
    /// Upload a bundle into a new draft
    Draft {
        /// Bundle directory or product.json file
        path: PathBuf,
        /// Publish the draft once everything is attached
        #[arg(long)]
        publish: bool,
        /// Continue the draft recorded in the bundle's checkpoint
        #[arg(long)]
        resume: bool,
        /// Uploads in flight at once
        #[arg(long)]
        concurrency: Option<usize>,
        /// What to do when an item fails: halt or skip
        #[arg(long)]
        on_error: Option<FailurePolicy>,
    },
}

#[derive(Serialize)]
struct BundleSummary<'a> {
    name: &'a str,
    directory: String,
    files: usize,
    previews: usize,
    certifications: usize,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

fn load_bundle(path: &Path) -> anyhow::Result<ProductBundle> {
    let bundle = ProductBundle::load(path)
        .with_context(|| format!("Failed to load bundle {}", path.display()))?;
    bundle
        .preflight()
        .with_context(|| format!("Bundle {} is not valid", path.display()))?;
    Ok(bundle)
}

fn init(path: &Path, token: Option<String>, server: Option<String>) -> anyhow::Result<()> {
    let mut settings = if path.exists() {
        Settings::from_file(path)?
    } else {
        Settings::default()
    };

    settings.token = match token {
        Some(token) => token,
        None => prompt_token(std::io::stdin().lock(), std::io::stdout())?,
    };
    if let Some(server) = server {
        settings.server = server;
    }

    settings.validate().context("Invalid settings")?;
    settings
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Settings written to {}", path.display());
    Ok(())
}

async fn draft(
    mut settings: Settings,
    path: &Path,
    options: RunOptions,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(concurrency) = concurrency {
        settings.max_concurrent_uploads = concurrency;
        settings.validate().context("Invalid --concurrency")?;
    }

    let bundle = load_bundle(path)?;
    tracing::info!(
        bundle = %bundle.directory.display(),
        server = %settings.server,
        files = bundle.files.len(),
        previews = bundle.previews.len(),
        publish = options.publish,
        "Publishing bundle"
    );

    let api: Arc<dyn PublishingApi> =
        Arc::new(ApiClient::from_settings(&settings).context("Failed to create API client")?);
    let factory = Arc::new(S3SessionFactory::new(settings.storage_endpoint.clone()));

    let mut pipeline = DraftPipeline::from_settings(api, factory, &settings);
    let report = pipeline
        .run(&bundle, &options)
        .await
        .context("Failed to create draft")?;
    print_json(&report)?;

    if !report.is_success() {
        anyhow::bail!(
            "Draft {} stopped in state {}",
            report.draft_id.as_deref().unwrap_or("-"),
            report.state
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { token, server } => {
            init_tracing(cli.debug);
            init(&cli.settings, token, server)?;
        }
        Commands::Validate { path } => {
            init_tracing(cli.debug);
            let bundle = load_bundle(&path)?;
            print_json(&BundleSummary {
                name: &bundle.draft.name,
                directory: bundle.directory.display().to_string(),
                files: bundle.files.len(),
                previews: bundle.previews.len(),
                certifications: bundle.certifications.len(),
            })?;
        }
        Commands::Draft {
            path,
            publish,
            resume,
            concurrency,
            on_error,
        } => {
            let settings = Settings::load(&cli.settings).with_context(|| {
                format!(
                    "Failed to load settings from {} (run `tspub init` first)",
                    cli.settings.display()
                )
            })?;
            init_tracing(cli.debug || settings.debug);

            let options = RunOptions {
                publish,
                resume,
                on_error: on_error.unwrap_or(settings.on_error),
                ..RunOptions::from_settings(&settings)
            };
            draft(settings, &path, options, concurrency).await?;
        }
    }

    Ok(())
}
