//! Report Courier, a report artifact distribution service.
//!
//! Main entry point: loads configuration, wires the distribution engine,
//! and either runs one distribution pass over a folder of job-result
//! files or starts the HTTP facade.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use courier_core::config::AppConfig;
use courier_core::model::{FileData, JobResult};
use courier_engine::Distributor;
use courier_sinks::webhook::HttpWebhookClient;

#[derive(Debug, Parser)]
#[command(
    name = "courier",
    version,
    about = "Distributes generated report artifacts to configured delivery sinks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one distribution pass over a folder of job-result files
    Run {
        /// Folder scanned for `*.json` job results
        folder: PathBuf,
        /// Write the result document here instead of the result folder
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Start the HTTP facade
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = std::env::var("COURIER_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("Failed to load configuration")?;
    init_logging(&config);

    let distributor = Arc::new(build_distributor(&config)?);
    match cli.command {
        Command::Run { folder, output } => run_once(&config, &distributor, &folder, output).await,
        Command::Serve => {
            courier_api::run_server(Arc::new(config), distributor)
                .await
                .context("Server failed")
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Wire the engine with the collaborators this binary ships.
///
/// Catalog, FTP and SMTP clients are deployment-specific plugins; without
/// them the engine answers reports addressing those sinks with a
/// configuration error result.
fn build_distributor(config: &AppConfig) -> anyhow::Result<Distributor> {
    let webhook = HttpWebhookClient::new(Duration::from_secs(30))
        .context("Failed to build the webhook client")?;
    Ok(Distributor::builder()
        .webhook_client(Arc::new(webhook))
        .credentials_dir(&config.crypto.credentials_dir)
        .build())
}

/// Scan a folder for job results, run one distribution pass, and write
/// the result document.
async fn run_once(
    config: &AppConfig,
    distributor: &Distributor,
    folder: &PathBuf,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut jobs = load_jobs(folder).await?;
    tracing::info!("Loaded {} job result(s) from '{}'", jobs.len(), folder.display());

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Cancellation requested");
            signal_cancel.cancel();
        }
    });

    let results = distributor.run(&mut jobs, &cancel).await?;

    let output = match output {
        Some(path) => path,
        None => {
            let dir = PathBuf::from(&config.distribute.result_folder);
            tokio::fs::create_dir_all(&dir).await?;
            dir.join("distribution-result.json")
        }
    };
    tokio::fs::write(&output, &results).await?;
    tracing::info!("Results written to '{}'", output.display());
    println!("{results}");
    Ok(())
}

/// Load every `*.json` job result in the folder, in filename order, and
/// hydrate the report payloads from disk.
async fn load_jobs(folder: &PathBuf) -> anyhow::Result<Vec<JobResult>> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .with_context(|| format!("Could not read '{}'", folder.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();

    let mut jobs = Vec::with_capacity(files.len());
    for file in files {
        let raw = tokio::fs::read_to_string(&file).await?;
        let mut job: JobResult = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid job result in '{}'", file.display()))?;
        hydrate_payloads(&mut job).await;
        jobs.push(job);
    }
    Ok(jobs)
}

/// Read each report path into the file-data list, unless the producer
/// already embedded the payload. Unreadable paths are left to the sinks,
/// which answer them with a not-found result.
async fn hydrate_payloads(job: &mut JobResult) {
    for report in &mut job.reports {
        for path in report.paths.clone() {
            if report.file_data(&path).is_some() {
                continue;
            }
            let Some(filename) = std::path::Path::new(&path)
                .file_name()
                .and_then(|f| f.to_str())
                .map(str::to_string)
            else {
                continue;
            };
            match tokio::fs::read(&path).await {
                Ok(bytes) => report.data.push(FileData {
                    filename,
                    data: bytes.into(),
                }),
                Err(err) => {
                    tracing::warn!("Could not read report file '{path}': {err}");
                }
            }
        }
    }
}
