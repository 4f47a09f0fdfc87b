// src/main.rs

use anyhow::Context;
use blockmark::config::{CommandLineInput, ExportConfig, ImportConfig, PipelineConfig};
use blockmark::import::ProgressReporter;
use blockmark::output::{render_summary, DeliveryTarget, OutputReport, SummaryFormat};
use blockmark::pipeline::{dry_run, run_import, DocumentExport};
use blockmark::{AppError, DocumentRepository, HttpDocumentClient};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Sets up logging configuration.
///
/// The console appender writes to stderr so exported Markdown on stdout
/// stays clean.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("blockmark.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("console", Box::new(console_appender)),
        )
        .appender(Appender::builder().build("file", Box::new(file_appender)))
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(LevelFilter::Debug),
        )
        .map_err(|e| anyhow::anyhow!("invalid logging configuration: {}", e))?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Cancels `token` on Ctrl-C so in-flight workers stop at their next wait.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling outstanding work");
            token.cancel();
        }
    });
}

fn connect(
    token: &blockmark::AccessToken,
    base_url: Option<String>,
) -> Result<Arc<dyn DocumentRepository>, AppError> {
    Ok(Arc::new(HttpDocumentClient::new(token, base_url)?))
}

async fn execute_import(config: &ImportConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    if config.dry_run {
        print!("{}", dry_run(config)?);
        return Ok(());
    }

    let remote = config.remote.as_ref().ok_or_else(|| {
        AppError::MissingConfiguration("no access token for a remote import".to_string())
    })?;
    let repository = connect(&remote.access_token, remote.base_url.clone())?;
    let reporter = Arc::new(ProgressReporter::new(
        config.verbose || config.output == SummaryFormat::Text,
    ));

    let report = run_import(repository, config, reporter, cancel)
        .await
        .with_context(|| format!("Import of {} aborted", config.markdown_file.display()))?;

    print!("{}", render_summary(&report, config.output)?);
    if report.has_failures() {
        log::warn!(
            "Import finished with {} problems; see the summary above",
            report.stats.failures.len()
        );
    }
    Ok(())
}

async fn execute_export(config: &ExportConfig) -> anyhow::Result<()> {
    let repository = connect(&config.remote.access_token, config.remote.base_url.clone())?;
    let report = DocumentExport::new(repository, config)
        .run()
        .await
        .with_context(|| format!("Export of {} failed", config.document_id))?;
    report_completion(&report);
    Ok(())
}

/// Reports completion to the user with delivery confirmations.
fn report_completion(report: &OutputReport) {
    let mut images = 0;
    for completed in &report.completed {
        match &completed.operation {
            DeliveryTarget::WriteFile { path, .. } => {
                eprintln!("✓ Markdown saved to {}", path.display());
            }
            DeliveryTarget::WriteBytes { .. } => images += 1,
            _ => {}
        }
    }
    if images > 0 {
        eprintln!("✓ {} images downloaded", images);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose())?;

    let config = PipelineConfig::resolve(cli)?;
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    match &config {
        PipelineConfig::Import(config) => execute_import(config, cancel).await,
        PipelineConfig::Export(config) => execute_export(config).await,
    }
}
