//! dedupe - progressive duplicate file finder
//!
//! Candidates are narrowed in three stages of increasing cost: file size,
//! the first bytes of content, and a full XXH64 content hash. Singleton
//! buckets are pruned after every stage, so most files are never opened.
//! Confirmed groups are ranked by recoverable space and can be turned into
//! removal or hard-link scripts; dedupe itself never modifies the scanned
//! trees.

pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::Context;

use crate::cache::HashCache;
use crate::cli::{Cli, ReportFormat};
use crate::config::Config;
use crate::duplicates::{
    analyze, generate_hardlink_actions, generate_removal_actions, DuplicateFinder, FinderError,
    SavingsReport, ScanSummary,
};
use crate::error::ExitCode;
use crate::output::{
    write_all, Destination, JsonOutput, PendingOutput, ScriptOutput, ScriptType, TextReport,
};
use crate::progress::{Progress, ProgressCallback};

/// Run one scan as described by the command line.
///
/// Outputs are only written once every one of them has been rendered, and
/// never after an interruption.
///
/// # Errors
///
/// Returns an error for invalid configuration or roots, and for outputs
/// that cannot be written. Per-file read failures are logged, not returned.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_cli_overrides(&cli);
    config.validate().context("Invalid configuration")?;
    log::debug!("Effective configuration: {config:?}");

    let handler = signal::install_handler().context("Failed to install signal handler")?;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));

    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);
    if let Some(cache) = open_cache(&config, cli.clear_db) {
        finder_config = finder_config.with_cache(Arc::new(cache));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = match finder.find_duplicates(&cli.paths) {
        Ok(result) => result,
        Err(FinderError::Interrupted) => {
            log::warn!("Scan interrupted; no report or script was written");
            return Ok(ExitCode::Interrupted);
        }
        Err(e) => return Err(e).context("Duplicate scan failed"),
    };

    let report = analyze(groups);
    let outputs = render_outputs(&cli, &report, &summary)?;

    if handler.is_shutdown_requested() {
        log::warn!("Interrupted before writing; no report or script was written");
        return Ok(ExitCode::Interrupted);
    }

    write_all(&outputs)?;
    log_summary(&summary, &report);

    Ok(ExitCode::Success)
}

/// Render the report and every requested script to memory.
///
/// # Errors
///
/// Returns an error if a document cannot be serialized.
pub fn render_outputs(
    cli: &Cli,
    report: &SavingsReport,
    summary: &ScanSummary,
) -> anyhow::Result<Vec<PendingOutput>> {
    let mut outputs = Vec::new();

    let mut contents = Vec::new();
    let rendered = match cli.format {
        ReportFormat::Text => TextReport::new(report).write_to(&mut contents),
        ReportFormat::Json => JsonOutput::new(report, summary).write_to(&mut contents),
    };
    rendered.context("Failed to render report")?;
    outputs.push(PendingOutput {
        destination: Destination::from_option(cli.output.as_deref()),
        contents,
    });

    let script_type = cli.script_type.unwrap_or_else(ScriptType::detect);

    if let Some(ref path) = cli.remove_script {
        let actions = generate_removal_actions(report);
        let mut contents = Vec::new();
        ScriptOutput::removal(&actions, script_type)
            .write_to(&mut contents)
            .context("Failed to render removal script")?;
        outputs.push(PendingOutput {
            destination: Destination::Script(path.clone()),
            contents,
        });
    }

    if let Some(ref path) = cli.hardlink_script {
        let actions = generate_hardlink_actions(report);
        let mut contents = Vec::new();
        ScriptOutput::hardlink(&actions, script_type)
            .write_to(&mut contents)
            .context("Failed to render hard-link script")?;
        outputs.push(PendingOutput {
            destination: Destination::Script(path.clone()),
            contents,
        });
    }

    Ok(outputs)
}

/// Open the metadata store, or `None` if it is disabled or unusable.
fn open_cache(config: &Config, clear: bool) -> Option<HashCache> {
    let path = config.resolved_cache_path()?;

    let cache = match HashCache::open(&path) {
        Ok(cache) => cache,
        Err(e) => {
            log::warn!(
                "Metadata store {} unavailable, continuing without it: {e}",
                path.display()
            );
            return None;
        }
    };

    if clear {
        match cache.clear() {
            Ok(removed) => log::info!("Cleared {removed} metadata store entries"),
            Err(e) => log::warn!("Failed to clear metadata store: {e}"),
        }
    }

    log::debug!("Using metadata store {}", path.display());
    Some(cache)
}

fn log_summary(summary: &ScanSummary, report: &SavingsReport) {
    log::info!(
        "{} duplicate groups, {} removable files, {} reclaimable (scanned {} files in {:.2?})",
        report.len(),
        report.total_duplicates(),
        bytesize::ByteSize::b(report.total_potential_savings),
        summary.files_discovered,
        summary.scan_duration
    );

    let failures = summary.failure_summary();
    if !failures.is_empty() {
        log::warn!(
            "{} files could not be read ({} vanished, {} I/O errors); they were skipped",
            failures.count,
            failures.not_found,
            failures.io
        );
        for path in &failures.samples {
            log::warn!("  skipped: {}", path.display());
        }
    }
}
