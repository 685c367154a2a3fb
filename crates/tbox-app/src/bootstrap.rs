//! Process bootstrap: argument parsing, configuration, logging and the
//! pipeline task.

use std::error::Error as _;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tbox_archive::HttpZipService;
use tbox_config::ReconcileConfig;
use tbox_fsops::DiskProbe;
use tbox_qbit::QbitClient;
use tbox_storage::RcloneStore;
use tbox_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, init_logging, record_app_mode};
use tbox_torrent_core::{Tag, TorrentCompletionJob};
use tokio::time::sleep;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::cli::Cli;
use crate::error::{AppError, AppResult};
use crate::orchestrator::{Pipeline, PipelineDeps};

/// Entry point used by the binary.
#[must_use]
pub fn run_app() -> ExitCode {
    match run_cli(Cli::parse()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}

/// Run one invocation described by `cli`, returning the terminal tag.
///
/// # Errors
///
/// - `AppError::InvalidJob` when the info-hash argument is missing.
/// - Configuration, telemetry, runtime or client construction failures.
pub fn run_cli(cli: Cli) -> AppResult<Tag> {
    let job = cli.job().map_err(|source| AppError::InvalidJob { source })?;

    let mut config =
        ReconcileConfig::from_env().map_err(|err| AppError::config("config.load", err))?;
    cli.apply_overrides(&mut config);

    let format = LogFormat::resolve(config.telemetry.log_format.as_deref())
        .map_err(|err| AppError::telemetry("telemetry.format", err))?;
    init_logging(&LoggingConfig {
        level: &config.telemetry.log_level,
        format,
        ..LoggingConfig::default()
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;

    let run_id = Uuid::new_v4().to_string();
    let _context = GlobalContextGuard::new("bootstrap", job.info_hash.as_str(), &run_id);
    if !job.info_hash.is_well_formed() {
        warn!(info_hash = %job.info_hash, "info-hash is not a 40 or 64 digit hex string");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| AppError::Runtime {
            operation: "runtime.build",
            source,
        })?;
    let deps = production_deps(&config)?;
    record_app_mode("reconcile");
    Ok(runtime.block_on(run_job(deps, &config, job)))
}

/// Build the network- and disk-backed collaborators.
///
/// # Errors
///
/// Returns an error when an HTTP client cannot be constructed.
pub fn production_deps(config: &ReconcileConfig) -> AppResult<PipelineDeps> {
    let torrents =
        QbitClient::new(&config.qbit).map_err(|err| AppError::torrent("qbit.client", err))?;
    let zip =
        HttpZipService::new(&config.zip).map_err(|err| AppError::archive("zip.client", err))?;
    Ok(PipelineDeps {
        torrents: Arc::new(torrents),
        zip: Arc::new(zip),
        store: Arc::new(RcloneStore::new(&config.storage)),
        probe: Arc::new(DiskProbe),
    })
}

/// Run the pipeline in its own task, then wait out the exit delay.
///
/// A panicking pipeline is reported as a join failure and tagged `Error`.
pub async fn run_job(
    deps: PipelineDeps,
    config: &ReconcileConfig,
    job: TorrentCompletionJob,
) -> Tag {
    let pipeline = Arc::new(Pipeline::new(deps, config));
    let publisher = pipeline.publisher(&job.info_hash);
    let span = info_span!("pipeline", info_hash = %job.info_hash);

    let task = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.run(&job).await }.instrument(span))
    };
    let tag = match task.await {
        Ok(outcome) => outcome.tag,
        Err(err) => {
            error!(
                info_hash = %publisher.info_hash(),
                panicked = err.is_panic(),
                error = %err,
                "pipeline task failed"
            );
            publisher.publish(Tag::Error).await;
            Tag::Error
        }
    };

    if !config.exit_delay.is_zero() {
        info!(delay_secs = config.exit_delay.as_secs(), "waiting before exit");
        sleep(config.exit_delay).await;
    }
    tag
}

fn report(err: &AppError) {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    error!(error = %message, "reconciler failed to start");
    eprintln!("tbox-reconcile: {message}");
}
