//! EdgeFlow command line.
//!
//! Reads driver batches as JSON lines on stdin, runs them through the
//! ingestion loop and writes every published event as a JSON line on
//! stdout. Logs go to stderr.

mod service;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
#[cfg(unix)]
use std::sync::Weak;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use edgeflow_core::{logging, DeviceServiceConfig, EventBus, EventBusReceiver};
use edgeflow_devices::{
    ingestion_channel, stop_channel, AsyncResult, IngestionLoop, IngestionSender,
};

use service::ServiceFile;

#[derive(Parser, Debug)]
#[command(name = "edgeflow", version, about = "Device reading transform and publish pipeline")]
struct Args {
    /// Service file with settings, profiles and devices
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable the offset/scale/base transform
    #[arg(long)]
    no_transform: bool,

    /// Log as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.json_logs);

    let (file, config) = load_config(&args)?;
    tracing::info!(
        data_transform = config.data_transform,
        queue_capacity = config.queue_capacity,
        "Starting EdgeFlow {}",
        edgeflow_core::VERSION
    );

    let registry = Arc::new(file.build_registry()?);
    let bus = Arc::new(EventBus::with_capacity(config.event_bus_capacity));
    let writer = tokio::spawn(write_events(bus.subscribe()));

    let ingestion = Arc::new(IngestionLoop::new(registry, bus.clone(), &config));
    #[cfg(unix)]
    spawn_reload_on_hangup(args, Arc::downgrade(&ingestion));

    let (tx, rx) = ingestion_channel(config.queue_capacity);
    let (stop, signal) = stop_channel();
    let handle = ingestion.clone().spawn(rx, signal);

    tokio::select! {
        fed = feed_stdin(tx) => fed?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping");
            stop.stop();
        }
    }

    let stats = handle.await.context("Ingestion task failed")?;

    // Closing the bus lets the writer drain and finish.
    drop(ingestion);
    drop(bus);
    writer.await.context("Event writer failed")??;

    tracing::info!(?stats, "Done");
    Ok(())
}

/// Service file plus effective settings. Precedence: file, environment, flags.
fn load_config(args: &Args) -> Result<(ServiceFile, DeviceServiceConfig)> {
    let file = match &args.config {
        Some(path) => ServiceFile::load(path)?,
        None => ServiceFile::default(),
    };
    let mut config = file.service.clone();
    config.apply_env_overrides();
    if args.no_transform {
        config.data_transform = false;
    }
    Ok((file, config))
}

/// Re-read the data transform setting on SIGHUP.
///
/// Metadata is not reloaded; only the flag the loop reads per value.
#[cfg(unix)]
fn spawn_reload_on_hangup(args: Args, ingestion: Weak<IngestionLoop>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                tracing::warn!("Cannot listen for SIGHUP: {}", e);
                return;
            }
        };
        while hangup.recv().await.is_some() {
            let Some(ingestion) = ingestion.upgrade() else {
                break;
            };
            match load_config(&args) {
                Ok((_, config)) => {
                    ingestion.set_data_transform(config.data_transform);
                    tracing::info!(data_transform = config.data_transform, "Configuration reloaded");
                }
                Err(e) => tracing::error!("Configuration reload failed: {:#}", e),
            }
        }
    });
}

/// Forward stdin batches until EOF or until the loop goes away.
async fn feed_stdin(tx: IngestionSender) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let batch: AsyncResult = match serde_json::from_str(&line) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(line = line_no, "Invalid batch: {}", e);
                continue;
            }
        };
        if tx.send(batch).await.is_err() {
            tracing::debug!("Ingestion loop stopped, no longer reading stdin");
            break;
        }
    }
    Ok(())
}

/// Print every event from the bus as one JSON line.
async fn write_events(mut rx: EventBusReceiver) -> Result<()> {
    let mut out = tokio::io::stdout();
    while let Some(event) = rx.recv().await {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        out.write_all(&line).await?;
        out.flush().await?;
    }
    Ok(())
}
