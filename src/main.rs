//! midi-sliders
//!
//! Listens to a MIDI slider surface and logs clean slider move events,
//! reconnecting whenever the configuration file changes the input.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use crate::cli::Args;
use midi_sliders::connection::discovery;
use midi_sliders::{ConfigWatcher, MidirTransport, SliderIo, SliderMoveEvent};

const LOG_FILE_NAME: &str = "slider-latest-run.log";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&args.log_level, args.log_dir.as_deref())?;

    info!("Starting midi-sliders...");

    if args.list_ports {
        discovery::print_ports();
        return Ok(());
    }

    info!("Configuration file: {}", args.config);

    let config_watcher = ConfigWatcher::new(args.config.clone()).await?;
    let config = config_watcher.current();
    info!(
        port = config.midi.port,
        device = %config.midi.device_name,
        by_name = config.midi.use_device_name,
        channel = config.midi.channel,
        "Configuration loaded successfully with hot-reload enabled"
    );

    let transport = Arc::new(MidirTransport::default());
    let io = SliderIo::new(transport, config_watcher.subscribe(), args.verbose);

    let consumer = tokio::spawn(log_slider_moves(io.subscribe()));

    if let Err(e) = io.start() {
        warn!(error = %e, "MIDI input not connected, waiting for a configuration change");
    }

    shutdown_signal().await;

    info!("Shutting down...");
    io.shutdown().await;
    consumer.abort();
    drop(config_watcher);

    info!("midi-sliders shutdown complete");
    Ok(())
}

async fn log_slider_moves(mut events: mpsc::Receiver<SliderMoveEvent>) {
    while let Some(event) = events.recv().await {
        info!(
            slider = event.slider_id,
            percent = event.percent_value,
            "Slider moved"
        );
    }
}

fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
