// tickwatch - live support-ticket dashboard for the terminal
//
// A TUI client for a hosted ticketing backend. The session stream and a
// live ticket query feed one event channel; the dashboard applies the
// deliveries single-threaded and renders them with ratatui.
//
// Architecture:
// - Gateway traits: session stream, ticket store, blob upload
// - HostedBackend (reqwest): production implementation over HTTPS
// - MemoryBackend: demo mode and test substitute
// - TUI (ratatui): ticket table, creation form, signed-out surface

mod cli;
mod config;
mod demo;
mod events;
mod gateway;
mod logging;
mod startup;
mod ticket;
mod tui;

use anyhow::Result;
use config::{Config, LogRotation};
use gateway::backend::HostedBackend;
use gateway::memory::MemoryBackend;
use logging::{LogBuffer, TuiLogLayer};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tui::app::{App, Gateways};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --edit, --update)
    // If a command was handled, exit early
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    // Load configuration first to determine TUI vs headless mode
    let config = Config::from_env();

    // Create log buffer for TUI mode
    let log_buffer = LogBuffer::new();

    // Initialize tracing/logging with conditional output
    // In TUI mode: capture logs to buffer (prevents garbling the display)
    // In headless mode: output logs to stdout
    // File logging: optionally write to rotating log files (in addition)
    //
    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("tickwatch={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // The guard must stay alive for the program's duration so logs flush
    let _file_guard = init_logging(&config, filter, &log_buffer);

    // Channel carrying gateway deliveries into the event loop.
    // Unbounded: senders are callbacks that must never block.
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    // Shutdown channel for the demo task
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // Build the gateways: in-memory in demo mode, hosted otherwise
    let (gateways, demo_handle) = if config.demo_mode {
        tracing::info!("Running in DEMO MODE - in-memory backend");
        let backend = MemoryBackend::new();
        let handle = tokio::spawn(demo::run_demo(backend.clone(), shutdown_rx));
        (
            Gateways {
                session: backend.clone(),
                store: backend,
            },
            Some(handle),
        )
    } else {
        let backend_config = config.backend()?;
        let backend = HostedBackend::connect(
            backend_config,
            Duration::from_secs(config.poll_interval_secs),
            config.session_path.clone(),
        )
        .await;
        (
            Gateways {
                session: backend.clone(),
                store: backend,
            },
            None,
        )
    };

    // Print startup banner after the gateways initialized
    startup::print_startup(&config);
    startup::log_startup(&config);

    let mut app = App::new(gateways, log_buffer, event_tx);
    app.activate();

    // Run the TUI in the main task; blocks until the user quits
    if config.enable_tui {
        tracing::info!("Starting TUI");
        if let Err(e) = tui::run_tui(app, event_rx).await {
            tracing::error!("TUI error: {:?}", e);
        }
    } else {
        tracing::info!("TUI disabled, running in headless mode");
        // Headless: apply deliveries off-screen until Ctrl+C
        let mut event_rx = event_rx;
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                Some(event) = event_rx.recv() => app.handle_event(event),
            }
        }
        app.teardown();
    }

    tracing::info!("Shutting down...");

    // Signal the demo task; a failed send means it already exited
    let _ = shutdown_tx.send(());
    if let Some(handle) = demo_handle {
        let _ = handle.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wire up the tracing subscriber. Returns the appender guard when file
/// logging is active.
fn init_logging(
    config: &Config,
    filter: EnvFilter,
    log_buffer: &LogBuffer,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if config.logging.file_enabled {
        if let Err(e) = std::fs::create_dir_all(&config.logging.file_dir) {
            eprintln!(
                "Warning: Could not create log directory {:?}: {}",
                config.logging.file_dir, e
            );
            // Fall back to non-file logging
            init_without_file(config, filter, log_buffer);
            return None;
        }

        let file_appender = match config.logging.file_rotation {
            LogRotation::Hourly => tracing_appender::rolling::hourly(
                &config.logging.file_dir,
                &config.logging.file_prefix,
            ),
            LogRotation::Daily => tracing_appender::rolling::daily(
                &config.logging.file_dir,
                &config.logging.file_prefix,
            ),
            LogRotation::Never => tracing_appender::rolling::never(
                &config.logging.file_dir,
                &config.logging.file_prefix,
            ),
        };

        // Non-blocking writer: writes happen on a background thread.
        // The file layer uses JSON format for structured log parsing.
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if config.enable_tui {
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(TuiLogLayer::new(log_buffer.clone()))
                .with(file_layer)
                .init();
        } else {
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .with(file_layer)
                .init();
        }

        Some(guard)
    } else {
        init_without_file(config, filter, log_buffer);
        None
    }
}

fn init_without_file(config: &Config, filter: EnvFilter, log_buffer: &LogBuffer) {
    if config.enable_tui {
        tracing_subscriber::registry()
            .with(filter)
            .with(TuiLogLayer::new(log_buffer.clone()))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
