//! Watch command implementation

use crate::cli::output::{event_json, format_event_line};
use crate::cli::{load_config, WatchArgs};
use crate::config::FloorwatchConfig;
use crate::logging::init_tracing;
use crate::stream::{ConnectionEvent, EventStreamClient, StreamMonitor};
use tokio_util::sync::CancellationToken;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &WatchArgs,
) -> Result<FloorwatchConfig, Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;

    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Cancel `cancel_token` on Ctrl-C or SIGTERM.
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, closing stream...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, closing stream...");
        }
    }

    cancel_token.cancel();
}

/// Main watch command handler
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    init_tracing(&config.logging)?;

    let url = args.url.clone().unwrap_or_else(|| config.stream_url());
    tracing::info!(url = %url, json = args.json, limit = ?args.limit, "Watching event stream");

    let client = EventStreamClient::new(config.stream.clone())?;
    let mut subscription = client
        .subscribe(&url)
        .ok_or("stream URL is empty; set --url or [backend] in the config")?;
    let mut monitor = StreamMonitor::new(config.stream.event_log_capacity);

    let cancel_token = CancellationToken::new();
    let signal_handle = tokio::spawn(shutdown_signal(cancel_token.clone()));

    let mut messages = 0usize;
    loop {
        let event = tokio::select! {
            _ = cancel_token.cancelled() => break,
            event = subscription.next_into(&mut monitor) => match event {
                Some(event) => event,
                None => break,
            },
        };

        if args.json {
            println!("{}", event_json(&event));
        } else if let Some(line) = format_event_line(&event, &monitor) {
            println!("{}", line);
        }

        if matches!(event, ConnectionEvent::Message(_)) {
            messages += 1;
            if args.limit.is_some_and(|limit| messages >= limit) {
                break;
            }
        }
    }

    subscription.shutdown().await;
    signal_handle.abort();

    tracing::info!(
        messages,
        errors = monitor.error_count,
        state = %monitor.state,
        "Stopped watching"
    );

    Ok(())
}
