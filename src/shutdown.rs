use noura_availability::components::AvailabilitySyncHandle;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};

/// Wait for a termination signal and cancel any running sync
pub async fn handle_signals(sync: AvailabilitySyncHandle) {
    if wait_for_signal().await {
        sync.stop();
        info!("Sync stopped; the current step will finish first");
    }
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() -> bool {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to create signal handlers: {}", e);
            return false;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, cancelling");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, cancelling");
        }
    }
    true
}

/// Platform-specific signal handling implementation
#[cfg(windows)]
async fn wait_for_signal() -> bool {
    let (mut ctrlc, mut ctrlbreak) = match (ctrl_c(), ctrl_break()) {
        (Ok(ctrlc), Ok(ctrlbreak)) => (ctrlc, ctrlbreak),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to create signal handlers: {}", e);
            return false;
        }
    };

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, cancelling");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, cancelling");
        }
    }
    true
}
