// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `satchel watch`: keeps the session fresh until interrupted.
//!
//! The scheduler follows the session's sign-in state. On Unix, SIGUSR1 and
//! SIGUSR2 stand in for the host application's background and foreground
//! notifications.

use satchel_config::model::SatchelConfig;
use satchel_core::SatchelError;
use satchel_session::{AppLifecycle, RefreshScheduler, ScheduleConfig};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::App;
use crate::shutdown;

/// Run `satchel watch`.
pub async fn run_watch(config: &SatchelConfig) -> Result<(), SatchelError> {
    let app = App::open(config).await?;
    app.log_health().await;

    if !app.sync.reader().is_signed_in() {
        return Err(SatchelError::Unauthorized {
            message: "not signed in, run `satchel login` first".to_string(),
        });
    }

    let cancel = shutdown::install_signal_handler();
    let (lifecycle_tx, lifecycle_rx) = watch::channel(AppLifecycle::Foreground);
    spawn_lifecycle_signals(lifecycle_tx, cancel.clone());
    spawn_payment_reporter(&app, cancel.clone());

    let scheduler = RefreshScheduler::new(
        app.sync.clone(),
        ScheduleConfig::from_config(&config.refresh),
        lifecycle_rx,
    )?;
    info!("watching session, press Ctrl+C to stop");
    scheduler.follow_session(cancel).await;
    info!("watch stopped");
    Ok(())
}

/// Prints every payment status change until cancelled.
fn spawn_payment_reporter(app: &App, cancel: CancellationToken) {
    let mut status_rx = app.sync.subscribe_payment_status();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = status_rx.borrow_and_update().clone();
                    println!(
                        "payment: {} (overlay {})",
                        status.message,
                        if status.show_overlay { "shown" } else { "hidden" }
                    );
                }
            }
        }
    });
}

#[cfg(unix)]
fn spawn_lifecycle_signals(tx: watch::Sender<AppLifecycle>, cancel: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut background, mut foreground) = match (
        signal(SignalKind::user_defined1()),
        signal(SignalKind::user_defined2()),
    ) {
        (Ok(bg), Ok(fg)) => (bg, fg),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "lifecycle signals unavailable, foreground refresh disabled");
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = background.recv() => {
                    info!("moved to background");
                    tx.send_replace(AppLifecycle::Background);
                }
                _ = foreground.recv() => {
                    info!("moved to foreground");
                    tx.send_replace(AppLifecycle::Foreground);
                }
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_lifecycle_signals(tx: watch::Sender<AppLifecycle>, cancel: CancellationToken) {
    tokio::spawn(async move {
        cancel.cancelled().await;
        drop(tx);
    });
}
