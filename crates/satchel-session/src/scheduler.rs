// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic refresh and payment re-check timers.
//!
//! [`RefreshScheduler`] is a two-state machine. While `Running` it owns
//! three background tasks: the periodic refresh timer, the payment re-check
//! timer, and the foreground watcher. `stop()` cancels all three through one
//! [`CancellationToken`] and waits for them to exit, so nothing outlives the
//! session that started it.

use std::sync::Arc;
use std::time::Duration;

use satchel_config::model::RefreshConfig;
use satchel_core::{RefreshTrigger, SatchelError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::sync::SessionSync;

/// Foreground/background signal from the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    Foreground,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No session; no timers.
    Stopped,
    /// Timers and the foreground watcher are active.
    Running,
}

/// Timer cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub refresh_interval: Duration,
    pub payment_check_interval: Duration,
}

impl ScheduleConfig {
    pub fn from_config(config: &RefreshConfig) -> Self {
        Self {
            refresh_interval: config.periodic_interval(),
            payment_check_interval: config.payment_check_interval(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::from_config(&RefreshConfig::default())
    }
}

struct RunningTimers {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

pub struct RefreshScheduler {
    sync: Arc<SessionSync>,
    config: ScheduleConfig,
    lifecycle: watch::Receiver<AppLifecycle>,
    running: Option<RunningTimers>,
    state_tx: watch::Sender<SchedulerState>,
}

impl RefreshScheduler {
    /// Fails with [`SatchelError::Config`] if either timer period is zero.
    pub fn new(
        sync: Arc<SessionSync>,
        config: ScheduleConfig,
        lifecycle: watch::Receiver<AppLifecycle>,
    ) -> Result<Self, SatchelError> {
        if config.refresh_interval.is_zero() || config.payment_check_interval.is_zero() {
            return Err(SatchelError::Config(format!(
                "timer periods must be non-zero (refresh {:?}, payment check {:?})",
                config.refresh_interval, config.payment_check_interval
            )));
        }

        let (state_tx, _rx) = watch::channel(SchedulerState::Stopped);
        Ok(Self {
            sync,
            config,
            lifecycle,
            running: None,
            state_tx,
        })
    }

    pub fn state(&self) -> SchedulerState {
        *self.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    /// Moves `Stopped -> Running`: issues one `Mount` refresh and spawns the
    /// timers. Returns `false` if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.running.is_some() {
            return false;
        }

        let cancel = CancellationToken::new();
        let tasks = vec![
            self.spawn_mount_refresh(),
            self.spawn_refresh_timer(cancel.clone()),
            self.spawn_payment_timer(cancel.clone()),
            self.spawn_foreground_watcher(cancel.clone()),
        ];
        self.running = Some(RunningTimers { cancel, tasks });
        self.state_tx.send_replace(SchedulerState::Running);

        info!(
            refresh_interval_secs = self.config.refresh_interval.as_secs(),
            payment_check_interval_secs = self.config.payment_check_interval.as_secs(),
            "refresh scheduler started"
        );
        true
    }

    /// Moves `Running -> Stopped`: cancels every task and waits for them.
    /// Returns `false` if already stopped.
    pub async fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            return false;
        };

        running.cancel.cancel();
        for task in running.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "scheduler task ended abnormally");
            }
        }
        self.state_tx.send_replace(SchedulerState::Stopped);
        info!("refresh scheduler stopped");
        true
    }

    /// Ties the scheduler to the session: starts on sign-in, stops on
    /// sign-out. Returns after `cancel` fires, with the scheduler stopped.
    pub async fn follow_session(mut self, cancel: CancellationToken) {
        let mut reader = self.sync.reader();
        loop {
            let signed_in = reader.snapshot().refresh.is_signed_in();
            match (signed_in, self.state()) {
                (true, SchedulerState::Stopped) => {
                    self.start();
                }
                (false, SchedulerState::Running) => {
                    self.stop().await;
                }
                _ => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                alive = reader.changed() => {
                    if !alive {
                        break;
                    }
                }
            }
        }
        self.stop().await;
    }

    fn spawn_mount_refresh(&self) -> JoinHandle<()> {
        let sync = self.sync.clone();
        tokio::spawn(async move {
            let outcome = sync.refresh(RefreshTrigger::Mount).await;
            debug!(?outcome, "mount refresh finished");
        })
    }

    fn spawn_refresh_timer(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let sync = self.sync.clone();
        let period = self.config.refresh_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let outcome = sync.refresh(RefreshTrigger::Periodic).await;
                        debug!(?outcome, "periodic refresh finished");
                    }
                }
            }
            debug!("refresh timer shutting down");
        })
    }

    fn spawn_payment_timer(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let sync = self.sync.clone();
        let period = self.config.payment_check_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let status = sync.recheck_payment_status();
                        debug!(show_overlay = status.show_overlay, "payment status rechecked");
                    }
                }
            }
            debug!("payment timer shutting down");
        })
    }

    fn spawn_foreground_watcher(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let sync = self.sync.clone();
        let mut lifecycle = self.lifecycle.clone();
        tokio::spawn(async move {
            let mut last = *lifecycle.borrow_and_update();
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    changed = lifecycle.changed() => {
                        if changed.is_err() {
                            debug!("lifecycle signal closed");
                            break;
                        }
                        let current = *lifecycle.borrow_and_update();
                        if last == AppLifecycle::Background && current == AppLifecycle::Foreground {
                            let outcome = sync.refresh(RefreshTrigger::Foreground).await;
                            debug!(?outcome, "foreground refresh finished");
                        }
                        last = current;
                    }
                }
            }
            debug!("foreground watcher shutting down");
        })
    }
}
