//! Recurring driver for the expiry scanner.
//!
//! Scans once immediately, then once per configured interval, until
//! [`ExpiryScheduler::shutdown`] is called. Nothing about past runs is
//! persisted: a restart always scans immediately.
//!
//! # Invariants
//! - At most one `run` loop is active per scheduler.
//! - The tick interval is never shorter than [`MIN_INTERVAL`].

use super::scanner::{ExpiryScanner, ScanReport};
use crate::config::ScanConfig;
use crate::store::RecordStore;
use log::{error, info};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

/// Floor applied to `ScanConfig::interval`; tokio rejects a zero period.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Background scheduler state: idle between runs, scanning during one.
pub struct ExpiryScheduler {
    store: Arc<RecordStore>,
    config: ScanConfig,
    shutdown: Arc<Notify>,
    running: AtomicBool,
    scanning: AtomicBool,
    completed_runs: AtomicU64,
    failed_runs: AtomicU64,
}

impl ExpiryScheduler {
    pub fn new(store: Arc<RecordStore>, mut config: ScanConfig) -> Self {
        config.interval = config.interval.max(MIN_INTERVAL);
        Self {
            store,
            config,
            shutdown: Arc::new(Notify::new()),
            running: AtomicBool::new(false),
            scanning: AtomicBool::new(false),
            completed_runs: AtomicU64::new(0),
            failed_runs: AtomicU64::new(0),
        }
    }

    /// Runs the scan loop until shutdown.
    ///
    /// The first scan happens before the first wait. A shutdown requested
    /// before `run` starts still lets that first scan complete.
    ///
    /// Returns immediately when another `run` is already active.
    pub async fn run(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("event=scheduler_start module=notify status=skip reason=already_running");
            return;
        }
        let _running = RunningGuard(&self.running);
        self.run_loop().await;
    }

    async fn run_loop(&self) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick resolves immediately.
        ticker.tick().await;

        info!(
            "event=scheduler_start module=notify status=ok interval_secs={} dedup={}",
            self.config.interval.as_secs(),
            self.config.dedup.as_str()
        );

        loop {
            self.run_once();
            tokio::select! {
                biased;
                _ = self.shutdown.notified() => {
                    info!("event=scheduler_stop module=notify status=ok");
                    return;
                }
                _ = ticker.tick() => {}
            }
        }
    }

    /// Executes one scan now, logging instead of propagating failures.
    pub fn run_once(&self) -> Option<ScanReport> {
        self.scanning.store(true, Ordering::SeqCst);
        let result = ExpiryScanner::new(&self.store, &self.config).scan();
        self.scanning.store(false, Ordering::SeqCst);

        match result {
            Ok(report) => {
                self.completed_runs.fetch_add(1, Ordering::SeqCst);
                Some(report)
            }
            Err(err) => {
                self.failed_runs.fetch_add(1, Ordering::SeqCst);
                error!("event=expiry_scan module=notify status=error error={err}");
                None
            }
        }
    }

    /// Signals the loop to stop after the current run.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    pub fn completed_runs(&self) -> u64 {
        self.completed_runs.load(Ordering::SeqCst)
    }

    pub fn failed_runs(&self) -> u64 {
        self.failed_runs.load(Ordering::SeqCst)
    }
}

/// Clears the running flag even when the `run` future is dropped early.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
