//! Poll scheduler
//!
//! Runs the fixed-interval loop: status check → parse → diff against the
//! stored snapshot → notify subscribers → persist. Each platform is polled
//! independently; a failure on one never touches another's state, and no
//! failure stops the loop.

use crate::adapters::{Clock, StatusSource, SystemClock, Transport};
use crate::config::MonitorConfig;
use crate::domain::{ChangeSet, MonitorPhase, Platform, StatusSnapshot};
use crate::error::{NodewatchError, Result};
use crate::parser;
use crate::persistence::{PersistedState, RecipientId, SnapshotStore, SubscriberRegistry};
use crate::services::change_detector::detect;
use crate::services::format::{format_change, format_check_error, format_snapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Result of polling one platform successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOutcome {
    pub platform: String,
    pub changes: ChangeSet,
    /// Messages handed to the transport successfully
    pub delivered: usize,
    /// Messages the transport rejected
    pub failed_deliveries: usize,
    /// Whether the combined state reached disk
    pub persisted: bool,
}

/// A platform whose poll failed this cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformFailure {
    pub platform: String,
    pub error: String,
}

/// Summary of one poll cycle across all platforms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub outcomes: Vec<PlatformOutcome>,
    pub failures: Vec<PlatformFailure>,
}

impl CycleReport {
    pub fn outcome(&self, platform: &str) -> Option<&PlatformOutcome> {
        self.outcomes.iter().find(|o| o.platform == platform)
    }

    pub fn failed(&self, platform: &str) -> bool {
        self.failures.iter().any(|f| f.platform == platform)
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().map(|o| o.delivered).sum()
    }
}

/// Background monitor for all enabled platforms
pub struct Monitor {
    config: MonitorConfig,
    platforms: Vec<Platform>,
    source: Arc<dyn StatusSource>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    store: SnapshotStore,
    state: Mutex<PersistedState>,
    subscribers: Arc<SubscriberRegistry>,
    enabled: Arc<AtomicBool>,
    /// Held for a whole cycle so polls of one platform never overlap
    cycle_lock: Mutex<()>,
    phase_tx: watch::Sender<MonitorPhase>,
}

impl Monitor {
    /// Create a monitor, loading prior state from `store`
    pub fn new(
        config: MonitorConfig,
        platforms: Vec<Platform>,
        source: Arc<dyn StatusSource>,
        transport: Arc<dyn Transport>,
        store: SnapshotStore,
        subscribers: Arc<SubscriberRegistry>,
    ) -> Self {
        let state = store.load();
        let enabled = config.enabled;
        let (phase_tx, _) = watch::channel(MonitorPhase::Idle);

        Self {
            config,
            platforms,
            source,
            transport,
            clock: Arc::new(SystemClock),
            store,
            state: Mutex::new(state),
            subscribers,
            enabled: Arc::new(AtomicBool::new(enabled)),
            cycle_lock: Mutex::new(()),
            phase_tx,
        }
    }

    /// Replace the clock used for snapshot and footer timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.subscribers
    }

    // ------------------------------------------------------------------
    // Enabled flag and phase
    // ------------------------------------------------------------------

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Enable or disable monitoring; observed once per cycle
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(
            "Monitoring {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn phase(&self) -> MonitorPhase {
        *self.phase_tx.borrow()
    }

    /// Watch phase transitions
    pub fn subscribe_phase(&self) -> watch::Receiver<MonitorPhase> {
        self.phase_tx.subscribe()
    }

    fn set_phase(&self, next: MonitorPhase) {
        let current = self.phase();
        if current == next && next != MonitorPhase::Polling {
            return;
        }
        if !current.can_transition_to(next) {
            warn!("Unexpected monitor transition {} -> {}", current, next);
        }
        debug!("Monitor phase {} -> {}", current, next);
        self.phase_tx.send_replace(next);
    }

    // ------------------------------------------------------------------
    // Scheduler loop
    // ------------------------------------------------------------------

    /// Spawn the scheduler loop on the runtime
    pub fn start(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }

    /// Poll at the configured interval until disabled or shut down.
    ///
    /// An in-flight cycle always completes; shutdown is only observed
    /// while waiting for the next cycle.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if self.phase() == MonitorPhase::Stopped {
            self.set_phase(MonitorPhase::Idle);
        }

        let interval = self.config.poll_interval();
        info!(
            "Monitor started: {} platform(s), interval {}s",
            self.platforms.len(),
            interval.as_secs()
        );

        loop {
            if *shutdown.borrow() {
                info!("Monitor shutting down");
                break;
            }
            if !self.is_enabled() {
                self.set_phase(MonitorPhase::Stopped);
                info!("Monitoring disabled, scheduler stopped");
                break;
            }

            let report = self.run_cycle().await;
            debug!(
                "Cycle complete: {} ok, {} failed, {} message(s) delivered",
                report.outcomes.len(),
                report.failures.len(),
                report.delivered()
            );

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_requested(&mut shutdown) => {
                    info!("Monitor shutting down");
                    break;
                }
            }
        }
    }

    /// Poll every platform once
    pub async fn run_cycle(&self) -> CycleReport {
        let _cycle = self.cycle_lock.lock().await;
        let mut report = CycleReport::default();

        if self.phase() == MonitorPhase::Stopped {
            self.set_phase(MonitorPhase::Idle);
        }

        for platform in &self.platforms {
            match self.poll_platform(platform).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    if e.is_transient() {
                        warn!("Poll of {} failed: {}", platform.name, e);
                    } else {
                        error!("Poll of {} failed: {}", platform.name, e);
                    }
                    report.failures.push(PlatformFailure {
                        platform: platform.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.set_phase(MonitorPhase::Idle);
        report
    }

    /// Run one platform through check, diff, notify and persist.
    ///
    /// A failed check returns early and leaves the stored snapshot as is.
    async fn poll_platform(&self, platform: &Platform) -> Result<PlatformOutcome> {
        self.set_phase(MonitorPhase::Polling);
        let output = self.source.run_status_check(platform).await?;

        self.set_phase(MonitorPhase::Comparing);
        let snapshot = parser::parse(platform.format, Some(&output), self.clock.now());
        let changes = {
            let state = self.state.lock().await;
            detect(&snapshot, state.get(&platform.name))
        };

        let mut outcome = PlatformOutcome {
            platform: platform.name.clone(),
            changes: changes.clone(),
            delivered: 0,
            failed_deliveries: 0,
            persisted: false,
        };

        if changes.any() {
            let recipients = self.subscribers.all().await;
            if recipients.is_empty() {
                debug!(
                    "{}: changes {:?} but no subscribers",
                    platform.name,
                    changes.triggered()
                );
            } else {
                self.set_phase(MonitorPhase::Notifying);
                let (delivered, failed) = self
                    .notify(platform, &changes, &snapshot, &recipients)
                    .await;
                outcome.delivered = delivered;
                outcome.failed_deliveries = failed;
            }
        }

        self.set_phase(MonitorPhase::Persisting);
        let to_save = {
            let mut state = self.state.lock().await;
            state.insert(&platform.name, snapshot);
            state.clone()
        };
        // Cycles are serialized by `cycle_lock`, so writes land in order
        match self.store.persist(to_save).await {
            Ok(()) => outcome.persisted = true,
            Err(e) => warn!(
                "Failed to persist state after polling {}: {}",
                platform.name, e
            ),
        }

        Ok(outcome)
    }

    /// Send one message per (recipient, triggered change). Returns
    /// (delivered, failed).
    async fn notify(
        &self,
        platform: &Platform,
        changes: &ChangeSet,
        snapshot: &StatusSnapshot,
        recipients: &[RecipientId],
    ) -> (usize, usize) {
        let now = self.clock.now();
        let messages: Vec<String> = changes
            .triggered()
            .into_iter()
            .map(|kind| format_change(platform, kind, changes, snapshot, now))
            .collect();

        info!(
            "{}: notifying {} subscriber(s) of {:?}",
            platform.name,
            recipients.len(),
            changes.triggered()
        );

        let delay = self.config.delivery_delay();
        let mut delivered = 0;
        let mut failed = 0;
        let mut first = true;

        for &recipient in recipients {
            for message in &messages {
                if !first && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                first = false;

                match self.transport.deliver(recipient, message).await {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        error!("Failed to notify {}: {}", recipient, e);
                        failed += 1;
                    }
                }
            }
        }

        (delivered, failed)
    }

    // ------------------------------------------------------------------
    // On-demand operations
    // ------------------------------------------------------------------

    fn find_platform(&self, name: &str) -> Result<&Platform> {
        self.platforms
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| NodewatchError::UnknownPlatform(name.to_string()))
    }

    /// Check and parse one platform now, without diffing or persisting
    pub async fn check_now(&self, name: &str) -> Result<StatusSnapshot> {
        let platform = self.find_platform(name)?;
        let output = self.source.run_status_check(platform).await?;
        Ok(parser::parse(
            platform.format,
            Some(&output),
            self.clock.now(),
        ))
    }

    /// Formatted on-demand report, or a formatted error message
    pub async fn check_report(&self, name: &str) -> String {
        let platform = match self.find_platform(name) {
            Ok(platform) => platform,
            Err(e) => return format!("❌ {}", e),
        };

        match self.check_now(name).await {
            Ok(snapshot) => format_snapshot(platform, &snapshot),
            Err(e) => format_check_error(platform, &e.to_string()),
        }
    }

    /// Last stored snapshot for a platform
    pub async fn latest_snapshot(&self, name: &str) -> Option<StatusSnapshot> {
        self.state.lock().await.get(name).cloned()
    }

    pub async fn register_subscriber(&self, id: RecipientId) -> bool {
        self.subscribers.register(id).await
    }

    pub async fn unregister_subscriber(&self, id: RecipientId) -> bool {
        self.subscribers.unregister(id).await
    }

    pub async fn is_subscribed(&self, id: RecipientId) -> bool {
        self.subscribers.is_registered(id).await
    }
}

/// Resolves once shutdown is signalled; never if the sender is gone
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
