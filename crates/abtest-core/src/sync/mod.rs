//! Background synchronization of the experiment snapshot.
//!
//! One [`SyncEngine`] owns the published [`Snapshot`] and the sync state
//! (watermark, backoff). A single spawned task ticks at a fixed interval and
//! runs one fetch-and-merge cycle per tick unless the backoff schedule says to
//! skip it. Manual [`SyncEngine::sync_now`] and [`SyncEngine::publish`] calls share
//! the same writer lock, so at most one merge is ever computing.
//!
//! States:
//! - Created: built but never started
//! - Idle: running, waiting for the next tick
//! - Fetching: running, one remote call outstanding
//! - Stopped: the loop has been told to exit
//!
//! Readers never lock: they load the current `Arc<Snapshot>` and keep a
//! complete view for as long as they hold it.

mod backoff;
mod fetcher;


pub use backoff::Backoff;
pub use fetcher::{ConfigUpdate, Fetcher};

use abtest_types::FetchError;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::diagnostics::ErrorTracker;
use crate::snapshot::Snapshot;

const ALL_DEFAULT_MESSAGE: &str =
    "A/B server is unavailable. All of the experiments are using the default value in code!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EngineState {
    Created = 0,
    Idle = 1,
    Fetching = 2,
    Stopped = 3,
}

impl EngineState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Idle,
            2 => Self::Fetching,
            3 => Self::Stopped,
            _ => Self::Created,
        }
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Self::Idle | Self::Fetching)
    }
}

/// Result of one successful fetch-and-merge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Server reported no changes; the snapshot was left alone
    UpToDate,
    /// A new snapshot was published
    Published { projects: usize, experiments: usize },
}

/// Result of one timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Backoff cooldown consumed the tick
    Skipped,
    Synced(SyncOutcome),
    Failed(FetchError),
}

/// Read-only view of the engine's sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: EngineState,
    /// Server watermark of the last applied response; 0 before the first one
    pub watermark: i64,
    pub consecutive_failures: u32,
    pub unavailable_ticks: u64,
    pub ticks_to_skip: u64,
    /// Whether any fetch has ever succeeded
    pub has_synced: bool,
}

#[derive(Debug, Default)]
struct SyncState {
    watermark: i64,
    backoff: Backoff,
    has_synced: bool,
}

pub struct SyncEngine {
    fetcher: Arc<dyn Fetcher>,
    interval: Duration,
    snapshot: ArcSwapOption<Snapshot>,
    /// Serializes fetch-and-merge cycles; held across the remote call
    sync_lock: tokio::sync::Mutex<()>,
    state: Mutex<SyncState>,
    lifecycle: AtomicU8,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    errors: ErrorTracker,
}

impl SyncEngine {
    pub fn new(fetcher: Arc<dyn Fetcher>, interval: Duration) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            fetcher,
            interval,
            snapshot: ArcSwapOption::empty(),
            sync_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(SyncState::default()),
            lifecycle: AtomicU8::new(EngineState::Created as u8),
            shutdown_tx,
            worker: Mutex::new(None),
            errors: ErrorTracker::new(),
        })
    }

    /// Publish an empty snapshot, sync once inline, then start the tick loop.
    ///
    /// A failed initial sync is logged and the engine keeps running on the
    /// empty snapshot. Starting a running engine is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let claimed = self
            .lifecycle
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                (!EngineState::from_u8(raw).is_running()).then_some(EngineState::Idle as u8)
            })
            .is_ok();
        if !claimed {
            return;
        }

        self.shutdown_tx.send_replace(false);
        if self.snapshot.load().is_none() {
            self.snapshot.store(Some(Arc::new(Snapshot::new())));
        }

        tracing::info!(
            endpoint = %self.fetcher.endpoint(),
            interval_secs = self.interval.as_secs(),
            "Starting A/B sync engine"
        );

        if let Err(e) = self.sync_locked().await {
            tracing::error!(error = %e, "Initial A/B sync failed");
            tracing::error!("{}", ALL_DEFAULT_MESSAGE);
        }

        let handle = self.spawn_worker();
        if let Some(previous) = self.worker.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Ask the loop to exit after the tick in progress, if any.
    /// Returns false if the engine was not running.
    pub fn stop(&self) -> bool {
        let stopped = self
            .lifecycle
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                EngineState::from_u8(raw).is_running().then_some(EngineState::Stopped as u8)
            })
            .is_ok();
        if stopped {
            self.shutdown_tx.send_replace(true);
            tracing::info!("Stopping A/B sync engine");
        }
        stopped
    }

    /// [`stop`](Self::stop), then wait for the loop task to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "A/B sync loop ended abnormally");
            }
        }
    }

    /// One fetch-and-merge cycle, bypassing the ticker and the backoff schedule.
    pub async fn sync_now(&self) -> Result<SyncOutcome, FetchError> {
        let result = self.sync_locked().await;
        if let Err(e) = &result {
            tracing::warn!(endpoint = %self.fetcher.endpoint(), error = %e, "Manual A/B sync failed");
        }
        result
    }

    /// Run one timer tick: either consume a backoff skip or sync.
    pub async fn tick(&self) -> TickOutcome {
        let _writer = self.sync_lock.lock().await;

        if self.state.lock().backoff.try_skip() {
            return TickOutcome::Skipped;
        }

        match self.fetch_and_merge().await {
            Ok(outcome) => {
                self.state.lock().backoff.record_success();
                TickOutcome::Synced(outcome)
            },
            Err(e) => {
                let (backoff, has_synced) = {
                    let mut state = self.state.lock();
                    state.backoff.record_failure();
                    (state.backoff, state.has_synced)
                };
                self.report_failure(&e, backoff, has_synced);
                TickOutcome::Failed(e)
            },
        }
    }

    /// Currently published snapshot, `None` before the first start.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.load_full()
    }

    /// Replace the published snapshot wholesale.
    ///
    /// Waits for any sync in flight, so a merge never overwrites this snapshot
    /// with one built from an older base.
    pub async fn publish(&self, snapshot: Snapshot) {
        let _writer = self.sync_lock.lock().await;
        self.store_locked(snapshot);
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn status(&self) -> SyncStatus {
        let state = self.state.lock();
        SyncStatus {
            state: self.state(),
            watermark: state.watermark,
            consecutive_failures: state.backoff.consecutive_failures(),
            unavailable_ticks: state.backoff.unavailable_ticks(),
            ticks_to_skip: state.backoff.ticks_to_skip(),
            has_synced: state.has_synced,
        }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Damped failure counter shared by every client bound to this engine.
    pub fn error_tracker(&self) -> &ErrorTracker {
        &self.errors
    }

    async fn sync_locked(&self) -> Result<SyncOutcome, FetchError> {
        let _writer = self.sync_lock.lock().await;
        self.fetch_and_merge().await
    }

    /// Caller must hold `sync_lock`.
    fn store_locked(&self, snapshot: Snapshot) {
        self.snapshot.store(Some(Arc::new(snapshot)));
        self.errors.reset();
    }

    /// Caller must hold `sync_lock`.
    async fn fetch_and_merge(&self) -> Result<SyncOutcome, FetchError> {
        let watermark = self.state.lock().watermark;

        self.transition(EngineState::Idle, EngineState::Fetching);
        let fetched = self.fetcher.fetch(watermark).await;
        self.transition(EngineState::Fetching, EngineState::Idle);
        let update = fetched?;

        {
            let mut state = self.state.lock();
            state.watermark = state.watermark.max(update.watermark);
            state.has_synced = true;
        }

        let experiments = update.changed_experiments();
        if experiments == 0 {
            tracing::debug!(watermark = update.watermark, "A/B config already up to date");
            return Ok(SyncOutcome::UpToDate);
        }

        let projects = update.projects.len();
        let current = self.snapshot.load_full().unwrap_or_default();
        self.store_locked(current.merged(update.projects));

        tracing::info!(
            projects,
            experiments,
            watermark = update.watermark,
            "Published updated A/B snapshot"
        );
        Ok(SyncOutcome::Published { projects, experiments })
    }

    fn transition(&self, from: EngineState, to: EngineState) {
        // Losing the race to `stop` is fine: Stopped must stick.
        let _ = self.lifecycle.compare_exchange(
            from as u8,
            to as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn report_failure(&self, error: &FetchError, backoff: Backoff, has_synced: bool) {
        if has_synced {
            let secs = self.interval.as_secs();
            tracing::warn!(error = %error, "A/B update failed");
            tracing::warn!(
                "A/B server ({}) has been unavailable for {} seconds, local A/B config may be out of date. Retry after {} seconds.",
                self.fetcher.endpoint(),
                backoff.unavailable_ticks().saturating_mul(secs),
                backoff.ticks_to_skip().saturating_mul(secs),
            );
        } else {
            tracing::error!(error = %error, "A/B update failed");
            tracing::error!("{}", ALL_DEFAULT_MESSAGE);
        }
    }

    fn spawn_worker(self: &Arc<Self>) -> JoinHandle<()> {
        let engine: Weak<Self> = Arc::downgrade(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            if *shutdown_rx.borrow_and_update() {
                return;
            }

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                    _ = ticker.tick() => {}
                }

                let Some(strong) = engine.upgrade() else {
                    break;
                };
                run_tick_isolated(strong).await;
            }

            tracing::info!("A/B sync loop exited");
        })
    }
}

/// Run one tick in its own task so a panic inside it is captured here
/// instead of killing the loop.
async fn run_tick_isolated(engine: Arc<SyncEngine>) {
    let worker = Arc::clone(&engine);
    match tokio::spawn(async move { worker.tick().await }).await {
        Ok(outcome) => tracing::trace!(?outcome, "A/B sync tick finished"),
        Err(e) => {
            engine.transition(EngineState::Fetching, EngineState::Idle);
            tracing::error!(error = %e, "A/B sync tick faulted, loop continues");
        },
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("endpoint", &self.fetcher.endpoint())
            .field("interval", &self.interval)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
