//! Periodic auto-save of the in-flight recording into the snapshot slot.

use crate::{Snapshot, SnapshotStore};

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, instrument, warn};

/// Default time between two auto-save ticks.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 16;

/// How long [`AutosaveScheduler::join_teardown`] waits for the teardown hook.
const TEARDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Callback returning the best current in-flight state, or `None` when there
/// is nothing worth saving yet.
pub type PullFn = Arc<dyn Fn() -> Option<Snapshot> + Send + Sync>;

/// What caused a snapshot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// A periodic timer tick.
    Interval,
    /// The process teardown hook.
    Teardown,
}

/// Notification published after every successful snapshot write.
#[derive(Debug, Clone, PartialEq)]
pub enum AutosaveEvent {
    /// A snapshot was stored.
    Saved {
        /// Timestamp of the stored snapshot, epoch milliseconds.
        timestamp: i64,
        /// What caused the write.
        trigger: SaveTrigger,
    },
}

struct SchedulerState {
    /// Bumped by every `start` and `stop`; a tick only writes while its
    /// generation is current.
    generation: u64,
    pull: Option<PullFn>,
    ticker: Option<JoinHandle<()>>,
    torn_down: bool,
}

struct Shared {
    store: SnapshotStore,
    state: Mutex<SchedulerState>,
    events: broadcast::Sender<AutosaveEvent>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|e| {
            error!("Scheduler state lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    fn tick(&self, generation: u64) {
        // The lock is held from pull to write: stop() and the teardown hook
        // cannot interleave with a tick body.
        let state = self.state();

        if state.generation != generation || state.torn_down {
            debug!(generation, "Stale auto-save tick skipped");
            return;
        }

        if let Some(pull) = state.pull.as_ref() {
            self.save(pull, SaveTrigger::Interval);
        }
    }

    fn teardown(&self) {
        let mut state = self.state();

        if state.torn_down {
            return;
        }
        state.torn_down = true;

        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }

        match state.pull.as_ref() {
            Some(pull) => self.save(pull, SaveTrigger::Teardown),
            None => debug!("Teardown with no active recording, nothing to save"),
        }
    }

    fn save(&self, pull: &PullFn, trigger: SaveTrigger) {
        let Some(snapshot) = pull() else {
            debug!(?trigger, "No in-flight state to auto-save");
            return;
        };

        match self.store.write(&snapshot) {
            Ok(()) => {
                info!(
                    ?trigger,
                    timestamp = snapshot.timestamp,
                    duration_secs = snapshot.duration,
                    "Recording auto-saved"
                );
                // No subscribers is fine.
                let _ = self.events.send(AutosaveEvent::Saved {
                    timestamp: snapshot.timestamp,
                    trigger,
                });
            }
            Err(e) => {
                warn!(?trigger, error = ?e, "Auto-save write failed");
            }
        }
    }
}

/// Periodically persists the in-flight recording to the [`SnapshotStore`].
///
/// Owns at most one interval timer and exactly one teardown listener. The
/// teardown listener is installed by [`AutosaveScheduler::new`] and performs
/// one last pull+write when the teardown signal changes or its sender is
/// dropped, independent of any `start`/`stop` cycles.
///
/// Must be constructed inside a tokio runtime.
pub struct AutosaveScheduler {
    shared: Arc<Shared>,
    interval: Duration,
    teardown_task: Mutex<Option<JoinHandle<()>>>,
}

impl AutosaveScheduler {
    /// Create a scheduler writing to `store` every `interval`.
    ///
    /// A zero interval falls back to [`DEFAULT_AUTOSAVE_INTERVAL`].
    #[instrument(skip(store, teardown))]
    pub fn new(
        store: SnapshotStore,
        interval: Duration,
        mut teardown: watch::Receiver<bool>,
    ) -> Self {
        let interval = if interval.is_zero() {
            warn!("Zero auto-save interval, using default");
            DEFAULT_AUTOSAVE_INTERVAL
        } else {
            interval
        };

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let shared = Arc::new(Shared {
            store,
            state: Mutex::new(SchedulerState {
                generation: 0,
                pull: None,
                ticker: None,
                torn_down: false,
            }),
            events,
        });

        let hook = Arc::clone(&shared);
        let teardown_task = tokio::spawn(async move {
            // Err means the sender is gone, which also signals teardown.
            let _ = teardown.changed().await;
            info!("Teardown signalled, saving final snapshot");
            hook.teardown();
        });

        debug!(interval_secs = interval.as_secs_f64(), "Autosave scheduler created");

        Self {
            shared,
            interval,
            teardown_task: Mutex::new(Some(teardown_task)),
        }
    }

    /// Register `pull` and (re)start the interval timer.
    ///
    /// Any timer from an earlier `start` is cancelled first. The first tick
    /// fires one full interval after this call. Ignored after teardown.
    #[instrument(skip(self, pull))]
    pub fn start<F>(&self, pull: F)
    where
        F: Fn() -> Option<Snapshot> + Send + Sync + 'static,
    {
        let mut state = self.shared.state();

        if state.torn_down {
            warn!("Auto-save start ignored after teardown");
            return;
        }

        if let Some(previous) = state.ticker.take() {
            previous.abort();
            debug!("Previous auto-save timer cancelled");
        }

        state.generation += 1;
        state.pull = Some(Arc::new(pull));

        let generation = state.generation;
        let period = self.interval;
        let shared = Arc::clone(&self.shared);

        state.ticker = Some(tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                shared.tick(generation);
            }
        }));

        info!(generation, interval_secs = period.as_secs_f64(), "Auto-save started");
    }

    /// Cancel the timer, drop the pull callback and clear the snapshot slot.
    ///
    /// Idempotent. A tick that has not yet taken the state lock when `stop`
    /// runs will not write.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        let mut state = self.shared.state();

        state.generation += 1;
        state.pull = None;

        if let Some(ticker) = state.ticker.take() {
            ticker.abort();
        }

        if let Err(e) = self.shared.store.clear() {
            warn!(error = ?e, "Failed to clear snapshot slot on stop");
        }

        info!("Auto-save stopped");
    }

    /// Whether an interval timer is currently live.
    pub fn is_running(&self) -> bool {
        self.shared
            .state()
            .ticker
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    /// Subscribe to [`AutosaveEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<AutosaveEvent> {
        self.shared.events.subscribe()
    }

    /// Snapshot currently in the slot.
    pub fn last_snapshot(&self) -> Option<Snapshot> {
        self.shared.store.read()
    }

    /// Whether the slot holds a snapshot.
    pub fn has_snapshot(&self) -> bool {
        self.shared.store.exists()
    }

    /// The underlying snapshot slot.
    pub fn store(&self) -> &SnapshotStore {
        &self.shared.store
    }

    /// Wait for the teardown hook to finish its final write.
    ///
    /// Returns after [`TEARDOWN_JOIN_TIMEOUT`] if the hook has not completed.
    /// Only the first call waits.
    pub async fn join_teardown(&self) {
        let handle = self.teardown_handle().take();

        let Some(handle) = handle else {
            return;
        };

        match time::timeout(TEARDOWN_JOIN_TIMEOUT, handle).await {
            Ok(Ok(())) => debug!("Teardown hook finished"),
            Ok(Err(e)) => warn!(error = ?e, "Teardown hook task failed"),
            Err(_) => warn!("Teardown hook did not finish within timeout"),
        }
    }

    fn teardown_handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.teardown_task.lock().unwrap_or_else(|e| {
            error!("Teardown handle lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        if let Some(ticker) = self.shared.state().ticker.take() {
            ticker.abort();
        }
        if let Some(hook) = self.teardown_handle().take() {
            hook.abort();
        }
    }
}
