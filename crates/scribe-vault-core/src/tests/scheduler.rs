use crate::{
    AutosaveEvent, AutosaveScheduler, KeyValueStorage, MemoryStorage, SaveTrigger, Snapshot,
    SnapshotStore, TranscriptionMetadata,
    tests::{RejectingStorage, snapshot},
};

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{sync::watch, time::sleep};

const INTERVAL: Duration = Duration::from_secs(30);
const MARGIN: Duration = Duration::from_millis(10);

fn scheduler_over(storage: Arc<dyn KeyValueStorage>) -> (AutosaveScheduler, watch::Sender<bool>) {
    let (teardown_tx, teardown_rx) = watch::channel(false);
    let scheduler = AutosaveScheduler::new(SnapshotStore::new(storage), INTERVAL, teardown_rx);
    (scheduler, teardown_tx)
}

fn scheduler() -> (AutosaveScheduler, watch::Sender<bool>) {
    scheduler_over(Arc::new(MemoryStorage::new()))
}

/// Pull callback returning a fixed snapshot and counting its invocations.
fn counting_pull(
    counter: &Arc<AtomicUsize>,
    value: Snapshot,
) -> impl Fn() -> Option<Snapshot> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Some(value.clone())
    }
}

/// WHAT: One interval after start the pulled state is in the slot
/// WHY: Periodic snapshots are the basis of recovery
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_started_scheduler_when_one_interval_passes_then_slot_holds_pulled_snapshot() {
    // Given: A scheduler pulling a fixed snapshot
    let (scheduler, _teardown) = scheduler();
    let expected = Snapshot::new(
        1000,
        12.0,
        "abc",
        TranscriptionMetadata {
            is_auto_saved: true,
            ..TranscriptionMetadata::default()
        },
    );
    let pulled = expected.clone();
    scheduler.start(move || Some(pulled.clone()));

    // When: Nothing yet before the first interval, then one interval passes
    sleep(INTERVAL - MARGIN).await;
    assert!(!scheduler.has_snapshot());
    sleep(MARGIN * 2).await;

    // Then: The slot holds exactly that object
    assert_eq!(scheduler.last_snapshot(), Some(expected));
}

/// WHAT: Restarting never leaves duplicate timers
/// WHY: At most one timer may be live per scheduler
#[tokio::test(start_paused = true)]
async fn given_start_called_three_times_when_window_elapses_then_single_timer_ticks() {
    // Given: A scheduler started three times in a row
    let (scheduler, _teardown) = scheduler();
    let pulls = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        scheduler.start(counting_pull(&pulls, snapshot(1_000, 1.0, "x")));
    }

    // When: A little over three intervals pass
    sleep(INTERVAL * 3 + MARGIN).await;

    // Then: Exactly three ticks happened
    assert_eq!(pulls.load(Ordering::SeqCst), 3);
    assert!(scheduler.is_running());
}

/// WHAT: Restarting mid-interval re-arms from the new start
/// WHY: The old timer must be cancelled, not merely replaced
#[tokio::test(start_paused = true)]
async fn given_restart_mid_interval_when_old_deadline_passes_then_no_tick() {
    // Given: A scheduler started, then restarted 20s later
    let (scheduler, _teardown) = scheduler();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    scheduler.start(counting_pull(&first, snapshot(1_000, 1.0, "first")));
    sleep(Duration::from_secs(20)).await;
    scheduler.start(counting_pull(&second, snapshot(2_000, 2.0, "second")));

    // When: The first timer's deadline passes, then the second's
    sleep(Duration::from_secs(15)).await;
    let second_before = second.load(Ordering::SeqCst);
    sleep(Duration::from_secs(20)).await;

    // Then: Only the second pull ran, once
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second_before, 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

/// WHAT: stop() before the first tick prevents any write
/// WHY: stop always wins over a scheduled tick
#[tokio::test(start_paused = true)]
async fn given_started_scheduler_when_stopped_before_tick_then_nothing_written() {
    // Given: A started scheduler
    let (scheduler, _teardown) = scheduler();
    let pulls = Arc::new(AtomicUsize::new(0));
    scheduler.start(counting_pull(&pulls, snapshot(1_000, 1.0, "x")));
    sleep(INTERVAL - MARGIN).await;

    // When: Stopping just before the tick and waiting past it
    scheduler.stop();
    sleep(INTERVAL * 2).await;

    // Then: No pull, no snapshot, no timer
    assert_eq!(pulls.load(Ordering::SeqCst), 0);
    assert!(!scheduler.has_snapshot());
    assert!(!scheduler.is_running());
}

/// WHAT: stop() clears the slot and can be repeated
/// WHY: Nothing is left to recover once a recording stops
#[tokio::test(start_paused = true)]
async fn given_written_snapshot_when_stopped_twice_then_slot_empty() {
    // Given: A scheduler that has written one snapshot
    let (scheduler, _teardown) = scheduler();
    scheduler.start(|| Some(snapshot(1_000, 1.0, "x")));
    sleep(INTERVAL + MARGIN).await;
    assert!(scheduler.has_snapshot());

    // When: Stopping twice, including from the stopped state
    scheduler.stop();
    scheduler.stop();

    // Then: Slot is empty
    assert_eq!(scheduler.last_snapshot(), None);
}

/// WHAT: A tick with nothing to pull keeps the previous snapshot
/// WHY: Absence of new data does not make the old snapshot stale
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_existing_snapshot_when_pull_yields_none_then_snapshot_kept() {
    // Given: A slot already holding a snapshot
    let (scheduler, _teardown) = scheduler();
    scheduler.store().write(&snapshot(1_000, 4.0, "kept")).unwrap();

    // When: A tick pulls nothing
    scheduler.start(|| None);
    sleep(INTERVAL + MARGIN).await;

    // Then: The old snapshot is still there
    assert_eq!(scheduler.last_snapshot().unwrap().content, "kept");
}

/// WHAT: Subscribers are notified once per successful write
/// WHY: The user sees an "auto-saved" notice per save
#[tokio::test(start_paused = true)]
async fn given_subscribers_when_ticks_write_then_each_gets_one_event_per_write() {
    // Given: Two subscribers
    let (scheduler, _teardown) = scheduler();
    let mut first = scheduler.subscribe();
    let mut second = scheduler.subscribe();
    scheduler.start(|| Some(snapshot(7_000, 1.0, "x")));

    // When: Two intervals pass
    sleep(INTERVAL * 2 + MARGIN).await;

    // Then: Each subscriber received two interval events
    let expected = AutosaveEvent::Saved {
        timestamp: 7_000,
        trigger: SaveTrigger::Interval,
    };
    for rx in [&mut first, &mut second] {
        assert_eq!(rx.try_recv().ok(), Some(expected.clone()));
        assert_eq!(rx.try_recv().ok(), Some(expected.clone()));
        assert!(rx.try_recv().is_err());
    }
}

/// WHAT: Write failures neither stop the timer nor notify
/// WHY: Storage problems degrade silently; the next tick tries again
#[tokio::test(start_paused = true)]
async fn given_rejecting_storage_when_ticking_then_scheduler_keeps_running() {
    // Given: A scheduler over storage that rejects every write
    let storage = Arc::new(RejectingStorage::default());
    let (scheduler, _teardown) =
        scheduler_over(Arc::clone(&storage) as Arc<dyn KeyValueStorage>);
    let mut events = scheduler.subscribe();
    let pulls = Arc::new(AtomicUsize::new(0));
    scheduler.start(counting_pull(&pulls, snapshot(1_000, 1.0, "x")));

    // When: Two intervals pass
    sleep(INTERVAL * 2 + MARGIN).await;

    // Then: Both ticks attempted a write, no event, timer alive
    assert_eq!(pulls.load(Ordering::SeqCst), 2);
    assert_eq!(storage.attempts.load(Ordering::SeqCst), 2);
    assert!(events.try_recv().is_err());
    assert!(scheduler.is_running());
}

/// WHAT: Teardown performs one final write and ends the timer
/// WHY: Work since the last tick must survive process exit
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_running_scheduler_when_teardown_signalled_then_final_snapshot_written() {
    // Given: A running scheduler, before its first tick
    let (scheduler, teardown) = scheduler();
    let mut events = scheduler.subscribe();
    scheduler.start(|| Some(snapshot(9_000, 5.0, "last words")));
    sleep(Duration::from_secs(5)).await;

    // When: Teardown is signalled
    teardown.send(true).unwrap();
    scheduler.join_teardown().await;

    // Then: The final state is stored, announced, and the timer is gone
    assert_eq!(scheduler.last_snapshot().unwrap().content, "last words");
    assert_eq!(
        events.try_recv().ok(),
        Some(AutosaveEvent::Saved {
            timestamp: 9_000,
            trigger: SaveTrigger::Teardown,
        })
    );
    assert!(!scheduler.is_running());

    // And: Starting again after teardown is ignored
    scheduler.start(|| Some(snapshot(10_000, 6.0, "too late")));
    assert!(!scheduler.is_running());
}

/// WHAT: Dropping the teardown sender also triggers the final write
/// WHY: An owner that disappears counts as teardown
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_running_scheduler_when_teardown_sender_dropped_then_final_snapshot_written() {
    let (scheduler, teardown) = scheduler();
    scheduler.start(|| Some(snapshot(3_000, 2.0, "dropped")));

    drop(teardown);
    scheduler.join_teardown().await;

    assert_eq!(scheduler.last_snapshot().unwrap().content, "dropped");
}

/// WHAT: Teardown after stop writes nothing
/// WHY: A stopped recording has nothing worth recovering
#[tokio::test(start_paused = true)]
async fn given_stopped_scheduler_when_teardown_signalled_then_slot_stays_empty() {
    let (scheduler, teardown) = scheduler();
    scheduler.start(|| Some(snapshot(3_000, 2.0, "finished")));
    scheduler.stop();

    let _ = teardown.send(true);
    scheduler.join_teardown().await;

    assert!(!scheduler.has_snapshot());
}
