use chrono::Utc;

/// Source of wall-clock timestamps in epoch milliseconds.
///
/// Timers use tokio's clock; this trait only stamps snapshots and history
/// entries, so tests can pin it.
pub trait Clock: Send + Sync {
    /// Current instant, epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
