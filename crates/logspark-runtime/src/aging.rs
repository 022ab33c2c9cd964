//! Aging task: periodically shift every trend window.

use std::time::Duration;

use logspark_core::store::SharedStore;
use tokio::time::{self, MissedTickBehavior};

/// Shortest period the loop accepts; `tokio::time::interval` panics on zero.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Shift `store` once per `period`, forever.
///
/// The first shift happens one full period after start. Ticks that fall
/// behind are delayed rather than bursted, so a stalled runtime never ages the
/// window several buckets at once. A period below [`MIN_PERIOD`] is raised to
/// it. Stop the loop by aborting its task.
pub async fn run(store: SharedStore, period: Duration) {
    if period < MIN_PERIOD {
        tracing::warn!(?period, min = ?MIN_PERIOD, "aging period raised to minimum");
    }
    let mut interval = time::interval(period.max(MIN_PERIOD));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Consume the first tick which fires immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        store.shift();
        tracing::trace!("trend windows shifted");
    }
}
