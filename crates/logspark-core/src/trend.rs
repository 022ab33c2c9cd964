//! Fixed-width rolling history of per-bucket event counts.

use std::time::Duration;

/// Default number of buckets in a trend window.
pub const TREND_WIDTH: usize = 7;

/// Ring of event counts, index 0 oldest and the last slot the current bucket.
///
/// The length never changes after construction: [`TrendWindow::shift`]
/// rotates in place and [`TrendWindow::bump`] only touches the newest slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendWindow {
    slots: Vec<u32>,
}

impl TrendWindow {
    /// An all-zero window of `width` buckets. A zero width is bumped up to one
    /// so that there is always a current bucket.
    pub fn new(width: usize) -> Self {
        Self {
            slots: vec![0; width.max(1)],
        }
    }

    /// A window with a single event in the current bucket.
    pub fn with_first_event(width: usize) -> Self {
        let mut window = Self::new(width);
        window.bump();
        window
    }

    /// Count one event in the current bucket.
    pub fn bump(&mut self) {
        if let Some(last) = self.slots.last_mut() {
            *last = last.saturating_add(1);
        }
    }

    /// Age the window by one bucket: drop the oldest, open an empty current one.
    pub fn shift(&mut self) {
        self.slots.rotate_left(1);
        if let Some(last) = self.slots.last_mut() {
            *last = 0;
        }
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of all buckets currently in the window.
    pub fn total(&self) -> u64 {
        self.slots.iter().map(|&n| u64::from(n)).sum()
    }
}

impl Default for TrendWindow {
    fn default() -> Self {
        Self::new(TREND_WIDTH)
    }
}

/// How often the aging task must shift so that `width` buckets span `duration`.
pub fn aging_period(duration: Duration, width: usize) -> Duration {
    duration / width.max(1) as u32
}
