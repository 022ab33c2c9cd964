//! Cluster store: merge-or-append classification and trend aging.
//!
//! [`ClusterStore`] is the plain single-owner data structure. [`SharedStore`]
//! wraps it in an `Arc<RwLock<_>>` so the ingestion, aging and render tasks
//! can share one instance: `push` and `shift` take the write lock, snapshots
//! take the read lock, and nothing performs I/O while holding either.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::distance::distance;
use crate::key::extract_key;
use crate::trend::{TrendWindow, TREND_WIDTH};
use crate::value::field_value;
use crate::Record;

// ── Cluster ───────────────────────────────────────────────────────────────────

/// A group of records considered fuzzy-equal.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Token key of the record that created the cluster. Only used for
    /// distance comparisons, never displayed.
    key: Vec<String>,
    trend: TrendWindow,
    count: u64,
    /// Most recently merged record.
    sample: Arc<Record>,
}

impl Cluster {
    fn new(key: Vec<String>, record: Record, width: usize) -> Self {
        Self {
            key,
            trend: TrendWindow::with_first_event(width),
            count: 1,
            sample: Arc::new(record),
        }
    }

    fn merge(&mut self, record: Record) {
        self.trend.bump();
        self.count += 1;
        self.sample = Arc::new(record);
    }

    pub fn key(&self) -> &[String] {
        &self.key
    }

    pub fn trend(&self) -> &TrendWindow {
        &self.trend
    }

    /// Total number of records ever merged into this cluster (at least 1).
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sample(&self) -> &Arc<Record> {
        &self.sample
    }

    /// Stringified sample values for each of `fields`, in order.
    pub fn display_values(&self, fields: &[String]) -> Vec<String> {
        fields
            .iter()
            .map(|f| field_value(&self.sample, f))
            .collect()
    }
}

// ── Push outcome ──────────────────────────────────────────────────────────────

/// What [`ClusterStore::push`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Merged into the existing cluster at this index.
    Merged(usize),
    /// Appended as a new cluster at this index.
    Created(usize),
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Read-only copy of one cluster, ready for rendering.
#[derive(Debug, Clone)]
pub struct ClusterRow {
    pub trend: Vec<u32>,
    pub count: u64,
    /// Display value per configured field.
    pub values: Vec<String>,
    pub sample: Arc<Record>,
}

/// Consistent view of the whole store taken under a single read lock.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub fields: Vec<String>,
    pub rows: Vec<ClusterRow>,
}

// ── ClusterStore ──────────────────────────────────────────────────────────────

/// Insertion-ordered set of clusters.
///
/// Lookup is a linear scan and the *first* cluster within the threshold wins,
/// not the closest one. Clusters are never removed.
#[derive(Debug, Clone)]
pub struct ClusterStore {
    threshold: usize,
    fields: Vec<String>,
    /// Set once the field list can no longer change.
    fields_fixed: bool,
    fields_derived: bool,
    trend_width: usize,
    clusters: Vec<Cluster>,
}

impl ClusterStore {
    /// Create an empty store. An empty `fields` list is replaced, once, by the
    /// field names of the first pushed record.
    pub fn new(threshold: usize, fields: Vec<String>) -> Self {
        Self {
            threshold,
            fields_fixed: !fields.is_empty(),
            fields,
            fields_derived: false,
            trend_width: TREND_WIDTH,
            clusters: Vec::new(),
        }
    }

    /// Use `width` buckets per trend window instead of [`TREND_WIDTH`].
    pub fn with_trend_width(mut self, width: usize) -> Self {
        self.trend_width = width.max(1);
        self
    }

    /// Classify `record`: merge it into the first cluster whose key is closer
    /// than the threshold, or append a new cluster.
    pub fn push(&mut self, record: Record) -> PushOutcome {
        if !self.fields_fixed {
            self.fields = record.keys().cloned().collect();
            self.fields_fixed = true;
            self.fields_derived = true;
            info!(fields = ?self.fields, "derived field list from first record");
        }

        let key = extract_key(&record, &self.fields, self.threshold);

        let threshold = self.threshold;
        if let Some(index) = self
            .clusters
            .iter()
            .position(|c| distance(&key, &c.key) < threshold)
        {
            self.clusters[index].merge(record);
            return PushOutcome::Merged(index);
        }

        self.clusters
            .push(Cluster::new(key, record, self.trend_width));
        let index = self.clusters.len() - 1;
        debug!(index, "created cluster");
        PushOutcome::Created(index)
    }

    /// Age every cluster's trend window by one bucket.
    pub fn shift(&mut self) {
        for cluster in &mut self.clusters {
            cluster.trend.shift();
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cluster> {
        self.clusters.get(index)
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// `true` when the field list came from the first record rather than
    /// from configuration.
    pub fn fields_derived(&self) -> bool {
        self.fields_derived
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            fields: self.fields.clone(),
            rows: self
                .clusters
                .iter()
                .map(|c| ClusterRow {
                    trend: c.trend.as_slice().to_vec(),
                    count: c.count,
                    values: c.display_values(&self.fields),
                    sample: Arc::clone(&c.sample),
                })
                .collect(),
        }
    }
}

// ── SharedStore ───────────────────────────────────────────────────────────────

/// Cloneable handle to a [`ClusterStore`] shared between tasks.
///
/// Every mutation is total and leaves clusters consistent, so a poisoned lock
/// is recovered rather than propagated.
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<ClusterStore>>,
}

impl SharedStore {
    pub fn new(store: ClusterStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ClusterStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClusterStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, record: Record) -> PushOutcome {
        self.write().push(record)
    }

    pub fn shift(&self) {
        self.write().shift();
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.read().snapshot()
    }

    /// Last record merged into the cluster at `index`, for the detail view.
    pub fn sample(&self, index: usize) -> Option<Arc<Record>> {
        self.read().get(index).map(|c| Arc::clone(c.sample()))
    }

    pub fn fields(&self) -> Vec<String> {
        self.read().fields().to_vec()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Run `f` against the store under the read lock.
    pub fn with_read<R>(&self, f: impl FnOnce(&ClusterStore) -> R) -> R {
        f(&self.read())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    fn record(v: serde_json::Value) -> Record {
        v.as_object().cloned().expect("object")
    }

    fn msg(text: &str) -> Record {
        record(json!({ "msg": text }))
    }

    fn store() -> ClusterStore {
        ClusterStore::new(3, vec!["msg".to_string()])
    }

    // ── push ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_close_records_merge() {
        let mut s = store();
        assert_eq!(s.push(msg("error reading file A")), PushOutcome::Created(0));
        assert_eq!(s.push(msg("error reading file B")), PushOutcome::Merged(0));

        assert_eq!(s.len(), 1);
        let c = s.get(0).unwrap();
        assert_eq!(c.count(), 2);
        assert_eq!(c.sample().get("msg"), Some(&json!("error reading file B")));
        assert_eq!(c.trend().as_slice(), &[0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_distant_records_append() {
        let mut s = store();
        s.push(msg("error reading file A"));
        assert_eq!(
            s.push(msg("completely different event")),
            PushOutcome::Created(1)
        );
        assert_eq!(s.len(), 2);
        assert!(s.clusters().all(|c| c.count() == 1));
    }

    #[test]
    fn test_first_match_wins_over_best_match() {
        let mut s = ClusterStore::new(3, vec!["msg".to_string()]);
        s.push(msg("a b c d e f"));
        s.push(msg("a b x y z f"));
        assert_eq!(s.len(), 2);

        // Distance 2 to cluster 0 and 1 to cluster 1: the lower index wins.
        assert_eq!(s.push(msg("a b x y e f")), PushOutcome::Merged(0));
        assert_eq!(s.get(0).unwrap().count(), 2);
        assert_eq!(s.get(1).unwrap().count(), 1);
    }

    #[test]
    fn test_key_is_not_replaced_on_merge() {
        let mut s = store();
        s.push(msg("one two three four"));
        s.push(msg("one two three five"));
        assert_eq!(s.get(0).unwrap().key(), ["one", "two", "three", "four"]);
    }

    #[test]
    fn test_zero_threshold_never_merges() {
        let mut s = ClusterStore::new(0, vec!["msg".to_string()]);
        s.push(msg("same"));
        s.push(msg("same"));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_fields_derived_from_first_record_once() {
        let mut s = ClusterStore::new(3, Vec::new());
        s.push(record(json!({"status": 200, "path": "/a"})));
        assert!(s.fields_derived());
        assert_eq!(s.fields(), ["path", "status"]);

        s.push(record(json!({"other": "x"})));
        assert_eq!(s.fields(), ["path", "status"]);
    }

    #[test]
    fn test_configured_fields_are_kept() {
        let mut s = store();
        s.push(record(json!({"msg": "m", "level": "info"})));
        assert!(!s.fields_derived());
        assert_eq!(s.fields(), ["msg"]);
    }

    // ── shift ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_shift_ages_all_clusters() {
        let mut s = store();
        s.push(msg("error reading file A"));
        s.push(msg("completely different event"));
        s.shift();
        s.push(msg("completely different thing"));

        assert_eq!(s.get(0).unwrap().trend().as_slice(), &[0, 0, 0, 0, 0, 1, 0]);
        assert_eq!(s.get(1).unwrap().trend().as_slice(), &[0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_width_shifts_clear_trends_but_keep_counts() {
        let mut s = store().with_trend_width(4);
        s.push(msg("a"));
        s.push(msg("a"));
        for _ in 0..4 {
            s.shift();
            assert!(s.clusters().all(|c| c.trend().len() == 4));
        }
        let c = s.get(0).unwrap();
        assert_eq!(c.trend().total(), 0);
        assert_eq!(c.count(), 2);
    }

    // ── snapshot ──────────────────────────────────────────────────────────────

    #[test]
    fn test_snapshot_rows_in_store_order() {
        let mut s = ClusterStore::new(3, vec!["msg".to_string(), "level".to_string()]);
        s.push(record(json!({"msg": "first event here", "level": "info"})));
        s.push(record(json!({"msg": "something else entirely now"})));

        let snap = s.snapshot();
        assert_eq!(snap.fields, ["msg", "level"]);
        assert_eq!(snap.rows.len(), 2);
        assert_eq!(snap.rows[0].values, ["first event here", "info"]);
        assert_eq!(snap.rows[1].values, ["something else entirely now", "<nil>"]);
        assert_eq!(snap.rows[1].count, 1);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_mutation() {
        let mut s = store();
        s.push(msg("a"));
        let snap = s.snapshot();
        s.push(msg("a"));
        s.shift();
        assert_eq!(snap.rows[0].count, 1);
        assert_eq!(snap.rows[0].trend[6], 1);
    }

    // ── SharedStore ───────────────────────────────────────────────────────────

    #[test]
    fn test_shared_store_concurrent_pushes() {
        let shared = SharedStore::new(store());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let s = shared.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        s.push(msg(&format!("worker event {t} number {i}")));
                        if i % 50 == 0 {
                            s.shift();
                        }
                        let snap = s.snapshot();
                        assert!(snap.rows.iter().all(|r| r.trend.len() == TREND_WIDTH));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let total: u64 = shared.snapshot().rows.iter().map(|r| r.count).sum();
        assert_eq!(total, 1000);
    }

    #[test]
    fn test_shared_store_sample_lookup() {
        let shared = SharedStore::new(store());
        assert!(shared.is_empty());
        shared.push(msg("x y z"));
        assert_eq!(shared.len(), 1);
        assert_eq!(shared.sample(0).unwrap().get("msg"), Some(&json!("x y z")));
        assert!(shared.sample(5).is_none());
        assert_eq!(shared.fields(), ["msg"]);
        assert_eq!(shared.with_read(|s| s.threshold()), 3);
    }
}
