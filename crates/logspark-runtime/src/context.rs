//! Explicit application context shared by every task.

use std::time::Duration;

use logspark_core::settings::{DecodePolicy, Settings};
use logspark_core::store::{ClusterStore, SharedStore};

/// State constructed once at startup and cloned into each task.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// The single cluster store all tasks operate on.
    pub store: SharedStore,
    /// Period of the aging task (`trend duration / trend width`).
    pub aging_period: Duration,
    /// What the ingestion task does with undecodable records.
    pub decode_policy: DecodePolicy,
}

impl AppContext {
    pub fn new(store: SharedStore, aging_period: Duration, decode_policy: DecodePolicy) -> Self {
        Self {
            store,
            aging_period,
            decode_policy,
        }
    }

    /// Build a context with an empty store configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let store = ClusterStore::new(settings.distance, settings.fields.clone());
        Self::new(
            SharedStore::new(store),
            settings.aging_period(),
            settings.on_decode_error,
        )
    }
}
