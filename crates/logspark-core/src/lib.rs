//! Fuzzy-grouping engine for logspark.
//!
//! Records pushed into a [`store::ClusterStore`] are reduced to a token key
//! ([`key`]), compared against existing clusters by token-level edit
//! distance ([`distance`]) and either merged into the first close-enough
//! cluster or appended as a new one. Every cluster carries a rolling
//! [`trend::TrendWindow`] that the aging task shifts periodically, and the
//! [`sparkline`] quantizer turns that history into glyphs for display.

pub mod distance;
pub mod error;
pub mod key;
pub mod settings;
pub mod sparkline;
pub mod store;
pub mod trend;
pub mod value;

/// A single decoded log event: an open field → value mapping.
///
/// `serde_json::Map` keeps its keys sorted, which is what gives derived
/// field lists a stable order.
pub type Record = serde_json::Map<String, serde_json::Value>;
