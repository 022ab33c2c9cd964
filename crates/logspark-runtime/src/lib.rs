//! Runtime orchestration layer for logspark.
//!
//! Builds the shared [`context::AppContext`] once at startup and runs the
//! long-lived tasks around it: the blocking ingestion task that pushes
//! records into the store, and the aging task that shifts every trend window
//! on a fixed period.

pub mod aging;
pub mod context;
pub mod ingest;
pub mod orchestrator;
pub mod source;

pub use logspark_core as core;
pub use logspark_data as data;
