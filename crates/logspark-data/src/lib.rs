//! Record ingestion adapters for logspark.
//!
//! Turns a byte stream into a sequence of [`logspark_core::Record`]s: either
//! one JSON object per line ([`reader`]) or nginx access-log lines described
//! by a `log_format` directive ([`nginx`]).

pub mod nginx;
pub mod reader;

pub use logspark_core as core;
