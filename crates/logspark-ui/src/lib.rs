//! Terminal UI layer for logspark.
//!
//! Provides themes, the cluster table, the sample detail panel and the main
//! event loop built on top of [`ratatui`].

pub mod app;
pub mod detail_view;
pub mod table_view;
pub mod themes;

pub use logspark_core as core;
