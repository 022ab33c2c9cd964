//! Task orchestrator.
//!
//! Spawns the ingestion and aging tasks around a shared [`AppContext`] and
//! reports the ingestion outcome to the controller over an `mpsc` channel.
//! The controller (the UI loop) decides what an outcome means: a failed
//! ingestion ends the session, an exhausted one leaves the table live.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::aging;
use crate::context::AppContext;
use crate::ingest::{self, IngestOutcome};
use crate::source::RecordSource;

// ── Public types ──────────────────────────────────────────────────────────────

/// Notifications sent from the background tasks to the controller.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// The ingestion task returned; no more records will arrive.
    IngestFinished(IngestOutcome),
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Owns the context until [`Orchestrator::start`] hands it to the tasks.
pub struct Orchestrator {
    ctx: AppContext,
}

impl Orchestrator {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Start ingesting from `source` and aging the store.
    ///
    /// Ingestion runs on tokio's blocking pool since the source blocks on
    /// input. Returns the event receiver and a handle to stop the tasks.
    pub fn start(self, source: RecordSource) -> (mpsc::Receiver<RuntimeEvent>, RuntimeHandle) {
        let (tx, rx) = mpsc::channel(4);

        let aging = tokio::spawn(aging::run(self.ctx.store.clone(), self.ctx.aging_period));
        tracing::info!(period = ?self.ctx.aging_period, "aging task started");

        let store = self.ctx.store.clone();
        let policy = self.ctx.decode_policy;
        let ingest = tokio::task::spawn_blocking(move || {
            let outcome = ingest::ingest(source, &store, policy);
            if tx.blocking_send(RuntimeEvent::IngestFinished(outcome)).is_err() {
                tracing::debug!("controller gone; dropping ingestion outcome");
            }
        });

        (rx, RuntimeHandle { aging, ingest })
    }
}

// ── RuntimeHandle ─────────────────────────────────────────────────────────────

/// Handle to the background tasks.
pub struct RuntimeHandle {
    aging: JoinHandle<()>,
    ingest: JoinHandle<()>,
}

impl RuntimeHandle {
    /// Stop the background tasks.
    ///
    /// The aging loop stops at its next await point. An ingestion read already
    /// blocked on input cannot be interrupted and ends with the process.
    pub fn abort(&self) {
        self.aging.abort();
        self.ingest.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
