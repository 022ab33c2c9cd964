//! Ingestion task: decode records and push them into the store.

use logspark_core::error::{Result, SparkError};
use logspark_core::settings::DecodePolicy;
use logspark_core::store::SharedStore;
use logspark_core::Record;
use tracing::{debug, error, info, warn};

/// How an ingestion run ended, reported to the controller.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The input ended normally.
    Exhausted {
        /// Records pushed into the store.
        pushed: u64,
        /// Undecodable records stepped over under [`DecodePolicy::Skip`].
        skipped: u64,
    },
    /// Ingestion stopped on an error.
    Failed {
        /// Records pushed before the failure.
        pushed: u64,
        error: SparkError,
    },
}

impl IngestOutcome {
    pub fn pushed(&self) -> u64 {
        match self {
            IngestOutcome::Exhausted { pushed, .. } | IngestOutcome::Failed { pushed, .. } => {
                *pushed
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, IngestOutcome::Failed { .. })
    }
}

/// Push every record from `records` into `store`, in arrival order.
///
/// Blocks for as long as the source blocks. Decode errors end the run under
/// [`DecodePolicy::Stop`] and are counted and skipped under
/// [`DecodePolicy::Skip`]; any other error (I/O) always ends the run.
pub fn ingest<I>(records: I, store: &SharedStore, policy: DecodePolicy) -> IngestOutcome
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut pushed = 0u64;
    let mut skipped = 0u64;

    for item in records {
        match item {
            Ok(record) => {
                let outcome = store.push(record);
                pushed += 1;
                debug!(?outcome, "record pushed");
            }
            Err(e) if e.is_decode() && policy == DecodePolicy::Skip => {
                warn!(error = %e, "skipping undecodable record");
                skipped += 1;
            }
            Err(e) => {
                error!(error = %e, pushed, "ingestion stopped");
                return IngestOutcome::Failed { pushed, error: e };
            }
        }
    }

    info!(pushed, skipped, "input exhausted");
    IngestOutcome::Exhausted { pushed, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logspark_core::store::ClusterStore;
    use serde_json::json;

    fn msg(text: &str) -> Result<Record> {
        Ok(json!({ "msg": text }).as_object().cloned().unwrap())
    }

    fn bad(line: usize) -> Result<Record> {
        Err(SparkError::NotAnObject { line })
    }

    fn store() -> SharedStore {
        SharedStore::new(ClusterStore::new(3, vec!["msg".to_string()]))
    }

    #[test]
    fn test_ingest_pushes_all_records() {
        let s = store();
        let outcome = ingest(
            vec![
                msg("error reading file A"),
                msg("error reading file B"),
                msg("completely different event"),
            ],
            &s,
            DecodePolicy::Stop,
        );

        assert!(matches!(
            outcome,
            IngestOutcome::Exhausted {
                pushed: 3,
                skipped: 0
            }
        ));
        let snap = s.snapshot();
        assert_eq!(snap.rows.len(), 2);
        assert_eq!(snap.rows[0].count, 2);
    }

    #[test]
    fn test_stop_policy_fails_on_decode_error() {
        let s = store();
        let outcome = ingest(
            vec![msg("first"), bad(2), msg("never pushed")],
            &s,
            DecodePolicy::Stop,
        );

        assert!(outcome.is_failure());
        assert_eq!(outcome.pushed(), 1);
        assert_eq!(s.snapshot().rows[0].count, 1);
    }

    #[test]
    fn test_skip_policy_continues_past_decode_error() {
        let s = store();
        let outcome = ingest(
            vec![msg("first"), bad(2), msg("first")],
            &s,
            DecodePolicy::Skip,
        );

        assert!(matches!(
            outcome,
            IngestOutcome::Exhausted {
                pushed: 2,
                skipped: 1
            }
        ));
        assert_eq!(s.snapshot().rows[0].count, 2);
    }

    #[test]
    fn test_skip_policy_still_fails_on_io_error() {
        let s = store();
        let io: Result<Record> = Err(SparkError::Io(std::io::Error::other("pipe closed")));
        let outcome = ingest(vec![msg("first"), io], &s, DecodePolicy::Skip);

        match outcome {
            IngestOutcome::Failed { pushed, error } => {
                assert_eq!(pushed, 1);
                assert!(matches!(error, SparkError::Io(_)));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
