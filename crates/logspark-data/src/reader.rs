//! JSON record stream decoding.
//!
//! Input is a stream of JSON values separated by optional whitespace: one
//! object per line, several objects on a line and pretty-printed objects
//! spanning lines are all accepted. Each value must be an object. Errors
//! carry the 1-based line number so the caller decides whether to stop or
//! step over them.

use std::io::{self, Read};
use std::sync::{Arc, Mutex, PoisonError};

use logspark_core::error::{Result, SparkError};
use logspark_core::Record;
use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer, Value};
use tracing::debug;

// ── Line tracking ─────────────────────────────────────────────────────────────

/// Bytes and newlines consumed by the decoder so far.
#[derive(Debug, Default)]
struct Tally {
    bytes: usize,
    newlines: usize,
    last: u8,
}

/// `Read` adapter that counts what passes through it.
struct Counted<R> {
    inner: R,
    tally: Arc<Mutex<Tally>>,
}

impl<R: Read> Read for Counted<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            let mut tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
            tally.bytes += n;
            tally.newlines += buf[..n].iter().filter(|&&b| b == b'\n').count();
            tally.last = buf[n - 1];
        }
        Ok(n)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Turn one decoded value into a [`Record`].
pub fn into_record(value: Value, line: usize) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SparkError::NotAnObject { line }),
    }
}

/// Iterator over the records of a JSON value stream.
///
/// A value that is valid JSON but not an object is yielded as
/// [`SparkError::NotAnObject`] and the stream continues. A syntax error or an
/// I/O error is yielded once and ends the iteration, since the decoder cannot
/// find the start of the next value after it.
pub struct JsonReader<R: Read> {
    values: StreamDeserializer<'static, IoRead<Counted<R>>, Value>,
    tally: Arc<Mutex<Tally>>,
    records: usize,
    done: bool,
}

impl<R: Read> JsonReader<R> {
    pub fn new(input: R) -> Self {
        let tally = Arc::new(Mutex::new(Tally::default()));
        let counted = Counted {
            inner: input,
            tally: Arc::clone(&tally),
        };
        Self {
            values: Deserializer::from_reader(counted).into_iter::<Value>(),
            tally,
            records: 0,
            done: false,
        }
    }

    /// Number of objects decoded so far.
    pub fn records_read(&self) -> usize {
        self.records
    }

    /// Line on which the last decoded value ended.
    ///
    /// The decoder may have looked one byte past the value; a newline read
    /// that way does not count.
    fn value_end_line(&self) -> usize {
        let tally = self.tally.lock().unwrap_or_else(PoisonError::into_inner);
        let overshoot = tally.bytes > self.values.byte_offset() && tally.last == b'\n';
        tally.newlines + 1 - usize::from(overshoot)
    }
}

impl<R: Read> Iterator for JsonReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.values.next() {
            Some(Ok(value)) => {
                let line = self.value_end_line();
                let record = into_record(value, line);
                if record.is_ok() {
                    self.records += 1;
                }
                Some(record)
            }
            Some(Err(source)) => {
                self.done = true;
                if source.is_io() {
                    return Some(Err(SparkError::Io(io::Error::from(source))));
                }
                Some(Err(SparkError::Decode {
                    line: source.line(),
                    source,
                }))
            }
            None => {
                debug!(records = self.records, "json input exhausted");
                self.done = true;
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
