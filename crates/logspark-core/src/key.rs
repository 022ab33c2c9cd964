//! Fuzzy key extraction.

use crate::value::field_value;
use crate::Record;

/// Build the classification key for `record` from the configured `fields`.
///
/// Each field value is stringified and split on single spaces. A field that
/// yields fewer tokens than `threshold` is appended twice, giving it double
/// weight in the total distance.
///
/// Splitting is on `' '` exactly, so runs of spaces produce empty tokens and
/// an empty value produces a single empty token.
pub fn extract_key(record: &Record, fields: &[String], threshold: usize) -> Vec<String> {
    let mut key = Vec::new();
    for field in fields {
        let text = field_value(record, field);
        let sub: Vec<&str> = text.split(' ').collect();

        if sub.len() < threshold {
            key.extend(sub.iter().map(|s| s.to_string()));
        }
        key.extend(sub.into_iter().map(str::to_string));
    }
    key
}
