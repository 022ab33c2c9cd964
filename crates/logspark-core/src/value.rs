//! Stringification of record values for keys and display columns.

use serde_json::Value;

use crate::Record;

/// Text used for a missing field or a JSON `null`.
pub const ABSENT: &str = "<nil>";

/// Render a field value the way it is shown in the table and tokenised for
/// the fuzzy key.
///
/// * strings are used verbatim (no surrounding quotes)
/// * numbers and booleans use their JSON text
/// * `null` and missing fields become [`ABSENT`]
/// * arrays and objects are rendered as compact JSON
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => ABSENT.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Shorthand for [`display_value`] on a named field of `record`.
pub fn field_value(record: &Record, field: &str) -> String {
    display_value(record.get(field))
}
