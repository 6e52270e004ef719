//! JSON adapter for plan/state exports and `.tf.json` configuration.

use crate::document::{Document, Value};
use crate::error::{Result, TfInspectError};
use std::path::Path;

/// Parse JSON text into a [`Document`]. The top level must be an object.
///
/// # Errors
///
/// Returns a `Parse` error for invalid JSON or a non-object top level.
pub fn parse(path: &Path, content: &str) -> Result<Document> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| {
        TfInspectError::parse(
            path.to_path_buf(),
            e.to_string(),
            Some(e.line()),
            Some(e.column()),
            file!(),
            line!(),
        )
    })?;

    match Value::from(value) {
        Value::Mapping(document) => Ok(document),
        other => Err(crate::err!(Parse {
            file: path.to_path_buf(),
            message: format!("expected a JSON object at the top level, found {}", other.type_name()),
            line: Some(1),
            column: Some(1),
        })),
    }
}
