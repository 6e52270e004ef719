//! Canonical string form of document values.
//!
//! Meta-arguments may hold a literal or an unresolved expression, so they are
//! stored as compact JSON text that callers can decode when they need the
//! structure back. Mapping keys come out sorted.
//!
//! `null` has no form of its own: a bare `null` or a `null` element of a
//! sequence is rejected, while a `null` anywhere inside a mapping is written
//! as JSON `null`.

use super::Value;
use crate::error::Result;

/// Render `value` as compact JSON text.
///
/// # Errors
///
/// Returns `UnsupportedValueType` for a `null` outside of any mapping.
pub fn canonicalize(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value, false)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value, in_mapping: bool) -> Result<()> {
    match value {
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&serde_json::to_string(s)?),
        Value::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item, in_mapping)?;
            }
            out.push(']');
        }
        Value::Mapping(doc) => {
            out.push('{');
            for (i, (key, item)) in doc.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_value(out, item, true)?;
            }
            out.push('}');
        }
        Value::Null if in_mapping => out.push_str("null"),
        Value::Null => {
            return Err(crate::err!(UnsupportedValueType {
                type_name: value.type_name().to_string(),
            }));
        }
    }
    Ok(())
}
