//! Meta-argument extraction.
//!
//! Every entity kind has a table of the reserved arguments it understands,
//! each with the shape its value must have and the field it fills in
//! [`MetaArguments`]. [`extract`] walks a block body once: keys found in the
//! table are checked and stored, everything else lands in the arguments bag.
//!
//! A `null` value counts as unset. A value of the wrong shape aborts the
//! whole block with `TypeMismatch`.

use crate::document::{canonicalize, Document, Value, RESERVED_PREFIX};
use crate::error::Result;

/// Shape a meta-argument's value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A string scalar
    String,
    /// A sequence; each element is stringified
    List,
    /// A nested document
    Map,
    /// A boolean, or the strings `"true"`/`"false"`
    Bool,
    /// Anything; kept canonical, plus an integer when the literal is a number
    Count,
    /// Anything canonicalizable
    Canonical,
    /// A type constraint; the `${...}` wrapper is removed
    TypeExpr,
}

impl Shape {
    const fn expected(self) -> &'static str {
        match self {
            Self::String | Self::TypeExpr => "string",
            Self::List => "list",
            Self::Map => "map",
            Self::Bool => "bool",
            Self::Count => "number",
            Self::Canonical => "any",
        }
    }
}

/// A checked meta-argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Text(String),
    List(Vec<String>),
    Map(Document),
    Flag(bool),
    Count { src: String, count: Option<i64> },
}

impl Extracted {
    fn text(self) -> Option<String> {
        match self {
            Self::Text(s) | Self::Count { src: s, .. } => Some(s),
            _ => None,
        }
    }

    fn list(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            _ => Vec::new(),
        }
    }

    fn map(self) -> Option<Document> {
        match self {
            Self::Map(doc) => Some(doc),
            _ => None,
        }
    }

    const fn flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

/// One row of a meta-argument table.
#[derive(Clone, Copy)]
pub struct MetaArg {
    pub key: &'static str,
    pub shape: Shape,
    pub set: fn(&mut MetaArguments, Extracted),
}

impl std::fmt::Debug for MetaArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaArg").field("key", &self.key).field("shape", &self.shape).finish()
    }
}

/// Reserved arguments pulled out of a block, plus everything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaArguments {
    pub count: Option<i64>,
    pub count_src: Option<String>,
    pub for_each: Option<String>,
    pub depends_on: Vec<String>,
    pub provider: Option<String>,
    pub lifecycle: Option<Document>,
    pub alias: Option<String>,
    pub version: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub sensitive: bool,
    pub nullable: Option<bool>,
    pub value: Option<String>,
    pub default_value: Option<String>,
    pub variable_type: Option<String>,
    /// Keys not covered by the table
    pub arguments: Document,
}

const COUNT: MetaArg = MetaArg {
    key: "count",
    shape: Shape::Count,
    set: |m, v| {
        if let Extracted::Count { src, count } = v {
            m.count_src = Some(src);
            m.count = count;
        }
    },
};
const FOR_EACH: MetaArg = MetaArg { key: "for_each", shape: Shape::Canonical, set: |m, v| m.for_each = v.text() };
const DEPENDS_ON: MetaArg = MetaArg { key: "depends_on", shape: Shape::List, set: |m, v| m.depends_on = v.list() };
const PROVIDER: MetaArg = MetaArg { key: "provider", shape: Shape::String, set: |m, v| m.provider = v.text() };
const LIFECYCLE: MetaArg = MetaArg { key: "lifecycle", shape: Shape::Map, set: |m, v| m.lifecycle = v.map() };
const VERSION: MetaArg = MetaArg { key: "version", shape: Shape::String, set: |m, v| m.version = v.text() };
const DESCRIPTION: MetaArg = MetaArg { key: "description", shape: Shape::String, set: |m, v| m.description = v.text() };
const SENSITIVE: MetaArg = MetaArg {
    key: "sensitive",
    shape: Shape::Bool,
    set: |m, v| m.sensitive = v.flag().unwrap_or_default(),
};

/// `resource` blocks.
pub static RESOURCE: &[MetaArg] = &[COUNT, FOR_EACH, DEPENDS_ON, PROVIDER, LIFECYCLE];

/// `data` blocks.
pub static DATA_SOURCE: &[MetaArg] = &[COUNT, FOR_EACH, DEPENDS_ON, PROVIDER, LIFECYCLE];

/// `module` blocks.
pub static MODULE: &[MetaArg] = &[
    MetaArg { key: "source", shape: Shape::String, set: |m, v| m.source = v.text() },
    VERSION,
    COUNT,
    FOR_EACH,
    DEPENDS_ON,
];

/// `output` blocks and state outputs.
pub static OUTPUT: &[MetaArg] = &[
    MetaArg { key: "value", shape: Shape::Canonical, set: |m, v| m.value = v.text() },
    DESCRIPTION,
    SENSITIVE,
    DEPENDS_ON,
];

/// `variable` blocks and state variables. A state variable carries `value`
/// where a block carries `default`.
pub static VARIABLE: &[MetaArg] = &[
    MetaArg { key: "type", shape: Shape::TypeExpr, set: |m, v| m.variable_type = v.text() },
    MetaArg { key: "default", shape: Shape::Canonical, set: |m, v| m.default_value = v.text() },
    MetaArg { key: "value", shape: Shape::Canonical, set: |m, v| m.default_value = v.text() },
    DESCRIPTION,
    SENSITIVE,
    MetaArg { key: "nullable", shape: Shape::Bool, set: |m, v| m.nullable = v.flag() },
];

/// `provider` blocks.
pub static PROVIDER_BLOCK: &[MetaArg] = &[
    MetaArg { key: "alias", shape: Shape::String, set: |m, v| m.alias = v.text() },
    VERSION,
];

/// Resources of a state file, above their instances.
pub static STATE_RESOURCE: &[MetaArg] = &[PROVIDER];

/// Instances of a state resource.
pub static STATE_INSTANCE: &[MetaArg] = &[
    MetaArg { key: "dependencies", shape: Shape::List, set: |m, v| m.depends_on = v.list() },
];

/// Extract the arguments of `table` from `body`.
///
/// `entity` names the block in error messages, e.g. `resource 'aws_instance.web'`.
///
/// # Errors
///
/// Returns `TypeMismatch` when a meta-argument has the wrong shape and
/// `UnsupportedValueType` when a value has no canonical form.
pub fn extract(body: &Document, table: &[MetaArg], entity: &str) -> Result<MetaArguments> {
    extract_with(body, table, entity, true)
}

/// Like [`extract`], but leaves the arguments bag empty. Used where the
/// remaining keys are read separately (state instances, for one).
///
/// # Errors
///
/// Same as [`extract`].
pub fn extract_declared(body: &Document, table: &[MetaArg], entity: &str) -> Result<MetaArguments> {
    extract_with(body, table, entity, false)
}

fn extract_with(body: &Document, table: &[MetaArg], entity: &str, keep_rest: bool) -> Result<MetaArguments> {
    let mut meta = MetaArguments::default();

    for (key, value) in body {
        if key.starts_with(RESERVED_PREFIX) {
            continue;
        }
        match table.iter().find(|arg| arg.key == key.as_str()) {
            Some(_) if matches!(value, Value::Null) => {}
            Some(arg) => {
                let extracted = check(value, arg.shape).ok_or_else(|| {
                    crate::err!(TypeMismatch {
                        entity: entity.to_string(),
                        argument: key.clone(),
                        expected: arg.shape.expected().to_string(),
                        found: value.type_name().to_string(),
                    })
                })??;
                (arg.set)(&mut meta, extracted);
            }
            None if keep_rest => {
                meta.arguments.insert(key.clone(), value.clone());
            }
            None => {}
        }
    }

    Ok(meta)
}

/// `None` on a shape mismatch; `Some(Err)` when canonicalization fails.
fn check(value: &Value, shape: Shape) -> Option<Result<Extracted>> {
    let extracted = match (shape, value) {
        (Shape::String, Value::String(s)) => Extracted::Text(s.clone()),
        (Shape::TypeExpr, Value::String(s)) => Extracted::Text(strip_interpolation(s).to_string()),
        (Shape::List, Value::Sequence(items)) => {
            return Some(items.iter().map(stringify).collect::<Result<Vec<_>>>().map(Extracted::List));
        }
        (Shape::Map, Value::Mapping(doc)) => Extracted::Map(doc.clone().sanitized()),
        (Shape::Bool, Value::Bool(b)) => Extracted::Flag(*b),
        (Shape::Bool, Value::String(s)) => Extracted::Flag(s.parse().ok()?),
        (Shape::Count, value) => {
            let count = match value {
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            return Some(canonicalize(value).map(|src| Extracted::Count { src, count }));
        }
        (Shape::Canonical, value) => return Some(canonicalize(value).map(Extracted::Text)),
        _ => return None,
    };
    Some(Ok(extracted))
}

fn stringify(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => canonicalize(other),
    }
}

/// `${string}` becomes `string`; anything else is returned as is.
#[must_use]
pub fn strip_interpolation(s: &str) -> &str {
    s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TfInspectError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn doc(value: serde_json::Value) -> Document {
        match Value::from(value) {
            Value::Mapping(doc) => doc,
            other => panic!("expected mapping, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_extract_resource_meta_arguments() {
        let body = doc(json!({
            "ami": "ami-123",
            "count": 3,
            "depends_on": ["${aws_vpc.main}"],
            "provider": "${aws.west}",
            "lifecycle": {"prevent_destroy": true, "_tfi_lines": [4, 6]},
            "_tfi_lines": [1, 8]
        }));

        let meta = extract(&body, RESOURCE, "resource 'aws_instance.web'").unwrap();

        assert_eq!(meta.count, Some(3));
        assert_eq!(meta.count_src.as_deref(), Some("3"));
        assert_eq!(meta.depends_on, vec!["${aws_vpc.main}".to_string()]);
        assert_eq!(meta.provider.as_deref(), Some("${aws.west}"));
        assert_eq!(meta.lifecycle, Some(doc(json!({"prevent_destroy": true}))));
        assert_eq!(meta.arguments, doc(json!({"ami": "ami-123"})));
    }

    #[test_case(json!("${var.replicas}"), None, "\"${var.replicas}\"" ; "expression")]
    #[test_case(json!(2), Some(2), "2" ; "integer")]
    #[test_case(json!(2.5), None, "2.5" ; "fraction")]
    fn test_count_keeps_source_form(count: serde_json::Value, number: Option<i64>, src: &str) {
        let meta = extract(&doc(json!({ "count": count })), RESOURCE, "resource 'a.b'").unwrap();
        assert_eq!(meta.count, number);
        assert_eq!(meta.count_src.as_deref(), Some(src));
    }

    #[test]
    fn test_for_each_is_canonical() {
        let meta = extract(&doc(json!({"for_each": {"b": 2, "a": 1}})), RESOURCE, "resource 'a.b'").unwrap();
        assert_eq!(meta.for_each.as_deref(), Some(r#"{"a":1,"b":2}"#));
    }

    #[test_case(json!({"depends_on": {"a": 1}}), "depends_on", "list", "map" ; "depends_on map")]
    #[test_case(json!({"provider": ["aws"]}), "provider", "string", "list" ; "provider list")]
    #[test_case(json!({"lifecycle": "keep"}), "lifecycle", "map", "string" ; "lifecycle string")]
    fn test_type_mismatch(body: serde_json::Value, key: &str, want: &str, got: &str) {
        let err = extract(&doc(body), RESOURCE, "resource 'aws_instance.web'").unwrap_err();
        match err {
            TfInspectError::TypeMismatch { entity, argument, expected, found, .. } => {
                assert_eq!(entity, "resource 'aws_instance.web'");
                assert_eq!(argument, key);
                assert_eq!(expected, want);
                assert_eq!(found, got);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(extract(&doc(json!({})), RESOURCE, "x").is_ok());
    }

    #[test_case(json!(true), true ; "bool")]
    #[test_case(json!("true"), true ; "string true")]
    #[test_case(json!("false"), false ; "string false")]
    fn test_sensitive_coerces(value: serde_json::Value, want: bool) {
        let meta = extract(&doc(json!({ "sensitive": value })), OUTPUT, "output 'id'").unwrap();
        assert_eq!(meta.sensitive, want);
    }

    #[test]
    fn test_sensitive_rejects_other_strings() {
        let err = extract(&doc(json!({"sensitive": "yes"})), OUTPUT, "output 'id'").unwrap_err();
        assert!(err.is_fatal_for_entity());
    }

    #[test]
    fn test_null_is_unset() {
        let meta = extract(&doc(json!({"default": null, "type": "${string}"})), VARIABLE, "variable 'x'").unwrap();
        assert_eq!(meta.default_value, None);
        assert_eq!(meta.variable_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_nested_null_is_unsupported() {
        let err = extract(&doc(json!({"default": {"a": null}})), VARIABLE, "variable 'x'").unwrap_err();
        assert!(matches!(err, TfInspectError::UnsupportedValueType { .. }));
    }

    #[test]
    fn test_extract_declared_skips_rest() {
        let body = doc(json!({"dependencies": ["a.b"], "attributes": {"id": "x"}}));
        let meta = extract_declared(&body, STATE_INSTANCE, "resource 'a.b'").unwrap();
        assert_eq!(meta.depends_on, vec!["a.b"]);
        assert!(meta.arguments.is_empty());
    }

    #[test]
    fn test_provider_block_arguments() {
        let body = doc(json!({"alias": "west", "region": "us-west-2"}));
        let meta = extract(&body, PROVIDER_BLOCK, "provider 'aws'").unwrap();
        assert_eq!(meta.alias.as_deref(), Some("west"));
        assert_eq!(meta.arguments, doc(json!({"region": "us-west-2"})));
    }

    #[test_case("${list(string)}", "list(string)")]
    #[test_case("string", "string")]
    #[test_case("${string", "${string")]
    fn test_strip_interpolation(input: &str, want: &str) {
        assert_eq!(strip_interpolation(input), want);
    }
}
