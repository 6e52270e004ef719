//! HCL adapter for native configuration.
//!
//! This module turns a `.tf` file into a [`Document`] using the `hcl-rs`
//! crate. Blocks nest under their keyword and then their labels, so
//! `resource "aws_instance" "web"` ends up at `resource.aws_instance.web`.
//! Repeated blocks at the same path become a sequence. Literal values are
//! kept as is; every other expression is kept as its source text wrapped in
//! `${...}`.

use crate::document::{Document, Value};
use crate::error::{Result, TfInspectError};
use crate::locator::LineIndex;

use hcl::edit::structure::{Block, Body, Structure};
use hcl::edit::Span;
use hcl::{Expression, ObjectKey, TemplateExpr};
use std::path::Path;

/// Parse `content` and return both the document and the syntax tree.
///
/// # Errors
///
/// Returns a `Parse` error carrying the position reported by the parser.
pub fn parse(path: &Path, content: &str) -> Result<(Document, Body)> {
    let body = hcl::edit::parser::parse_body(content).map_err(|e| {
        TfInspectError::parse(
            path.to_path_buf(),
            e.message().to_string(),
            Some(e.location().line()),
            Some(e.location().column()),
            file!(),
            line!(),
        )
    })?;

    let index = LineIndex::new(content);
    let document = body_to_document(&body, &index);
    tracing::trace!(file = %path.display(), keys = document.len(), "Converted HCL body");
    Ok((document, body))
}

/// Convert a body, recording the declared lines of every block.
#[must_use]
pub fn body_to_document(body: &Body, index: &LineIndex) -> Document {
    let mut document = Document::new();

    for structure in body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                let value = expression_to_value(&Expression::from(attr.value.clone()));
                document.insert(attr.key.as_str(), value);
            }
            Structure::Block(block) => insert_block(&mut document, block, index),
        }
    }

    document
}

fn insert_block(document: &mut Document, block: &Block, index: &LineIndex) {
    let mut inner = body_to_document(&block.body, index);
    if let Some(range) = block.span() {
        let (start, end) = index.line_range(&range);
        inner.set_declared_lines(start, end);
    }

    let mut path: Vec<&str> = vec![block.ident.as_str()];
    path.extend(block.labels.iter().map(|label| label.as_str()));
    insert_at(document, &path, Value::Mapping(inner));
}

/// Insert `value` under the nested `path`, merging with existing mappings.
/// A second value landing on the same leaf turns it into a sequence.
fn insert_at(document: &mut Document, path: &[&str], value: Value) {
    let Some((&key, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        let merged = match document.remove(key) {
            None => value,
            Some(Value::Sequence(mut items)) => {
                items.push(value);
                Value::Sequence(items)
            }
            Some(existing) => Value::Sequence(vec![existing, value]),
        };
        document.insert(key, merged);
        return;
    }

    let mut child = match document.remove(key) {
        Some(Value::Mapping(child)) => child,
        Some(other) => {
            // A label path crossing an attribute; keep the attribute, skip the block.
            tracing::debug!(key, "Block path collides with a non-block value");
            document.insert(key, other);
            return;
        }
        None => Document::new(),
    };
    insert_at(&mut child, rest, value);
    document.insert(key, child);
}

/// Convert an expression into a [`Value`].
#[must_use]
pub fn expression_to_value(expr: &Expression) -> Value {
    match expr {
        Expression::Null => Value::Null,
        Expression::Bool(b) => Value::Bool(*b),
        Expression::Number(n) => number_to_value(n),
        Expression::String(s) => Value::String(s.clone()),
        Expression::Array(items) => Value::Sequence(items.iter().map(expression_to_value).collect()),
        Expression::Object(object) => Value::Mapping(
            object
                .iter()
                .map(|(key, value)| (object_key_to_string(key), expression_to_value(value)))
                .collect(),
        ),
        Expression::TemplateExpr(template) => match &**template {
            TemplateExpr::QuotedString(s) => Value::String(s.clone()),
            TemplateExpr::Heredoc(heredoc) => Value::String(heredoc.template.clone()),
        },
        other => Value::String(format!("${{{other}}}")),
    }
}

fn number_to_value(n: &hcl::Number) -> Value {
    n.as_i64()
        .map(serde_json::Number::from)
        .or_else(|| n.as_u64().map(serde_json::Number::from))
        .or_else(|| n.as_f64().and_then(serde_json::Number::from_f64))
        .map_or(Value::Null, Value::Number)
}

fn object_key_to_string(key: &ObjectKey) -> String {
    match key {
        ObjectKey::Identifier(ident) => ident.as_str().to_string(),
        ObjectKey::Expression(Expression::String(s)) => s.clone(),
        ObjectKey::Expression(Expression::TemplateExpr(template)) => match &**template {
            TemplateExpr::QuotedString(s) => s.clone(),
            TemplateExpr::Heredoc(heredoc) => heredoc.template.clone(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::canonicalize;
    use pretty_assertions::assert_eq;

    fn convert(content: &str) -> Document {
        parse(Path::new("main.tf"), content).unwrap().0
    }

    #[test]
    fn test_parse_resource_nests_by_labels() {
        let doc = convert(
            r#"
resource "aws_instance" "web" {
  ami   = "ami-123"
  count = 2
}
"#,
        );

        let web = doc
            .mapping("resource")
            .and_then(|r| r.mapping("aws_instance"))
            .and_then(|t| t.mapping("web"))
            .unwrap();
        assert_eq!(web.string("ami"), Some("ami-123"));
        assert_eq!(web.get("count"), Some(&Value::from(2)));
        assert_eq!(web.declared_lines(), Some((2, 5)));
    }

    #[test]
    fn test_parse_references_keep_source_text() {
        let doc = convert(
            r#"
resource "aws_instance" "web" {
  subnet_id  = aws_subnet.main.id
  name       = "web-${var.env}"
  depends_on = [aws_vpc.main]
}
"#,
        );
        let web = doc.mapping("resource").unwrap().mapping("aws_instance").unwrap().mapping("web").unwrap();

        assert_eq!(web.string("subnet_id"), Some("${aws_subnet.main.id}"));
        assert_eq!(web.string("name"), Some("web-${var.env}"));
        assert_eq!(
            web.get("depends_on"),
            Some(&Value::Sequence(vec![Value::from("${aws_vpc.main}")]))
        );
    }

    #[test]
    fn test_parse_duplicate_blocks_become_sequence() {
        let doc = convert(
            r#"
provider "aws" {
  region = "us-east-1"
}

provider "aws" {
  alias  = "west"
  region = "us-west-2"
}
"#,
        );

        let providers = doc.mapping("provider").unwrap().get("aws").unwrap().as_sequence().unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[1].as_mapping().unwrap().declared_lines(), Some((6, 9)));
    }

    #[test]
    fn test_parse_nested_blocks() {
        let doc = convert(
            r#"
resource "aws_security_group" "sg" {
  ingress {
    from_port = 80
  }
  ingress {
    from_port = 443
  }
  lifecycle {
    prevent_destroy = true
  }
}
"#,
        );
        let sg = doc
            .mapping("resource")
            .unwrap()
            .mapping("aws_security_group")
            .unwrap()
            .mapping("sg")
            .unwrap();

        assert_eq!(sg.get("ingress").and_then(Value::as_sequence).map(<[Value]>::len), Some(2));
        assert_eq!(
            sg.mapping("lifecycle").and_then(|l| l.get("prevent_destroy")),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn test_parse_object_and_heredoc() {
        let doc = convert(
            r#"
locals {
  tags = {
    Name    = "web"
    "team"  = "core"
  }
  script = <<EOF
echo hi
EOF
}
"#,
        );
        let locals = doc.mapping("locals").unwrap();

        assert_eq!(
            canonicalize(locals.get("tags").unwrap()).unwrap(),
            r#"{"Name":"web","team":"core"}"#
        );
        assert!(locals.string("script").unwrap().starts_with("echo hi"));
    }

    #[test]
    fn test_parse_numbers() {
        let doc = convert("a = 1\nb = 1.5\nc = -3\n");
        assert_eq!(canonicalize(doc.get("a").unwrap()).unwrap(), "1");
        assert_eq!(canonicalize(doc.get("b").unwrap()).unwrap(), "1.5");
        assert_eq!(canonicalize(doc.get("c").unwrap()).unwrap(), "-3");
    }

    #[test]
    fn test_sanitize_removes_line_metadata() {
        let doc = convert("variable \"region\" {\n  default = \"eu\"\n}\n");
        assert!(doc.has_reserved_keys());
        assert!(!doc.sanitized().has_reserved_keys());
    }

    #[test]
    fn test_parse_invalid_hcl() {
        let err = parse(Path::new("bad.tf"), "resource \"a\" {\n  = broken\n").unwrap_err();
        match err {
            TfInspectError::Parse { file, line, .. } => {
                assert_eq!(file, Path::new("bad.tf"));
                assert!(line.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
