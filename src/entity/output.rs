//! `output` blocks, and the outputs recorded in state.

use super::{blocks, Emitter, FileContext};
use crate::document::{Document, Value};
use crate::error::Result;
use crate::extract::{extract, OUTPUT};
use crate::locator::{BlockKind, BlockRef};
use crate::types::{Entity, Output};

pub(super) fn list_config(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    for block in blocks(ctx.document, BlockKind::Output) {
        let name = block.label(0);
        let target = BlockRef::new(BlockKind::Output, [name]).near_line(block.start_line());
        emitter.emit(build(ctx, name, &block.sanitized(), &target))?;
    }
    Ok(())
}

pub(super) fn list_state(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    let Some(outputs) = ctx.document.mapping("outputs") else {
        return Ok(());
    };
    for (name, value) in outputs {
        let built = match value {
            Value::Mapping(body) => build(ctx, name, body, &BlockRef::new(BlockKind::Output, [name.as_str()])),
            other => Err(crate::err!(TypeMismatch {
                entity: format!("output '{name}'"),
                argument: "outputs".to_string(),
                expected: "map".to_string(),
                found: other.type_name().to_string(),
            })),
        };
        emitter.emit(built)?;
    }
    Ok(())
}

fn build(ctx: &FileContext<'_>, name: &str, body: &Document, target: &BlockRef) -> Result<Entity> {
    let meta = extract(body, OUTPUT, &format!("output '{name}'"))?;
    Ok(Entity::Output(Output {
        path: ctx.path.to_path_buf(),
        name: name.to_string(),
        value: meta.value,
        description: meta.description,
        sensitive: meta.sensitive,
        depends_on: meta.depends_on,
        span: ctx.locate(target),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::list_content;
    use crate::types::{FileKind, TableKind};
    use pretty_assertions::assert_eq;

    fn outputs(file: &str, content: &str, kind: FileKind) -> Vec<Output> {
        list_content(TableKind::Output, file, content, kind)
            .0
            .into_iter()
            .map(|e| match e {
                Entity::Output(o) => o,
                other => panic!("unexpected row {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_config_outputs() {
        let content = r#"output "instance_id" {
  value       = aws_instance.web.id
  description = "Web instance"
}

output "password" {
  value     = random_password.db.result
  sensitive = true
}
"#;
        let rows = outputs("outputs.tf", content, FileKind::Configuration);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value.as_deref(), Some("\"${aws_instance.web.id}\""));
        assert_eq!(rows[0].description.as_deref(), Some("Web instance"));
        assert!(!rows[0].sensitive);
        assert_eq!((rows[0].span.start_line, rows[0].span.end_line), (1, 4));
        assert!(rows[1].sensitive);
        assert_eq!(rows[1].span.start_line, 6);
    }

    #[test]
    fn test_state_outputs() {
        let content = r#"{
  "version": 4,
  "outputs": {
    "id": {
      "value": "i-0abc",
      "type": "string"
    },
    "ports": {
      "value": [80, 443],
      "type": ["list", "number"],
      "sensitive": true
    }
  },
  "resources": []
}
"#;
        let rows = outputs("terraform.tfstate", content, FileKind::State);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "id");
        assert_eq!(rows[0].value.as_deref(), Some("\"i-0abc\""));
        assert_eq!((rows[0].span.start_line, rows[0].span.end_line), (4, 7));
        assert_eq!(rows[1].value.as_deref(), Some("[80,443]"));
        assert!(rows[1].sensitive);
        assert_eq!((rows[1].span.start_line, rows[1].span.end_line), (8, 12));
    }

    #[test]
    fn test_state_output_with_null_attribute() {
        let content = r#"{
  "version": 4,
  "outputs": {
    "endpoint": {
      "value": {"a": null, "b": 1},
      "type": ["object", {"a": "string", "b": "number"}]
    }
  },
  "resources": []
}
"#;
        let (rows, listing) = list_content(TableKind::Output, "terraform.tfstate", content, FileKind::State);

        assert!(listing.skipped.is_empty());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label(), "endpoint");
        match &rows[0] {
            Entity::Output(o) => assert_eq!(o.value.as_deref(), Some(r#"{"a":null,"b":1}"#)),
            other => panic!("unexpected row {other:?}"),
        }
    }

    #[test]
    fn test_plan_has_no_outputs_table() {
        let content = r#"{"format_version": "1.2", "resource_changes": [], "outputs": {"a": {"value": 1}}}"#;
        assert!(outputs("plan.json", content, FileKind::Plan).is_empty());
    }
}
