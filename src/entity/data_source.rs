//! `data` blocks.

use super::{blocks, Emitter, FileContext};
use crate::error::Result;
use crate::extract::{extract, DATA_SOURCE};
use crate::locator::{BlockKind, BlockRef};
use crate::types::{DataSource, Entity};

pub(super) fn list(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    for block in blocks(ctx.document, BlockKind::Data) {
        let (data_source_type, name) = (block.label(0), block.label(1));
        let entity = format!("data source 'data.{data_source_type}.{name}'");

        let built = extract(&block.sanitized(), DATA_SOURCE, &entity).map(|meta| {
            let target = BlockRef::new(BlockKind::Data, [data_source_type, name]).near_line(block.start_line());
            Entity::DataSource(DataSource {
                path: ctx.path.to_path_buf(),
                data_source_type: data_source_type.to_string(),
                name: name.to_string(),
                count: meta.count,
                count_src: meta.count_src,
                for_each: meta.for_each,
                depends_on: meta.depends_on,
                provider: meta.provider,
                lifecycle: meta.lifecycle,
                arguments: meta.arguments,
                span: ctx.locate(&target),
            })
        });
        emitter.emit(built)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::list_content;
    use crate::types::{FileKind, TableKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_source_rows() {
        let content = r#"
data "aws_ami" "ubuntu" {
  most_recent = true
  owners      = ["099720109477"]

  filter {
    name   = "name"
    values = ["ubuntu/images/*"]
  }
}

data "aws_caller_identity" "current" {
  count = var.enabled ? 1 : 0
}
"#;
        let (rows, listing) = list_content(TableKind::DataSource, "data.tf", content, FileKind::Configuration);

        assert!(listing.skipped.is_empty());
        assert_eq!(rows.len(), 2);
        let Entity::DataSource(ami) = &rows[0] else { panic!("expected a data source") };
        assert_eq!(ami.data_source_type, "aws_ami");
        assert_eq!(ami.arguments.get("most_recent"), Some(&crate::document::Value::Bool(true)));
        assert!(ami.arguments.mapping("filter").is_some());
        assert!(!ami.arguments.has_reserved_keys());
        assert_eq!((ami.span.start_line, ami.span.end_line), (2, 10));

        let Entity::DataSource(caller) = &rows[1] else { panic!("expected a data source") };
        assert_eq!(caller.count, None);
        assert!(caller.count_src.as_deref().is_some_and(|src| src.starts_with("\"${var.enabled")));
    }

    #[test]
    fn test_data_source_bad_provider_is_skipped() {
        let content = "data \"a\" \"b\" {\n  provider = [\"x\"]\n}\n";
        let (rows, listing) = list_content(TableKind::DataSource, "data.tf", content, FileKind::Configuration);
        assert!(rows.is_empty());
        assert_eq!(listing.skipped.len(), 1);
    }
}
