//! Entries of `locals` blocks. Each attribute is its own row, spanning only
//! its own lines.

use super::{blocks, Emitter, FileContext};
use crate::document::canonicalize;
use crate::error::Result;
use crate::locator::{BlockKind, BlockRef};
use crate::types::{Entity, Local};

pub(super) fn list(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    for block in blocks(ctx.document, BlockKind::Locals) {
        let start_line = block.start_line();
        for (name, value) in block.sanitized() {
            let built = canonicalize(&value).map(|value| {
                let target = BlockRef::new(BlockKind::Locals, Vec::<String>::new())
                    .with_attribute(&name)
                    .near_line(start_line);
                Entity::Local(Local {
                    path: ctx.path.to_path_buf(),
                    span: ctx.locate(&target),
                    name,
                    value,
                })
            });
            emitter.emit(built)?;
        }
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
    fn test_locals_from_several_blocks() {
        let content = r#"locals {
  env = "prod"
}

locals {
  tags = {
    Env  = local.env
    Team = "core"
  }
  replicas = 3
}
"#;
        let (rows, listing) = list_content(TableKind::Local, "locals.tf", content, FileKind::Configuration);
        assert!(listing.skipped.is_empty());

        let locals: Vec<_> = rows
            .iter()
            .map(|r| match r {
                Entity::Local(l) => (l.name.as_str(), l.value.as_str(), l.span.start_line, l.span.end_line),
                other => panic!("unexpected row {other:?}"),
            })
            .collect();
        assert_eq!(
            locals,
            vec![
                ("env", "\"prod\"", 2, 2),
                ("replicas", "3", 10, 10),
                ("tags", r#"{"Env":"${local.env}","Team":"core"}"#, 6, 9),
            ]
        );
    }

    #[test]
    fn test_null_local_is_skipped() {
        let content = "locals {\n  a = null\n  b = 1\n}\n";
        let (rows, listing) = list_content(TableKind::Local, "locals.tf", content, FileKind::Configuration);
        assert_eq!(rows.len(), 1);
        assert_eq!(listing.skipped.len(), 1);
    }
}
