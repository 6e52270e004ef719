//! `provider` blocks.
//!
//! Aliased configurations repeat the same provider name, so each block is
//! located by the line it was declared on.

use super::{blocks, Emitter, FileContext};
use crate::error::Result;
use crate::extract::{extract, PROVIDER_BLOCK};
use crate::locator::{BlockKind, BlockRef};
use crate::types::{Entity, Provider};

pub(super) fn list(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    for block in blocks(ctx.document, BlockKind::Provider) {
        let name = block.label(0);

        let built = extract(&block.sanitized(), PROVIDER_BLOCK, &format!("provider '{name}'")).map(|meta| {
            let target = BlockRef::new(BlockKind::Provider, [name]).near_line(block.start_line());
            Entity::Provider(Provider {
                path: ctx.path.to_path_buf(),
                name: name.to_string(),
                alias: meta.alias,
                version: meta.version,
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
    fn test_aliased_providers_get_their_own_span() {
        let content = r#"provider "aws" {
  region = "us-east-1"
}

provider "aws" {
  alias  = "west"
  region = "us-west-2"
}
"#;
        let (rows, _) = list_content(TableKind::Provider, "providers.tf", content, FileKind::Configuration);

        let spans: Vec<_> = rows.iter().map(|r| (r.label(), r.span().start_line, r.span().end_line)).collect();
        assert_eq!(
            spans,
            vec![("aws".to_string(), 1, 3), ("aws.west".to_string(), 5, 8)]
        );
        let Entity::Provider(west) = &rows[1] else { panic!("expected a provider") };
        assert_eq!(west.arguments.string("region"), Some("us-west-2"));
        assert!(west.arguments.get("alias").is_none());
    }
}
