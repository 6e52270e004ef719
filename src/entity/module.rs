//! `module` blocks.

use super::{blocks, Emitter, FileContext};
use crate::error::Result;
use crate::extract::{extract, MODULE};
use crate::locator::{BlockKind, BlockRef};
use crate::types::{Entity, Module};

pub(super) fn list(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    for block in blocks(ctx.document, BlockKind::Module) {
        let name = block.label(0);

        let built = extract(&block.sanitized(), MODULE, &format!("module '{name}'")).map(|meta| {
            let target = BlockRef::new(BlockKind::Module, [name]).near_line(block.start_line());
            Entity::Module(Module {
                path: ctx.path.to_path_buf(),
                name: name.to_string(),
                module_source: meta.source,
                version: meta.version,
                count: meta.count,
                count_src: meta.count_src,
                for_each: meta.for_each,
                depends_on: meta.depends_on,
                arguments: meta.arguments,
                span: ctx.locate(&target),
            })
        });
        emitter.emit(built)?;
    }
    Ok(())
}
