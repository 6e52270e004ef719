//! `variable` blocks, and the variables recorded in state.
//!
//! Plan files are not listed here: their `variables` map holds values
//! supplied for one run, not declarations.

use super::{blocks, Emitter, FileContext};
use crate::document::{Document, Value};
use crate::error::Result;
use crate::extract::{extract, VARIABLE};
use crate::locator::{BlockKind, BlockRef, SourceSpan};
use crate::types::{Entity, Variable};
use regex::Regex;
use std::sync::LazyLock;

static VALIDATION_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bvalidation\s*\{").expect("Invalid regex"));

pub(super) fn list_config(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    for block in blocks(ctx.document, BlockKind::Variable) {
        let name = block.label(0);
        let target = BlockRef::new(BlockKind::Variable, [name]).near_line(block.start_line());
        emitter.emit(build(ctx, name, &block.sanitized(), &target))?;
    }
    Ok(())
}

pub(super) fn list_state(ctx: &FileContext<'_>, emitter: &mut Emitter<'_>) -> Result<()> {
    let Some(variables) = ctx.document.mapping("variables") else {
        return Ok(());
    };
    for (name, value) in variables {
        let built = match value {
            Value::Mapping(body) => build(ctx, name, body, &BlockRef::new(BlockKind::Variable, [name.as_str()])),
            other => Err(crate::err!(TypeMismatch {
                entity: format!("variable '{name}'"),
                argument: "variables".to_string(),
                expected: "map".to_string(),
                found: other.type_name().to_string(),
            })),
        };
        emitter.emit(built)?;
    }
    Ok(())
}

fn build(ctx: &FileContext<'_>, name: &str, body: &Document, target: &BlockRef) -> Result<Entity> {
    let meta = extract(body, VARIABLE, &format!("variable '{name}'"))?;
    let span = ctx.locate(target);

    let validation = if body.contains_key("validation") {
        match validation_blocks(name, &span) {
            Ok(blocks) => Some(blocks),
            Err(e) => {
                tracing::debug!(path = %ctx.path.display(), variable = name, error = %e, "Validation not extracted");
                None
            }
        }
    } else {
        None
    };

    Ok(Entity::Variable(Variable {
        path: ctx.path.to_path_buf(),
        name: name.to_string(),
        variable_type: meta.variable_type,
        default_value: meta.default_value,
        description: meta.description,
        sensitive: meta.sensitive,
        nullable: meta.nullable,
        validation,
        span,
    }))
}

/// Raw `validation { ... }` blocks from a variable's source, blank-line separated.
///
/// # Errors
///
/// Returns `ValidationBlockNotFound` when the source holds no complete block.
pub(crate) fn validation_blocks(variable: &str, span: &SourceSpan) -> Result<String> {
    let source = span.source.as_str();
    let found: Vec<&str> = VALIDATION_BLOCK
        .find_iter(source)
        .filter_map(|m| closing_brace(source, m.end() - 1).map(|end| &source[m.start()..=end]))
        .collect();

    if found.is_empty() {
        return Err(crate::err!(ValidationBlockNotFound {
            variable: variable.to_string(),
        }));
    }
    Ok(found.join("\n\n"))
}

/// Byte offset of the brace closing the one at `open`, skipping quoted text.
fn closing_brace(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, byte) in source.bytes().enumerate().skip(open) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}
