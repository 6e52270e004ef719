//! Entity builders.
//!
//! One builder per table turns the blocks of a parsed file into normalized
//! rows. Builders follow the same steps:
//!
//! 1. Find the blocks of their kind in the [`Document`]
//! 2. Sanitize each block body
//! 3. Locate the block's source through the file's [`Locator`]
//! 4. Extract meta-arguments (see [`crate::extract`])
//!
//! Which tables a file can feed depends on its kind:
//!
//! | Table | Configuration | Plan | State |
//! |---|---|---|---|
//! | resource | yes | yes | yes |
//! | output | yes | – | yes |
//! | variable | yes | – | yes |
//! | data_source, module, provider, local | yes | – | – |
//!
//! # Example
//!
//! ```rust
//! use tfinspect::entity::{list, FileContext};
//! use tfinspect::parser::DocumentParser;
//! use tfinspect::types::{Entity, FileKind, TableKind};
//! use std::path::Path;
//!
//! let path = Path::new("variables.tf");
//! let content = "variable \"region\" {\n  default = \"us-east-1\"\n}\n";
//! let parsed = DocumentParser::new().parse(path, content, FileKind::Configuration).unwrap();
//!
//! let mut rows: Vec<Entity> = Vec::new();
//! list(TableKind::Variable, &FileContext::new(path, content, &parsed), &mut rows).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

mod data_source;
mod local;
mod module;
mod output;
mod provider;
mod resource;
mod variable;

pub use resource::state_address;

use crate::document::{Document, Value};
use crate::error::{ErrorCollector, Result, TfInspectError};
use crate::locator::{BlockKind, BlockRef, Locator, SourceSpan};
use crate::parser::ParsedFile;
use crate::types::{Entity, FileKind, TableKind};
use std::path::Path;

/// Receives rows as they are built.
pub trait RowSink {
    fn push(&mut self, entity: Entity);
}

impl RowSink for Vec<Entity> {
    fn push(&mut self, entity: Entity) {
        Vec::push(self, entity);
    }
}

/// Adapts a closure into a [`RowSink`].
pub struct SinkFn<F>(pub F);

impl<F: FnMut(Entity)> RowSink for SinkFn<F> {
    fn push(&mut self, entity: Entity) {
        (self.0)(entity);
    }
}

/// Everything a builder needs to know about one file.
pub struct FileContext<'a> {
    pub path: &'a Path,
    pub kind: FileKind,
    pub document: &'a Document,
    locator: Box<dyn Locator + 'a>,
}

impl<'a> FileContext<'a> {
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, parsed: &'a ParsedFile) -> Self {
        Self {
            path,
            kind: parsed.kind,
            document: &parsed.document,
            locator: parsed.locator(path, content),
        }
    }

    /// Span of `block`, or an empty span when it cannot be found.
    pub fn locate(&self, block: &BlockRef) -> SourceSpan {
        match self.locator.locate(block) {
            Ok(span) => span,
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %self.path.display(), block = %block, "Source not found");
                SourceSpan::not_found()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), block = %block, error = %e, "Source lookup failed");
                SourceSpan::not_found()
            }
        }
    }
}

/// Rows and entity-level failures of listing one table in one file.
#[derive(Debug, Default)]
pub struct Listing {
    pub rows: usize,
    pub skipped: Vec<TfInspectError>,
}

/// Pushes built rows to a sink and keeps entity-level failures aside.
struct Emitter<'s> {
    sink: &'s mut dyn RowSink,
    errors: ErrorCollector,
    rows: usize,
}

impl<'s> Emitter<'s> {
    fn new(sink: &'s mut dyn RowSink) -> Self {
        Self { sink, errors: ErrorCollector::new(), rows: 0 }
    }

    /// Push `built` if it succeeded. An entity-level failure is recorded and
    /// skipped; anything else stops the file.
    fn emit(&mut self, built: Result<Entity>) -> Result<()> {
        match built {
            Ok(entity) => {
                tracing::trace!(table = %entity.table(), entity = %entity.label(), "Emitting row");
                self.sink.push(entity);
                self.rows += 1;
                Ok(())
            }
            Err(e) if e.is_fatal_for_entity() => {
                tracing::warn!(error = %e, "Skipping entity");
                self.errors.add(e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn finish(self) -> Listing {
        Listing { rows: self.rows, skipped: self.errors.into_errors() }
    }
}

/// List `table` from one parsed file into `sink`.
///
/// # Errors
///
/// Returns an error only for failures that make the rest of the file
/// unusable. Entity-level failures are returned in [`Listing::skipped`].
pub fn list(table: TableKind, ctx: &FileContext<'_>, sink: &mut dyn RowSink) -> Result<Listing> {
    let mut emitter = Emitter::new(sink);

    match (table, ctx.kind) {
        (TableKind::Resource, FileKind::Configuration) => resource::list_config(ctx, &mut emitter)?,
        (TableKind::Resource, FileKind::Plan) => resource::list_plan(ctx, &mut emitter)?,
        (TableKind::Resource, FileKind::State) => resource::list_state(ctx, &mut emitter)?,
        (TableKind::DataSource, FileKind::Configuration) => data_source::list(ctx, &mut emitter)?,
        (TableKind::Module, FileKind::Configuration) => module::list(ctx, &mut emitter)?,
        (TableKind::Output, FileKind::Configuration) => output::list_config(ctx, &mut emitter)?,
        (TableKind::Output, FileKind::State) => output::list_state(ctx, &mut emitter)?,
        (TableKind::Variable, FileKind::Configuration) => variable::list_config(ctx, &mut emitter)?,
        (TableKind::Variable, FileKind::State) => variable::list_state(ctx, &mut emitter)?,
        (TableKind::Provider, FileKind::Configuration) => provider::list(ctx, &mut emitter)?,
        (TableKind::Local, FileKind::Configuration) => local::list(ctx, &mut emitter)?,
        (table, kind) => {
            tracing::debug!(path = %ctx.path.display(), %table, %kind, "Table not listed for this file kind");
        }
    }

    let listing = emitter.finish();
    tracing::debug!(
        path = %ctx.path.display(),
        %table,
        rows = listing.rows,
        skipped = listing.skipped.len(),
        "Listed file"
    );
    Ok(listing)
}

/// A block found in a configuration document.
pub(crate) struct Block<'d> {
    pub labels: Vec<&'d str>,
    pub body: &'d Document,
}

impl<'d> Block<'d> {
    pub fn label(&self, i: usize) -> &'d str {
        self.labels.get(i).copied().unwrap_or_default()
    }

    /// Line the block starts on, if the parser recorded it.
    pub fn start_line(&self) -> Option<usize> {
        self.body.declared_lines().map(|(start, _)| start)
    }

    /// Block body without internal metadata.
    pub fn sanitized(&self) -> Document {
        self.body.clone().sanitized()
    }
}

/// Blocks of `kind`, each with the labels its kind carries.
///
/// Handles both nested mappings (`resource.type.name`) and the sequence form
/// repeated blocks and `.tf.json` files use at any level.
pub(crate) fn blocks(document: &Document, kind: BlockKind) -> Vec<Block<'_>> {
    let mut found = Vec::new();
    if let Some(value) = document.get(kind.keyword()) {
        collect_blocks(value, kind.label_count(), &mut Vec::new(), &mut found);
    }
    found
}

fn collect_blocks<'d>(value: &'d Value, remaining: usize, labels: &mut Vec<&'d str>, found: &mut Vec<Block<'d>>) {
    match value {
        Value::Sequence(items) => {
            for item in items {
                collect_blocks(item, remaining, labels, found);
            }
        }
        Value::Mapping(body) if remaining == 0 => found.push(Block { labels: labels.clone(), body }),
        Value::Mapping(children) => {
            for (label, child) in children {
                if label.starts_with(crate::document::RESERVED_PREFIX) {
                    continue;
                }
                labels.push(label.as_str());
                collect_blocks(child, remaining - 1, labels, found);
                labels.pop();
            }
        }
        other => {
            tracing::debug!(found = other.type_name(), ?labels, "Ignoring non-block value");
        }
    }
}

/// A string field that must be present, e.g. a plan resource's `type`.
pub(crate) fn required_str<'d>(document: &'d Document, key: &str, entity: &str) -> Result<&'d str> {
    match document.get(key) {
        Some(Value::String(s)) => Ok(s),
        other => Err(crate::err!(TypeMismatch {
            entity: entity.to_string(),
            argument: key.to_string(),
            expected: "string".to_string(),
            found: other.map_or("null", Value::type_name).to_string(),
        })),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parser::DocumentParser;

    /// Parse `content` and list `table` from it.
    pub fn list_content(table: TableKind, file: &str, content: &str, kind: FileKind) -> (Vec<Entity>, Listing) {
        let path = Path::new(file);
        let parsed = DocumentParser::new().parse(path, content, kind).unwrap();
        let ctx = FileContext::new(path, content, &parsed);
        let mut rows = Vec::new();
        let listing = list(table, &ctx, &mut rows).unwrap();
        (rows, listing)
    }

    #[test]
    fn test_blocks_flattens_labels_and_duplicates() {
        let parsed = DocumentParser::new()
            .parse(
                Path::new("main.tf"),
                "provider \"aws\" {}\nprovider \"aws\" {\n  alias = \"b\"\n}\nprovider \"google\" {}\n",
                FileKind::Configuration,
            )
            .unwrap();

        let found = blocks(&parsed.document, BlockKind::Provider);
        let labels: Vec<_> = found.iter().map(|b| b.label(0)).collect();
        assert_eq!(labels, vec!["aws", "aws", "google"]);
        assert_eq!(found[1].start_line(), Some(2));
    }

    #[test]
    fn test_sink_fn_receives_rows() {
        let content = "locals {\n  a = 1\n  b = 2\n}\n";
        let path = Path::new("locals.tf");
        let parsed = DocumentParser::new().parse(path, content, FileKind::Configuration).unwrap();
        let ctx = FileContext::new(path, content, &parsed);

        let mut names = Vec::new();
        let listing = list(TableKind::Local, &ctx, &mut SinkFn(|e: Entity| names.push(e.label()))).unwrap();

        assert_eq!(listing.rows, 2);
        assert_eq!(names, vec!["local.a", "local.b"]);
    }

    #[test]
    fn test_table_absent_from_file_kind_lists_nothing() {
        let (rows, listing) = list_content(
            TableKind::Module,
            "terraform.tfstate",
            r#"{"version": 4, "resources": []}"#,
            FileKind::State,
        );
        assert!(rows.is_empty());
        assert_eq!(listing.rows, 0);
    }

    #[test]
    fn test_required_str_reports_missing_key() {
        let err = required_str(&Document::new(), "type", "resource 'x'").unwrap_err();
        assert!(err.to_string().contains("found null"));
    }
}
