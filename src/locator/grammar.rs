//! Grammar-based locator for native configuration.

use super::{slice_lines, BlockKind, BlockRef, LineIndex, LineTerminator, Locator, SourceSpan};
use crate::error::Result;
use hcl::edit::structure::{Block, Body};
use hcl::edit::Span;
use std::path::Path;

/// Reads block positions from the HCL syntax tree.
///
/// Blocks match when their keyword and every label are equal ignoring ASCII
/// case, position by position. The first match wins unless the reference
/// carries a `near_line` that one of the matches starts on.
pub struct GrammarLocator<'a> {
    path: &'a Path,
    content: &'a str,
    body: &'a Body,
    index: LineIndex,
}

impl<'a> GrammarLocator<'a> {
    /// Create a locator over an already parsed body.
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, body: &'a Body) -> Self {
        Self { path, content, body, index: LineIndex::new(content) }
    }

    fn matches(&self, block: &Block, target: &BlockRef) -> bool {
        BlockKind::from_keyword(block.ident.as_str()) == Some(target.kind)
            && block.labels.len() == target.labels.len()
            && block
                .labels
                .iter()
                .zip(&target.labels)
                .all(|(label, wanted)| label.as_str().eq_ignore_ascii_case(wanted))
            && target
                .attribute
                .as_deref()
                .map_or(true, |key| block.body.has_attribute(key))
    }

    fn start_line(&self, block: &Block) -> Option<usize> {
        block.span().map(|range| self.index.line_of(range.start))
    }
}

impl Locator for GrammarLocator<'_> {
    fn locate(&self, target: &BlockRef) -> Result<SourceSpan> {
        let candidates: Vec<&Block> = self.body.blocks().filter(|b| self.matches(b, target)).collect();

        let chosen = target
            .near_line
            .and_then(|line| candidates.iter().find(|b| self.start_line(b) == Some(line)))
            .or_else(|| candidates.first());

        let range = chosen.and_then(|block| match &target.attribute {
            Some(key) => block.body.get_attribute(key).and_then(Span::span),
            None => block.span(),
        });

        let Some(range) = range else {
            return Err(crate::err!(SourceNotFound {
                file: self.path.to_path_buf(),
                block: target.to_string(),
            }));
        };

        let (start, end) = self.index.line_range(&range);
        tracing::trace!(file = %self.path.display(), block = %target, start, end, "Located block");
        Ok(SourceSpan::new(start, end, slice_lines(self.content, start, end, LineTerminator::Joined)))
    }
}
