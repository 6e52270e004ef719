//! Source location of blocks.
//!
//! Every row carries the line range and raw text of the block it came from.
//! Native configuration keeps parser positions, so [`GrammarLocator`] reads
//! them from the syntax tree. Plan and state exports are plain JSON without
//! positions, so [`JsonExportLocator`] recovers them by scanning the text.
//!
//! A locator that cannot find a block returns `SourceNotFound`; builders turn
//! that into [`SourceSpan::not_found`].

mod grammar;
mod text_scan;

pub use grammar::GrammarLocator;
pub use text_scan::{ExportFormat, JsonExportLocator};

use crate::error::Result;
use serde::Serialize;
use std::ops::Range;

/// Line range (1-based, inclusive) and verbatim text of a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
    pub source: String,
}

impl SourceSpan {
    #[must_use]
    pub const fn new(start_line: usize, end_line: usize, source: String) -> Self {
        Self { start_line, end_line, source }
    }

    /// Zero lines and empty text.
    #[must_use]
    pub fn not_found() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.start_line > 0
    }
}

/// Top-level block types the locators recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Terraform,
    RequiredProviders,
    Provider,
    Variable,
    Locals,
    Output,
    Module,
    Resource,
    Data,
    Moved,
}

impl BlockKind {
    /// Block keyword as written in configuration.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Terraform => "terraform",
            Self::RequiredProviders => "required_providers",
            Self::Provider => "provider",
            Self::Variable => "variable",
            Self::Locals => "locals",
            Self::Output => "output",
            Self::Module => "module",
            Self::Resource => "resource",
            Self::Data => "data",
            Self::Moved => "moved",
        }
    }

    /// Number of labels a block of this kind carries.
    #[must_use]
    pub const fn label_count(self) -> usize {
        match self {
            Self::Terraform | Self::RequiredProviders | Self::Locals | Self::Moved => 0,
            Self::Provider | Self::Variable | Self::Output | Self::Module => 1,
            Self::Resource | Self::Data => 2,
        }
    }

    /// Case-insensitive lookup by keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        const ALL: [BlockKind; 10] = [
            BlockKind::Terraform,
            BlockKind::RequiredProviders,
            BlockKind::Provider,
            BlockKind::Variable,
            BlockKind::Locals,
            BlockKind::Output,
            BlockKind::Module,
            BlockKind::Resource,
            BlockKind::Data,
            BlockKind::Moved,
        ];
        ALL.into_iter().find(|kind| kind.keyword().eq_ignore_ascii_case(keyword))
    }
}

/// Designates one block (or one attribute of a `locals` block) within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRef {
    pub kind: BlockKind,
    pub labels: Vec<String>,
    /// Plan address, used to tell apart instances sharing a type and name
    pub address: Option<String>,
    /// Attribute inside the block whose span is wanted
    pub attribute: Option<String>,
    /// Line the block is known to start on, to pick between identical labels
    pub near_line: Option<usize>,
    /// Module path of a state resource (`module.vpc`), `None` for the root module
    pub module: Option<String>,
}

impl BlockRef {
    #[must_use]
    pub fn new<S: Into<String>>(kind: BlockKind, labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            kind,
            labels: labels.into_iter().map(Into::into).collect(),
            address: None,
            attribute: None,
            near_line: None,
            module: None,
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn in_module(mut self, module: Option<&str>) -> Self {
        self.module = module.filter(|m| !m.is_empty()).map(str::to_string);
        self
    }

    #[must_use]
    pub const fn near_line(mut self, line: Option<usize>) -> Self {
        self.near_line = line;
        self
    }
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(module) = &self.module {
            write!(f, "{module} ")?;
        }
        f.write_str(self.kind.keyword())?;
        for label in &self.labels {
            write!(f, " \"{label}\"")?;
        }
        if let Some(attribute) = &self.attribute {
            write!(f, " {attribute}")?;
        }
        if let Some(address) = &self.address {
            write!(f, " ({address})")?;
        }
        Ok(())
    }
}

/// Finds the span of a block within one file.
pub trait Locator: Send + Sync {
    /// Locate `block`.
    ///
    /// # Errors
    ///
    /// Returns `SourceNotFound` when the file has no such block.
    fn locate(&self, block: &BlockRef) -> Result<SourceSpan>;
}

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(content: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts }
    }

    /// Line containing the byte at `offset`. A newline belongs to the line it ends.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }

    /// Inclusive line range covered by a half-open byte range.
    #[must_use]
    pub fn line_range(&self, span: &Range<usize>) -> (usize, usize) {
        let start = self.line_of(span.start);
        let end = self.line_of(span.end.saturating_sub(1).max(span.start));
        (start, end)
    }
}

/// Lines `start..=end` (1-based) of `content`.
pub(crate) fn slice_lines(content: &str, start: usize, end: usize, terminator: LineTerminator) -> String {
    let lines = content
        .lines()
        .skip(start.saturating_sub(1))
        .take((end + 1).saturating_sub(start.max(1)));
    match terminator {
        LineTerminator::Joined => lines.collect::<Vec<_>>().join("\n"),
        LineTerminator::Each => lines.map(|line| format!("{line}\n")).collect(),
    }
}

/// How extracted source lines are glued together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineTerminator {
    /// `a\nb`
    Joined,
    /// `a\nb\n`
    Each,
}
