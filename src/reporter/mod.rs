//! Rendering of listed rows.
//!
//! This module renders rows in multiple formats:
//! - JSON: an array of rows, one object per entity
//! - YAML: the same rows as a YAML sequence
//! - Table: a human-readable terminal table with a summary line
//!
//! # Example
//!
//! ```rust
//! use tfinspect::reporter::{Report, Reporter};
//! use tfinspect::types::{ListSummary, OutputFormat, TableKind};
//! use tfinspect::Config;
//!
//! let reporter = Reporter::new(&Config::default());
//! let summary = ListSummary::default();
//! let report = Report { table: TableKind::Variable, rows: &[], summary: &summary };
//! assert_eq!(reporter.generate(&report, OutputFormat::Json).unwrap().trim(), "[]");
//! ```

mod json;
mod text;
mod yaml;

use crate::config::Config;
use crate::error::Result;
use crate::types::{Entity, ListSummary, OutputFormat, TableKind};

pub use json::JsonReporter;
pub use text::TextReporter;
pub use yaml::YamlReporter;

/// Rows of one listing and how the listing went.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub table: TableKind,
    pub rows: &'a [Entity],
    pub summary: &'a ListSummary,
}

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self { config: config.clone() }
    }

    /// Render `report` in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn generate(&self, report: &Report<'_>, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => JsonReporter::new(&self.config).generate(report),
            OutputFormat::Yaml => YamlReporter.generate(report),
            OutputFormat::Table => TextReporter::new(&self.config).generate(report),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Render listed rows.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, report: &Report<'_>) -> Result<String>;
}
