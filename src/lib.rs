//! # tfinspect
//!
//! Typed rows from Terraform/OpenTofu configuration, plan and state files.
//!
//! tfinspect parses native configuration (`.tf`, `.tf.json`), plan exports
//! (`terraform show -json`) and state files into one generic [`document`]
//! tree, then lists it as normalized rows: resources, data sources, modules,
//! outputs, variables, providers and locals. Every row records the lines it
//! was declared on and their verbatim text.
//!
//! ## Features
//!
//! - **One schema per table** across file kinds: a resource row looks the same
//!   whether it came from a `.tf` block, a plan entry or a state instance
//! - **Source provenance** through the HCL grammar or a text scan of JSON exports
//! - **Canonical values**: expressions and values become stable JSON strings
//! - **Partial failure**: a malformed block is skipped, the rest of the file is listed
//! - **Multiple output formats**: JSON, YAML and terminal tables
//!
//! ## Example
//!
//! ```rust,no_run
//! use tfinspect::{Config, Inspector};
//! use tfinspect::types::{Entity, TableKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let inspector = Inspector::new(Config::default());
//!
//!     let mut rows: Vec<Entity> = Vec::new();
//!     let summary = inspector.list(TableKind::Resource, &mut rows).await?;
//!
//!     println!("{} resources from {} files", rows.len(), summary.files_listed);
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod cli;
pub mod config;
pub mod discovery;
pub mod document;
pub mod entity;
pub mod error;
pub mod extract;
pub mod locator;
pub mod parser;
pub mod reporter;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use entity::{Listing, RowSink, SinkFn};
pub use error::{Result, TfInspectError};
pub use types::{Entity, FileKind, FileTarget, ListSummary, OutputFormat, TableKind};

use crate::error::ResultExt;
use futures::future::join_all;
use rayon::prelude::*;

/// Main orchestrator: discovers files, lists them, and streams rows.
///
/// Files are read concurrently, listed in parallel, and their rows reach the
/// sink in target order.
///
/// # Example
///
/// ```rust
/// use tfinspect::{Config, Inspector};
/// use tfinspect::types::{Entity, FileKind, FileTarget, TableKind};
///
/// let inspector = Inspector::new(Config::default());
/// let target = FileTarget::new("vars.tf", FileKind::Configuration);
///
/// let mut rows: Vec<Entity> = Vec::new();
/// inspector
///     .list_content(TableKind::Variable, &target, "variable \"region\" {}\n", &mut rows)
///     .unwrap();
/// assert_eq!(rows[0].label(), "var.region");
/// ```
pub struct Inspector {
    config: Config,
    parser: parser::DocumentParser,
}

impl Inspector {
    /// Create a new inspector with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config, parser: parser::DocumentParser::new() }
    }

    /// Files the configuration names.
    ///
    /// # Errors
    ///
    /// Returns a `Glob` error if a configured pattern is invalid.
    pub fn targets(&self) -> Result<Vec<FileTarget>> {
        discovery::Discovery::new(&self.config)?.targets()
    }

    /// List `table` from every configured file.
    ///
    /// # Errors
    ///
    /// See [`Inspector::list_targets`].
    pub async fn list(&self, table: TableKind, sink: &mut dyn RowSink) -> Result<ListSummary> {
        let targets = self.targets()?;
        self.list_targets(table, &targets, sink).await
    }

    /// List `table` from `targets`.
    ///
    /// A file that cannot be read or parsed fails as a whole. With
    /// `scan.continue_on_error` the failure is recorded in the summary and
    /// the next file is listed; without it the first failure (in target
    /// order) is returned.
    ///
    /// # Errors
    ///
    /// Returns the first file-level error unless `continue_on_error` is set.
    pub async fn list_targets(
        &self,
        table: TableKind,
        targets: &[FileTarget],
        sink: &mut dyn RowSink,
    ) -> Result<ListSummary> {
        tracing::info!(%table, files = targets.len(), "Listing table");

        let reads = join_all(targets.iter().map(|target| async move {
            let content = tokio::fs::read_to_string(&target.path).await.with_path(&target.path);
            (target, content)
        }))
        .await;

        let outcomes: Vec<_> = reads
            .into_par_iter()
            .map(|(target, content)| {
                let outcome = content.and_then(|content| {
                    let mut rows = Vec::new();
                    self.list_content(table, target, &content, &mut rows).map(|listing| (rows, listing))
                });
                (target, outcome)
            })
            .collect();

        let mut summary = ListSummary::default();
        for (target, outcome) in outcomes {
            match outcome {
                Ok((rows, listing)) => {
                    for row in rows {
                        sink.push(row);
                    }
                    summary.files_listed += 1;
                    summary.rows_emitted += listing.rows;
                    summary.skipped.extend(listing.skipped);
                }
                Err(e) if self.config.scan.continue_on_error && e.is_recoverable() => {
                    tracing::warn!(path = %target.path.display(), error = %e, "Failed to list file, continuing");
                    summary.failed.push((target.path.clone(), e));
                }
                Err(e) => {
                    tracing::error!(path = %target.path.display(), error = %e, "Failed to list file");
                    return Err(e);
                }
            }
        }

        tracing::info!(
            %table,
            files = summary.files_listed,
            rows = summary.rows_emitted,
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "Listing complete"
        );
        Ok(summary)
    }

    /// List `table` from one file already in memory.
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error if the content cannot be parsed. Entity-level
    /// failures are returned in [`Listing::skipped`].
    pub fn list_content(
        &self,
        table: TableKind,
        target: &FileTarget,
        content: &str,
        sink: &mut dyn RowSink,
    ) -> Result<Listing> {
        let parsed = self.parser.parse(&target.path, content, target.kind)?;
        let ctx = entity::FileContext::new(&target.path, content, &parsed);
        entity::list(table, &ctx, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> FileTarget {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        FileTarget::infer(path)
    }

    #[tokio::test]
    async fn test_rows_follow_target_order() {
        let dir = TempDir::new().unwrap();
        let targets = vec![
            write(&dir, "b.tf", "variable \"b1\" {}\nvariable \"b2\" {}\n"),
            write(&dir, "a.tf", "variable \"a1\" {}\n"),
        ];

        let mut rows: Vec<Entity> = Vec::new();
        let summary = Inspector::new(Config::default())
            .list_targets(TableKind::Variable, &targets, &mut rows)
            .await
            .unwrap();

        let labels: Vec<_> = rows.iter().map(Entity::label).collect();
        assert_eq!(labels, vec!["var.b1", "var.b2", "var.a1"]);
        assert_eq!(summary.files_listed, 2);
        assert_eq!(summary.rows_emitted, 3);
        assert!(summary.is_clean());
    }

    #[tokio::test]
    async fn test_parse_failure_aborts_without_continue_on_error() {
        let dir = TempDir::new().unwrap();
        let targets = vec![
            write(&dir, "good.tf", "variable \"ok\" {}\n"),
            write(&dir, "bad.tf", "variable \"x\" {\n"),
        ];

        let mut rows: Vec<Entity> = Vec::new();
        let err = Inspector::new(Config::default())
            .list_targets(TableKind::Variable, &targets, &mut rows)
            .await
            .unwrap_err();

        assert!(matches!(err, TfInspectError::Parse { .. }));
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_parse_failure_is_collected_with_continue_on_error() {
        let dir = TempDir::new().unwrap();
        let targets = vec![
            write(&dir, "bad.tf", "variable \"x\" {\n"),
            write(&dir, "good.tf", "variable \"ok\" {}\n"),
        ];
        let mut config = Config::default();
        config.scan.continue_on_error = true;

        let mut rows: Vec<Entity> = Vec::new();
        let summary = Inspector::new(config)
            .list_targets(TableKind::Variable, &targets, &mut rows)
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].0.ends_with("bad.tf"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let targets = vec![FileTarget::new("/definitely/not/here.tf", FileKind::Configuration)];
        let mut config = Config::default();
        config.scan.continue_on_error = true;

        let mut rows: Vec<Entity> = Vec::new();
        let summary = Inspector::new(config)
            .list_targets(TableKind::Resource, &targets, &mut rows)
            .await
            .unwrap();

        assert!(matches!(summary.failed[0].1, TfInspectError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_uses_discovery() {
        let dir = TempDir::new().unwrap();
        write(&dir, "main.tf", "output \"id\" {\n  value = 1\n}\n");
        let config = Config {
            configuration_file_paths: Some(vec![dir.path().display().to_string()]),
            ..Config::default()
        };

        let mut rows: Vec<Entity> = Vec::new();
        let summary = Inspector::new(config).list(TableKind::Output, &mut rows).await.unwrap();

        assert_eq!(summary.files_listed, 1);
        assert_eq!(rows[0].label(), "id");
    }
}
