//! Core data types used throughout tfinspect.
//!
//! This module defines:
//! - File classification ([`FileKind`], [`FileTarget`])
//! - The tables a listing can produce ([`TableKind`])
//! - One row type per table, and the [`Entity`] sum over them
//! - Output formats and listing summaries

use crate::document::{Document, Value};
use crate::error::TfInspectError;
use crate::locator::SourceSpan;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a file should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// Native configuration (`.tf` HCL or `.tf.json`)
    #[default]
    Configuration,
    /// `terraform show -json` plan export
    Plan,
    /// State export (`.tfstate`)
    State,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Plan => write!(f, "plan"),
            Self::State => write!(f, "state"),
        }
    }
}

/// A file to list, with the kind its caller flagged it as.
///
/// The flag is a hint: a configuration target whose content turns out to be a
/// plan export is still listed as a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileTarget {
    /// Path to the file
    pub path: PathBuf,
    /// Caller-supplied classification
    pub kind: FileKind,
}

impl FileTarget {
    /// Create a target flagged with `kind`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        Self { path: path.into(), kind }
    }

    /// Infer the flag from the file name (`.tfstate` marks state).
    #[must_use]
    pub fn infer(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = if path.to_string_lossy().ends_with(".tfstate") {
            FileKind::State
        } else {
            FileKind::Configuration
        };
        Self { path, kind }
    }
}

/// The tables a listing can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TableKind {
    /// Managed and data resources (config, plan and state)
    Resource,
    /// `data` blocks
    DataSource,
    /// `module` blocks
    Module,
    /// `output` blocks and state outputs
    Output,
    /// `variable` blocks
    Variable,
    /// `provider` blocks
    Provider,
    /// Entries of `locals` blocks
    Local,
}

impl TableKind {
    /// Every table, in display order.
    pub const ALL: [Self; 7] = [
        Self::Resource,
        Self::DataSource,
        Self::Module,
        Self::Output,
        Self::Variable,
        Self::Provider,
        Self::Local,
    ];

    /// Table name as used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::DataSource => "data_source",
            Self::Module => "module",
            Self::Output => "output",
            Self::Variable => "variable",
            Self::Provider => "provider",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for listed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array of rows
    #[default]
    Json,
    /// YAML sequence of rows
    Yaml,
    /// Terminal table
    Table,
}

/// A resource row: a config block, a plan entry, or one state instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// File the row came from
    pub path: PathBuf,
    /// `type.name`, `type.name[index]` or the plan-supplied address
    pub address: String,
    /// `managed` or `data`
    pub mode: String,
    /// Resource type (e.g. `aws_instance`)
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource name
    pub name: String,
    /// Instance key (state `index_key` or plan `index`)
    pub index: Option<Value>,
    /// Integer count when the literal is a number
    pub count: Option<i64>,
    /// Canonical `count` expression
    pub count_src: Option<String>,
    /// Canonical `for_each` expression
    pub for_each: Option<String>,
    /// Explicit dependencies
    pub depends_on: Vec<String>,
    /// Provider reference
    pub provider: Option<String>,
    /// `lifecycle` block contents
    pub lifecycle: Option<Document>,
    /// Pre-apply values (config arguments, plan values)
    pub arguments: Option<Document>,
    /// Post-apply values (state instance attributes)
    pub attributes: Option<Document>,
    /// Whichever of `arguments` or `attributes` is populated
    pub attributes_std: Option<Document>,
    /// Where the resource was declared
    #[serde(flatten)]
    pub span: SourceSpan,
}

/// A `data` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSource {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub data_source_type: String,
    pub name: String,
    pub count: Option<i64>,
    pub count_src: Option<String>,
    pub for_each: Option<String>,
    pub depends_on: Vec<String>,
    pub provider: Option<String>,
    pub lifecycle: Option<Document>,
    pub arguments: Document,
    #[serde(flatten)]
    pub span: SourceSpan,
}

/// A `module` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub path: PathBuf,
    pub name: String,
    pub module_source: Option<String>,
    pub version: Option<String>,
    pub count: Option<i64>,
    pub count_src: Option<String>,
    pub for_each: Option<String>,
    pub depends_on: Vec<String>,
    pub arguments: Document,
    #[serde(flatten)]
    pub span: SourceSpan,
}

/// An `output` block or a state output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    pub path: PathBuf,
    pub name: String,
    /// Canonical value expression
    pub value: Option<String>,
    pub description: Option<String>,
    pub sensitive: bool,
    pub depends_on: Vec<String>,
    #[serde(flatten)]
    pub span: SourceSpan,
}

/// A `variable` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub path: PathBuf,
    pub name: String,
    /// Type constraint with the `${...}` wrapper removed
    #[serde(rename = "type")]
    pub variable_type: Option<String>,
    /// Canonical default value
    pub default_value: Option<String>,
    pub description: Option<String>,
    pub sensitive: bool,
    pub nullable: Option<bool>,
    /// Raw `validation { ... }` blocks, blank-line separated
    pub validation: Option<String>,
    #[serde(flatten)]
    pub span: SourceSpan,
}

/// A `provider` block. Aliased blocks each produce a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provider {
    pub path: PathBuf,
    pub name: String,
    pub alias: Option<String>,
    pub version: Option<String>,
    pub arguments: Document,
    #[serde(flatten)]
    pub span: SourceSpan,
}

/// One entry of a `locals` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Local {
    pub path: PathBuf,
    pub name: String,
    /// Canonical value expression
    pub value: String,
    #[serde(flatten)]
    pub span: SourceSpan,
}

/// A normalized row of any table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Resource(Resource),
    DataSource(DataSource),
    Module(Module),
    Output(Output),
    Variable(Variable),
    Provider(Provider),
    Local(Local),
}

impl Entity {
    /// The table this row belongs to.
    #[must_use]
    pub const fn table(&self) -> TableKind {
        match self {
            Self::Resource(_) => TableKind::Resource,
            Self::DataSource(_) => TableKind::DataSource,
            Self::Module(_) => TableKind::Module,
            Self::Output(_) => TableKind::Output,
            Self::Variable(_) => TableKind::Variable,
            Self::Provider(_) => TableKind::Provider,
            Self::Local(_) => TableKind::Local,
        }
    }

    /// File the row came from.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Resource(r) => &r.path,
            Self::DataSource(d) => &d.path,
            Self::Module(m) => &m.path,
            Self::Output(o) => &o.path,
            Self::Variable(v) => &v.path,
            Self::Provider(p) => &p.path,
            Self::Local(l) => &l.path,
        }
    }

    /// Where the row was declared.
    #[must_use]
    pub const fn span(&self) -> &SourceSpan {
        match self {
            Self::Resource(r) => &r.span,
            Self::DataSource(d) => &d.span,
            Self::Module(m) => &m.span,
            Self::Output(o) => &o.span,
            Self::Variable(v) => &v.span,
            Self::Provider(p) => &p.span,
            Self::Local(l) => &l.span,
        }
    }

    /// Human-facing identifier: the address for resources, the name otherwise.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Resource(r) => r.address.clone(),
            Self::DataSource(d) => format!("data.{}.{}", d.data_source_type, d.name),
            Self::Module(m) => format!("module.{}", m.name),
            Self::Output(o) => o.name.clone(),
            Self::Variable(v) => format!("var.{}", v.name),
            Self::Provider(p) => p.alias.as_ref().map_or_else(|| p.name.clone(), |alias| format!("{}.{alias}", p.name)),
            Self::Local(l) => format!("local.{}", l.name),
        }
    }
}

/// Outcome of listing one table across a set of files.
#[derive(Debug, Default)]
pub struct ListSummary {
    /// Files that were listed without a file-level failure
    pub files_listed: usize,
    /// Rows pushed to the sink
    pub rows_emitted: usize,
    /// Entities skipped because of entity-level errors
    pub skipped: Vec<TfInspectError>,
    /// Files that failed as a whole
    pub failed: Vec<(PathBuf, TfInspectError)>,
}

impl ListSummary {
    /// True when every file listed and every entity built.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_target_infer() {
        assert_eq!(FileTarget::infer("prod/terraform.tfstate").kind, FileKind::State);
        assert_eq!(FileTarget::infer("main.tf").kind, FileKind::Configuration);
        assert_eq!(FileTarget::infer("plan.json").kind, FileKind::Configuration);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(TableKind::DataSource.to_string(), "data_source");
        assert_eq!(TableKind::ALL.len(), 7);
    }

    #[test]
    fn test_entity_serializes_flat_span() {
        let local = Entity::Local(Local {
            path: PathBuf::from("main.tf"),
            name: "env".to_string(),
            value: "\"prod\"".to_string(),
            span: SourceSpan::new(2, 2, "  env = \"prod\"".to_string()),
        });
        let json = serde_json::to_value(&local).unwrap();
        assert_eq!(json["start_line"], 2);
        assert_eq!(json["end_line"], 2);
        assert_eq!(json["name"], "env");
        assert_eq!(local.label(), "local.env");
        assert_eq!(local.table(), TableKind::Local);
    }
}
