//! Parsing of configuration, plan and state files into [`Document`]s.
//!
//! Two adapters produce the same generic tree:
//!
//! - [`hcl`]: native `.tf` configuration through `hcl-rs`, keeping the
//!   syntax tree for the grammar locator and recording block lines under the
//!   reserved `_tfi_lines` key
//! - [`json`]: plan/state exports and `.tf.json` configuration through `serde_json`
//!
//! # Example
//!
//! ```rust
//! use tfinspect::parser::DocumentParser;
//! use tfinspect::types::FileKind;
//! use std::path::Path;
//!
//! let parser = DocumentParser::new();
//! let parsed = parser
//!     .parse(Path::new("main.tf"), "variable \"region\" {}\n", FileKind::Configuration)
//!     .unwrap();
//! assert_eq!(parsed.kind, FileKind::Configuration);
//! ```

pub mod hcl;
pub mod json;

use crate::document::Document;
use crate::error::Result;
use crate::locator::{ExportFormat, GrammarLocator, JsonExportLocator, Locator};
use crate::types::FileKind;
use ::hcl::edit::structure::Body;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// File extensions treated as configuration.
pub const TERRAFORM_EXTENSIONS: &[&str] = &[".tf", ".tf.json"];

/// Directories skipped while walking.
pub const SKIP_DIRS: &[&str] = &[".terraform", ".terragrunt-cache", ".git"];

/// Surface syntax of a parsed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Hcl,
    Json,
}

/// A file turned into a [`Document`], with its final classification.
#[derive(Debug)]
pub struct ParsedFile {
    pub kind: FileKind,
    pub syntax: Syntax,
    pub document: Document,
    /// HCL syntax tree, kept for source location
    pub body: Option<Body>,
}

impl ParsedFile {
    /// Locator matching this file's format.
    #[must_use]
    pub fn locator<'a>(&'a self, path: &'a Path, content: &'a str) -> Box<dyn Locator + 'a> {
        match (&self.body, self.kind) {
            (Some(body), _) => Box::new(GrammarLocator::new(path, content, body)),
            (None, FileKind::Plan) => Box::new(JsonExportLocator::new(path, content, ExportFormat::Plan)),
            (None, FileKind::State) => Box::new(JsonExportLocator::new(path, content, ExportFormat::State)),
            (None, FileKind::Configuration) => {
                Box::new(JsonExportLocator::new(path, content, ExportFormat::Configuration))
            }
        }
    }
}

/// Parses file contents, one file at a time.
///
/// The parse step runs under a lock owned by the parser; classification,
/// sanitizing and everything downstream run outside it.
#[derive(Debug, Default)]
pub struct DocumentParser {
    lock: Mutex<()>,
}

impl DocumentParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `content` read from `path`. `hint` is the caller's classification.
    ///
    /// State is taken from the hint alone. Plan is taken from the hint or from
    /// the content (see [`is_terraform_plan`]). Everything else is configuration,
    /// JSON when the path ends in `.json` or the content opens with `{`.
    ///
    /// # Errors
    ///
    /// Returns a `Parse` error if the content is not valid for its syntax.
    pub fn parse(&self, path: &Path, content: &str, hint: FileKind) -> Result<ParsedFile> {
        let syntax = match hint {
            FileKind::Plan | FileKind::State => Syntax::Json,
            FileKind::Configuration if looks_like_json(path, content) => Syntax::Json,
            FileKind::Configuration => Syntax::Hcl,
        };

        let (document, body) = {
            let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            match syntax {
                Syntax::Hcl => hcl::parse(path, content).map(|(document, body)| (document, Some(body)))?,
                Syntax::Json => (json::parse(path, content)?, None),
            }
        };

        let kind = match hint {
            FileKind::State => FileKind::State,
            _ if syntax == Syntax::Json && is_terraform_plan(&document) => FileKind::Plan,
            other => other,
        };

        tracing::debug!(file = %path.display(), %kind, ?syntax, "Parsed file");
        Ok(ParsedFile { kind, syntax, document, body })
    }
}

/// A JSON document is a plan export iff it has both `resource_changes` and `format_version`.
#[must_use]
pub fn is_terraform_plan(document: &Document) -> bool {
    document.contains_key("resource_changes") && document.contains_key("format_version")
}

fn looks_like_json(path: &Path, content: &str) -> bool {
    path.to_string_lossy().ends_with(".json") || content.trim_start().starts_with('{')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_plan_by_content() {
        let parser = DocumentParser::new();
        let plan = r#"{"format_version": "1.2", "resource_changes": []}"#;
        let parsed = parser.parse(Path::new("plan.json"), plan, FileKind::Configuration).unwrap();
        assert_eq!(parsed.kind, FileKind::Plan);
        assert_eq!(parsed.syntax, Syntax::Json);
        assert!(parsed.body.is_none());
    }

    #[test]
    fn test_plan_needs_both_markers() {
        let parser = DocumentParser::new();
        let content = r#"{"format_version": "1.2"}"#;
        let parsed = parser.parse(Path::new("x.tf.json"), content, FileKind::Configuration).unwrap();
        assert_eq!(parsed.kind, FileKind::Configuration);
    }

    #[test]
    fn test_state_hint_wins() {
        let parser = DocumentParser::new();
        let content = r#"{"format_version": "1.2", "resource_changes": [], "resources": []}"#;
        let parsed = parser.parse(Path::new("terraform.tfstate"), content, FileKind::State).unwrap();
        assert_eq!(parsed.kind, FileKind::State);
    }

    #[test]
    fn test_hcl_keeps_body() {
        let parser = DocumentParser::new();
        let parsed = parser
            .parse(Path::new("main.tf"), "locals {\n  a = 1\n}\n", FileKind::Configuration)
            .unwrap();
        assert_eq!(parsed.syntax, Syntax::Hcl);
        assert!(parsed.body.is_some());
    }

    #[test]
    fn test_invalid_content_is_parse_error() {
        let parser = DocumentParser::new();
        let err = parser
            .parse(Path::new("main.tf"), "this is not valid { hcl", FileKind::Configuration)
            .unwrap_err();
        assert!(matches!(err, crate::error::TfInspectError::Parse { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_parser_is_shareable_across_threads() {
        let parser = std::sync::Arc::new(DocumentParser::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let parser = std::sync::Arc::clone(&parser);
                std::thread::spawn(move || {
                    let content = format!("variable \"v{i}\" {{}}\n");
                    parser.parse(Path::new("vars.tf"), &content, FileKind::Configuration).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().document.len(), 1);
        }
    }
}
