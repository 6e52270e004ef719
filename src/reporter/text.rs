//! Terminal table report generator.

use crate::config::Config;
use crate::error::Result;
use crate::locator::SourceSpan;
use crate::reporter::{Report, ReportGenerator};
use crate::types::{Entity, TableKind};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::fmt::Write as _;
use std::path::Path;

const MAX_CELL: usize = 48;

/// Table report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self { use_colors: config.output.colored }
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, report: &Report<'_>) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header(report.table));
        output.push('\n');

        if report.rows.is_empty() {
            output.push_str("  No rows\n");
        } else {
            let mut table = Table::new();
            table
                .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(headers(report.table));
            for row in report.rows {
                table.add_row(self.cells(row));
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output.push_str(&self.format_footer(report));
        Ok(output)
    }
}

impl TextReporter {
    fn format_header(&self, table: TableKind) -> String {
        let title = format!("tfinspect {table}");
        if self.use_colors {
            format!("\n{}\n{}", title.bright_white().bold(), "=".repeat(80).bright_blue())
        } else {
            format!("\n{title}\n{}", "=".repeat(80))
        }
    }

    fn format_footer(&self, report: &Report<'_>) -> String {
        let summary = report.summary;
        let mut footer = format!(
            "\n  {} rows | {} files",
            report.rows.len(),
            summary.files_listed
        );

        if !summary.skipped.is_empty() {
            let skipped = format!("{} skipped entities", summary.skipped.len());
            let _ = write!(footer, " | {}", self.paint(&skipped, |s| s.yellow().to_string()));
        }
        if !summary.failed.is_empty() {
            let failed = format!("{} failed files", summary.failed.len());
            let _ = write!(footer, " | {}", self.paint(&failed, |s| s.red().bold().to_string()));
            for (path, error) in &summary.failed {
                let line = format!("    {}: {error}", path.display());
                let _ = write!(footer, "\n{}", self.paint(&line, |s| s.dimmed().to_string()));
            }
        }

        footer.push_str("\n\n");
        footer
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.use_colors {
            style(text)
        } else {
            text.to_string()
        }
    }

    fn cells(&self, row: &Entity) -> Vec<Cell> {
        let mut cells: Vec<Cell> = match row {
            Entity::Resource(r) => vec![
                Cell::new(truncate(&r.address, MAX_CELL)),
                self.colored_cell(&r.mode, if r.mode == "data" { Color::Blue } else { Color::Green }),
                Cell::new(&r.resource_type),
                Cell::new(optional(r.provider.as_deref())),
            ],
            Entity::DataSource(d) => vec![
                Cell::new(&d.data_source_type),
                Cell::new(&d.name),
                Cell::new(optional(d.count_src.as_deref())),
            ],
            Entity::Module(m) => vec![
                Cell::new(&m.name),
                Cell::new(truncate(m.module_source.as_deref().unwrap_or("-"), MAX_CELL)),
                self.version_cell(m.version.as_deref()),
            ],
            Entity::Output(o) => vec![
                Cell::new(&o.name),
                Cell::new(truncate(o.value.as_deref().unwrap_or("-"), MAX_CELL)),
                self.flag_cell(o.sensitive),
            ],
            Entity::Variable(v) => vec![
                Cell::new(&v.name),
                Cell::new(optional(v.variable_type.as_deref())),
                Cell::new(truncate(v.default_value.as_deref().unwrap_or("-"), MAX_CELL)),
                self.flag_cell(v.sensitive),
            ],
            Entity::Provider(p) => vec![
                Cell::new(&p.name),
                Cell::new(optional(p.alias.as_deref())),
                self.version_cell(p.version.as_deref()),
            ],
            Entity::Local(l) => vec![Cell::new(&l.name), Cell::new(truncate(&l.value, MAX_CELL))],
        };

        cells.push(Cell::new(lines(row.span())));
        cells.push(Cell::new(contextual_path(row.path(), 3)));
        cells
    }

    fn colored_cell(&self, text: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }

    fn flag_cell(&self, flag: bool) -> Cell {
        if flag {
            self.colored_cell("yes", Color::Yellow)
        } else {
            Cell::new("no")
        }
    }

    fn version_cell(&self, version: Option<&str>) -> Cell {
        match version {
            Some(v) => self.colored_cell(v, Color::Green),
            None => Cell::new("-"),
        }
    }
}

fn headers(table: TableKind) -> Vec<&'static str> {
    let mut headers = match table {
        TableKind::Resource => vec!["Address", "Mode", "Type", "Provider"],
        TableKind::DataSource => vec!["Type", "Name", "Count"],
        TableKind::Module => vec!["Name", "Source", "Version"],
        TableKind::Output => vec!["Name", "Value", "Sensitive"],
        TableKind::Variable => vec!["Name", "Type", "Default", "Sensitive"],
        TableKind::Provider => vec!["Name", "Alias", "Version"],
        TableKind::Local => vec!["Name", "Value"],
    };
    headers.extend(["Lines", "File"]);
    headers
}

fn optional(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn lines(span: &SourceSpan) -> String {
    if span.is_found() {
        format!("{}-{}", span.start_line, span.end_line)
    } else {
        "-".to_string()
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Last `depth` components of a path.
/// Example: /home/me/infra/env/prod/main.tf -> env/prod/main.tf
fn contextual_path(path: &Path, depth: usize) -> String {
    let components: Vec<_> = path.components().collect();
    let start = components.len().saturating_sub(depth);
    components[start..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TfInspectError;
    use crate::reporter::tests::sample_rows;
    use crate::types::ListSummary;
    use std::path::PathBuf;

    fn plain() -> TextReporter {
        TextReporter { use_colors: false }
    }

    #[test]
    fn test_table_report() {
        let rows = sample_rows();
        let summary = ListSummary { files_listed: 2, rows_emitted: 2, ..ListSummary::default() };
        let report = Report { table: TableKind::Variable, rows: &rows, summary: &summary };

        let text = plain().generate(&report).unwrap();

        assert!(text.contains("tfinspect variable"));
        assert!(text.contains("Default"));
        assert!(text.contains("us-east-1"));
        assert!(text.contains("1-4"));
        assert!(text.contains("2 rows | 2 files"));
    }

    #[test]
    fn test_footer_lists_failed_files() {
        let summary = ListSummary {
            failed: vec![(
                PathBuf::from("broken.tf"),
                TfInspectError::internal("boom".to_string(), file!(), line!()),
            )],
            ..ListSummary::default()
        };
        let report = Report { table: TableKind::Resource, rows: &[], summary: &summary };

        let text = plain().generate(&report).unwrap();

        assert!(text.contains("No rows"));
        assert!(text.contains("1 failed files"));
        assert!(text.contains("broken.tf"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_contextual_path() {
        assert_eq!(contextual_path(Path::new("/a/b/env/prod/main.tf"), 3), "env/prod/main.tf");
        assert_eq!(contextual_path(Path::new("main.tf"), 3), "main.tf");
    }
}
