//! JSON report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::{Report, ReportGenerator};

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self { pretty: config.output.pretty }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, report: &Report<'_>) -> Result<String> {
        let mut json = if self.pretty {
            serde_json::to_string_pretty(report.rows)?
        } else {
            serde_json::to_string(report.rows)?
        };
        json.push('\n');
        Ok(json)
    }
}
