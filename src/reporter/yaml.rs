//! YAML report generator.

use crate::error::Result;
use crate::reporter::{Report, ReportGenerator};

/// YAML report generator.
pub struct YamlReporter;

impl ReportGenerator for YamlReporter {
    fn generate(&self, report: &Report<'_>) -> Result<String> {
        Ok(serde_yaml::to_string(report.rows)?)
    }
}
