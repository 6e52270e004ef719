//! Configuration module for tfinspect.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`tfinspect.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tfinspect.yaml
//!
//! # Files to list, as glob patterns or directories
//! configuration_file_paths:
//!   - "*.tf"
//!   - "~/infra/**/*.tf"
//! plan_file_paths:
//!   - "plans/*.json"
//! state_file_paths:
//!   - "${STATE_DIR}/*.tfstate"  # Environment variable expansion
//!
//! # Scanning options
//! scan:
//!   exclude_patterns:
//!     - "**/.terraform/**"
//!   continue_on_error: true
//!   max_depth: 100
//!
//! # Output options
//! output:
//!   colored: true
//!   pretty: true
//! ```
//!
//! The legacy `paths` key is still read. When it is set it replaces
//! `configuration_file_paths`.

use crate::error::{ErrorCollector, Result, TfInspectError};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Default pattern for configuration files.
pub const DEFAULT_CONFIGURATION_PATTERN: &str = "*.tf";

static BRACED_VAR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex"));
static BARE_VAR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

/// Scanning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Patterns to exclude from discovery (glob patterns).
    pub exclude_patterns: Vec<String>,

    /// Keep listing other files when one fails to read or parse.
    pub continue_on_error: bool,

    /// Maximum depth when a path names a directory.
    pub max_depth: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: vec!["**/.terraform/**".to_string()],
            continue_on_error: false,
            max_depth: default_max_depth(),
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    pub colored: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { colored: true, pretty: true }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Legacy list of configuration file patterns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,

    /// Configuration file patterns (`.tf` and `.tf.json`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_file_paths: Option<Vec<String>>,

    /// Plan export patterns
    pub plan_file_paths: Vec<String>,

    /// State export patterns
    pub state_file_paths: Vec<String>,

    /// Scanning options
    pub scan: ScanOptions,

    /// Output options
    pub output: OutputOptions,
}

fn default_max_depth() -> usize {
    100
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        let config: Self = serde_yaml::from_str(&expanded).map_err(|e| {
            TfInspectError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!())
        })?;

        tracing::debug!(
            legacy_paths = config.paths.is_some(),
            plan_patterns = config.plan_file_paths.len(),
            state_patterns = config.state_file_paths.len(),
            continue_on_error = config.scan.continue_on_error,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Patterns for configuration files.
    ///
    /// Legacy `paths` wins over `configuration_file_paths` when both are set.
    /// With neither set, `*.tf` in the working directory is listed; an
    /// explicitly empty list selects no configuration files.
    #[must_use]
    pub fn configuration_patterns(&self) -> Vec<String> {
        match (&self.paths, &self.configuration_file_paths) {
            (Some(legacy), Some(_)) => {
                tracing::warn!("Both 'paths' and 'configuration_file_paths' are set; using 'paths'");
                legacy.clone()
            }
            (Some(legacy), None) => {
                tracing::debug!("Using legacy 'paths' for configuration files");
                legacy.clone()
            }
            (None, Some(patterns)) => patterns.clone(),
            (None, None) => vec![DEFAULT_CONFIGURATION_PATTERN.to_string()],
        }
    }

    /// Check values serde cannot check. Every problem is reported, not
    /// only the first one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValue` for an out-of-range value, `Glob` for an
    /// unparseable pattern, or `Multiple` when several are found.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ErrorCollector::new();

        if self.scan.max_depth == 0 {
            errors.add(crate::err!(ConfigValue {
                key: "scan.max_depth".to_string(),
                message: "must be at least 1".to_string(),
            }));
        }

        let sections = [
            ("configuration_file_paths", self.configuration_patterns()),
            ("plan_file_paths", self.plan_file_paths.clone()),
            ("state_file_paths", self.state_file_paths.clone()),
            ("scan.exclude_patterns", self.scan.exclude_patterns.clone()),
        ];
        for (key, patterns) in &sections {
            for pattern in patterns {
                if pattern.trim().is_empty() {
                    errors.add(crate::err!(ConfigValue {
                        key: (*key).to_string(),
                        message: "empty pattern".to_string(),
                    }));
                } else if let Err(e) = glob::Pattern::new(pattern) {
                    errors.add(crate::err!(Glob { pattern: pattern.clone(), message: e.to_string() }));
                }
            }
        }

        errors.into_result()
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# tfinspect configuration file

# Configuration files to list (.tf and .tf.json).
# Entries are glob patterns or directories; "~" expands to the home directory.
configuration_file_paths:
  - "*.tf"
  # - "~/infra/**/*.tf"

# Plan exports ("terraform show -json plan.out > plan.json")
plan_file_paths: []
  # - "plans/*.json"

# State exports
state_file_paths: []
  # - "${STATE_DIR}/*.tfstate"

# Legacy alias for configuration_file_paths. When set, it takes precedence.
# paths:
#   - "*.tf"

# Scanning options
scan:
  # Patterns to exclude from discovery (glob patterns)
  exclude_patterns:
    - "**/.terraform/**"

  # Keep listing other files when one fails to read or parse
  continue_on_error: false

  # Maximum depth when a path names a directory
  max_depth: 100

# Output options
output:
  # Use colored output in terminal
  colored: true

  # Pretty-print JSON output
  pretty: true
"#
        .to_string()
    }

    /// Merge CLI arguments into the configuration.
    ///
    /// Paths given on the command line replace every configured path list.
    pub fn merge_cli_args(&mut self, args: &crate::cli::ListArgs) {
        if !args.paths.is_empty() || !args.plan.is_empty() || !args.state.is_empty() {
            self.paths = None;
            self.configuration_file_paths = Some(args.paths.clone());
            self.plan_file_paths.clone_from(&args.plan);
            self.state_file_paths.clone_from(&args.state);
        }
        if !args.exclude_patterns.is_empty() {
            self.scan.exclude_patterns.extend(args.exclude_patterns.iter().cloned());
        }
        if args.continue_on_error {
            self.scan.continue_on_error = true;
        }
        if let Some(max_depth) = args.max_depth {
            self.scan.max_depth = max_depth;
        }
        if args.compact {
            self.output.pretty = false;
        }
        if args.no_color {
            self.output.colored = false;
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unknown variables are left as is.
fn expand_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
