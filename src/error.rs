//! Error types for tfinspect.
//!
//! This module defines the error hierarchy using `thiserror`. Every variant
//! records where in this crate it was raised (`src_path`/`src_line`) so a
//! failure in a large listing can be traced back quickly.
//!
//! # Error Categories
//!
//! - **File errors**: I/O failures, missing files, invalid globs
//! - **Parse errors**: the HCL/JSON parser rejected the bytes (fatal for that file)
//! - **Entity errors**: type mismatches and unsupported values (fatal for one entity)
//! - **Lookup misses**: source or validation blocks that could not be found (never fatal)
//! - **Config errors**: invalid configuration files
//!
//! # Example
//!
//! ```rust
//! use tfinspect::error::{TfInspectError, Result};
//!
//! fn read(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .map_err(|e| TfInspectError::io(path, e, file!(), line!()))
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(ConfigValue { key: "paths".to_string(), message: "empty".to_string() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident: $value:expr),* $(,)? }) => {
        $crate::error::TfInspectError::$variant {
            $($field: $value,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for tfinspect operations.
pub type Result<T> = std::result::Result<T, TfInspectError>;

/// The main error type for tfinspect.
#[derive(Error, Debug)]
pub enum TfInspectError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// File not found.
    #[error("File not found: {path} ({src_path}:{src_line})")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A configured path is not a valid glob pattern.
    #[error("Path is not a valid glob '{pattern}' ({src_path}:{src_line}): {message}")]
    Glob {
        /// The offending pattern
        pattern: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    /// The HCL or JSON parser rejected the file contents.
    #[error("Failed to parse '{file}' \n\t({src_path}:{src_line}): {message}")]
    Parse {
        /// The file being parsed
        file: PathBuf,
        /// Error message
        message: String,
        /// Line number (if available)
        line: Option<usize>,
        /// Column number (if available)
        column: Option<usize>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Entity Errors
    // =========================================================================
    /// A meta-argument had an unexpected shape.
    #[error("The '{argument}' argument for {entity} must be of type {expected}, found {found} ({src_path}:{src_line})")]
    TypeMismatch {
        /// The entity being built (e.g. "resource 'aws_instance.web'")
        entity: String,
        /// The offending argument
        argument: String,
        /// Expected shape
        expected: String,
        /// Shape actually found
        found: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// A value has no canonical string form.
    #[error("Failed to convert value due to unsupported type '{type_name}' ({src_path}:{src_line})")]
    UnsupportedValueType {
        /// Name of the concrete value type
        type_name: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Lookup Misses (non-fatal)
    // =========================================================================
    /// A locator could not find the requested block.
    #[error("Source for {block} not found in '{file}' ({src_path}:{src_line})")]
    SourceNotFound {
        /// The file that was searched
        file: PathBuf,
        /// The requested block
        block: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// No validation block could be extracted from a variable's source.
    #[error("No validation blocks found for variable '{variable}' ({src_path}:{src_line})")]
    ValidationBlockNotFound {
        /// The variable name
        variable: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}' ({src_path}:{src_line}): {message}")]
    ConfigValue {
        /// The configuration key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Multiple errors occurred.
    #[error("Multiple errors occurred ({count} total)")]
    Multiple {
        /// Number of errors
        count: usize,
        /// The individual errors
        errors: Vec<TfInspectError>,
    },
}

impl TfInspectError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error, src_path: &'static str, src_line: u32) -> Self {
        Self::Io { path: path.into(), source, src_path, src_line }
    }

    /// Creates a `Parse` error.
    #[must_use]
    pub fn parse(file: PathBuf, message: String, line: Option<usize>, column: Option<usize>, src_path: &'static str, src_line: u32) -> Self {
        Self::Parse { file, message, line, column, src_path, src_line }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, source: Option<Box<dyn std::error::Error + Send + Sync>>, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::Internal { message, src_path, src_line }
    }

    /// Returns true if the error only invalidates the entity being built.
    ///
    /// Listing continues with the next block or instance of the same file.
    #[must_use]
    pub const fn is_fatal_for_entity(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. } | Self::UnsupportedValueType { .. })
    }

    /// Returns true if the error is a lookup miss that degrades to an empty field.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound { .. } | Self::ValidationBlockNotFound { .. })
    }

    /// Determines if the error is recoverable (other files can still be listed).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Parse { .. }
            | Self::FileNotFound { .. }
            | Self::TypeMismatch { .. }
            | Self::UnsupportedValueType { .. }
            | Self::SourceNotFound { .. }
            | Self::ValidationBlockNotFound { .. } => true,
            Self::Io { source, .. } => source.kind() != std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }

    /// Returns the appropriate exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::FileNotFound { .. } => 14,
            Self::Parse { .. } => 15,
            Self::Glob { .. } => 16,
            Self::ConfigParse { .. } => 18,
            Self::ConfigValue { .. } => 19,
            Self::Multiple { .. } => 21,
            _ => 1,
        }
    }

    /// Consolidates multiple errors into a single `TfInspectError::Multiple` if there's more than one.
    /// Otherwise, returns the single error or `Ok(())` if no errors.
    pub fn collect(errors: Vec<Self>) -> Result<()> {
        let mut errors = errors;
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            count => Err(Self::Multiple { count, errors }),
        }
    }
}

/// Extension trait for `Result` to add context to errors.
pub trait ResultExt<T> {
    /// Adds a file path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            let path = path.into();
            if e.kind() == std::io::ErrorKind::NotFound {
                crate::err!(FileNotFound { path: path })
            } else {
                TfInspectError::io(path, e, file!(), line!())
            }
        })
    }
}

impl From<serde_json::Error> for TfInspectError {
    fn from(source: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization/deserialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}

impl From<serde_yaml::Error> for TfInspectError {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Internal {
            message: format!("YAML serialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}

/// A utility for collecting multiple errors during listing.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<TfInspectError>,
}

impl ErrorCollector {
    /// Create a new error collector.
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn add(&mut self, error: TfInspectError) {
        self.errors.push(error);
    }

    /// Take the collected errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<TfInspectError> {
        self.errors
    }

    /// Convert to a Result, returning Multiple error if there are any errors.
    pub fn into_result(self) -> Result<()> {
        TfInspectError::collect(self.errors)
    }
}
