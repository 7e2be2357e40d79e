//! Error types for va-monitor.
//!
//! Caller-input and configuration errors abort a command. File-level
//! failures never reach this type during a scan: the aggregator turns them
//! into `ScanWarning`s and carries on.

use crate::extract::ExtractError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("project path is not a directory: {}", .0.display())]
    InvalidProjectPath(PathBuf),

    #[error("unsupported output format '{0}' (expected human or json)")]
    UnsupportedFormat(String),

    #[error("design system version '{requested}' is not in the catalog (available: {available})")]
    UnknownVersion { requested: String, available: String },

    #[error("invalid configuration in {}: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot extract components from {file}: {source}")]
    Extract {
        file: String,
        #[source]
        source: ExtractError,
    },

    #[error("component '{name}' not found in {file}")]
    ComponentNotFound { file: String, name: String },

    #[error("scan cancelled")]
    Cancelled,

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for the CLI: 1 for a failed lookup, 2 for
    /// caller-input and configuration problems.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ComponentNotFound { .. } => 1,
            Error::Cancelled => 130,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_file_and_component() {
        let e = Error::ComponentNotFound {
            file: "src/Form.tsx".into(),
            name: "va-button".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("src/Form.tsx"));
        assert!(msg.contains("va-button"));
        assert_eq!(e.exit_code(), 1);
    }

    #[test]
    fn test_caller_errors_exit_two() {
        assert_eq!(Error::UnsupportedFormat("html".into()).exit_code(), 2);
        assert_eq!(
            Error::InvalidProjectPath(PathBuf::from("/nope")).exit_code(),
            2
        );
    }
}
