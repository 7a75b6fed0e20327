//! Error types for ixgeo operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that halt the pipeline run they block
///
/// Unresolved attributions, provider failures and malformed lines are not
/// errors; they are absorbed by the stage that meets them and turned into
/// data (empty sets, `Source::None`, skip counters).
#[derive(Debug, Error)]
pub enum Error {
    /// A required capture or registry file is absent
    #[error("Missing input: {}", path.display())]
    MissingInput {
        /// Path that was expected to exist
        path: PathBuf,
    },

    /// Reading or writing a file failed
    #[error("IO error: {context}: {source}")]
    Io {
        /// Underlying IO error
        source: std::io::Error,
        /// What was being done when it failed
        context: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be deserialized
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON input or output failed
    #[error("JSON error: {context}: {source}")]
    Json {
        /// Underlying serde_json error
        source: serde_json::Error,
        /// What was being done when it failed
        context: String,
    },
}

impl Error {
    /// Wrap an IO error, turning `NotFound` into [`Error::MissingInput`]
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::MissingInput { path }
        } else {
            Error::Io {
                source,
                context: path.display().to_string(),
            }
        }
    }
}

/// Result type for ixgeo operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_becomes_missing_input() {
        let err = Error::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/data/capture.txt",
        );
        match err {
            Error::MissingInput { path } => assert_eq!(path, PathBuf::from("/data/capture.txt")),
            other => panic!("Expected MissingInput, got {other:?}"),
        }
    }

    #[test]
    fn test_other_io_errors_keep_context() {
        let err = Error::io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
            "/data/whois",
        );
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/data/whois"));
    }
}
