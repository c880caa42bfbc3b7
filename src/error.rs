use std::fmt;
use std::path::PathBuf;

/// Errors raised at the edges of the crate: key parsing, config and item loading.
///
/// Filtering itself never fails; an empty view is a normal result.
#[derive(Debug)]
pub enum Error {
    /// Field path was empty or contained an empty segment
    InvalidFieldPath { path: String },
    /// IO operation failed
    Io { path: PathBuf, source: std::io::Error },
    /// Items file was not valid JSON
    Json { path: PathBuf, source: serde_json::Error },
    /// Items file parsed but was not a JSON array
    NotAnArray { path: PathBuf },
    /// Config file could not be parsed
    Config { path: PathBuf, source: toml::de::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFieldPath { path } => {
                write!(f, "Invalid field path '{path}': segments must be non-empty")
            }
            Error::Io { path, source } => {
                write!(f, "IO operation on '{}' failed: {source}", path.display())
            }
            Error::Json { path, source } => {
                write!(f, "Failed to parse JSON in '{}': {source}", path.display())
            }
            Error::NotAnArray { path } => {
                write!(f, "Expected a JSON array of records in '{}'", path.display())
            }
            Error::Config { path, source } => {
                write!(f, "Failed to parse config '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            Error::Json { source, .. } => Some(source),
            Error::Config { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for fallible crate operations
pub type Result<T> = std::result::Result<T, Error>;
