use itertools::Itertools;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TalesError {
    #[error("TALES parse error in '{expression}': {message}")]
    Parse { expression: String, message: String },

    #[error("Cannot resolve '{segment}': {message}")]
    Traversal { segment: String, message: String },

    #[error("Name '{0}' is not defined")]
    RootNotFound(String),

    #[error(
        "All {count} alternate(s) of '{expression}' failed: [{details}]",
        count = .attempts.len(),
        details = .attempts.iter().join("; ")
    )]
    AllAlternatesFailed {
        expression: String,
        attempts: Vec<TalesError>,
    },

    #[error("Unknown namespace module '{0}'")]
    UnknownModule(String),

    #[error("Module '{module}' error: {message}")]
    Module { module: String, message: String },

    #[error("Host object error reading '{member}': {message}")]
    Host { member: String, message: String },

    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl TalesError {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, TalesError::Parse { .. })
    }

    /// Number of alternates tried, for an aggregate failure.
    pub fn attempt_count(&self) -> Option<usize> {
        match self {
            TalesError::AllAlternatesFailed { attempts, .. } => Some(attempts.len()),
            _ => None,
        }
    }
}
