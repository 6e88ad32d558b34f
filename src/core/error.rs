//! Error types for the dowser library.

use thiserror::Error;

/// Result type alias using dowser's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during bug localization.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bug-report dataset error (missing file, malformed record).
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Embedding table error (missing file, malformed line, bad dimension).
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Bug identifier not present in the dataset.
    #[error("Bug not found: {bug_id}")]
    BugNotFound { bug_id: u32 },

    /// Candidate file not present at the checked-out revision.
    #[error("File not found: {filename}")]
    FileNotFound { filename: String },

    /// Git operation error; carries the tool's diagnostic output.
    #[error("Git error: {0}")]
    Git(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dimensionality-reduction error.
    #[error("Projection error: {0}")]
    Projection(String),

    /// Invalid request argument (bad index, malformed body).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (worker pool, poisoned state).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Dataset(err.to_string())
    }
}

impl Error {
    /// Create a new dataset error.
    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset(message.into())
    }

    /// Create a new embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a new git error.
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git(message.into())
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new projection error.
    pub fn projection(message: impl Into<String>) -> Self {
        Self::Projection(message.into())
    }

    /// Create a new invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::embedding("dimension mismatch");
        assert_eq!(err.to_string(), "Embedding error: dimension mismatch");

        let err = Error::BugNotFound { bug_id: 4242 };
        assert_eq!(err.to_string(), "Bug not found: 4242");

        let err = Error::FileNotFound {
            filename: "Connector.java".to_string(),
        };
        assert_eq!(err.to_string(), "File not found: Connector.java");
    }

    #[test]
    fn test_git_error_carries_diagnostics() {
        let err = Error::git("checkout failed: pathspec 'deadbeef' did not match");
        match err {
            Error::Git(message) => assert!(message.contains("pathspec")),
            _ => panic!("Expected Git error"),
        }
    }
}
