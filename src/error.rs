//! Error types for ace-check

use thiserror::Error;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not start '{command}': {source}")]
    AceNotFound {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Ace exited with code {code}: {stderr}")]
    AceFailed { code: i32, stderr: String },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 1    | General error                   |
    /// | 2    | Configuration / input error     |
    /// | 3    | Ace could not be started        |
    /// | 4    | Ace ran and reported a failure  |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::UnsupportedFormat(_) => 2,
            Self::AceNotFound { .. } => 3,
            Self::AceFailed { .. } => 4,
            Self::Io(_) => 10,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::Config("x".into()).exit_code(), 2);
        assert_eq!(AppError::UnsupportedFormat("azw3".into()).exit_code(), 2);
        assert_eq!(
            AppError::AceFailed {
                code: 1,
                stderr: String::new()
            }
            .exit_code(),
            4
        );
        assert_eq!(
            AppError::AceNotFound {
                command: "ace".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .exit_code(),
            3
        );
        assert_eq!(AppError::ResourceNotFound("a.xhtml".into()).exit_code(), 1);
    }

    #[test]
    fn test_ace_failed_message_carries_stderr() {
        let err = AppError::AceFailed {
            code: 1,
            stderr: "Unexpected EPUB structure".into(),
        };
        assert_eq!(
            err.to_string(),
            "Ace exited with code 1: Unexpected EPUB structure"
        );
    }
}
