//! # Error Handling
//!
//! Domain error type for the image optimizer, covering the failure taxonomy
//! the crate actually produces:
//!
//! - **Intake errors**: unreadable or non-image inputs, skipped per file
//! - **Conversion errors**: decode or encode failures, scoped to one item
//! - **Caption errors**: missing credential or a failed remote call
//! - **Archive errors**: zip serialization failures
//!
//! No error here is fatal to the process. The controller maps conversion
//! errors onto a single item's ERROR status, caption errors clear the
//! in-progress flag and surface a notice, and archive errors abort only the
//! archive operation. The `classify` helpers encode that scoping so callers
//! do not have to match on variants.

use std::{error::Error as StdError, fmt};

/// Base error type for optimizer operations.
#[derive(Debug)]
pub enum OptimizeError {
    /// Run configuration rejected before any work started.
    Config {
        field: String,
        value: String,
        reason: String,
    },
    /// A single input file could not be taken in.
    Intake { path: String, reason: String },
    /// Source bytes could not be decoded into a bitmap.
    Decode { name: String, reason: String },
    /// The decoded bitmap could not be re-encoded to the target format.
    Encode { format: String, reason: String },
    /// The caption endpoint call failed or returned an error status.
    Caption { reason: String },
    /// No caption credential is configured.
    Auth { variable: String },
    /// Building the downloadable archive failed.
    Archive { reason: String },
    /// Underlying I/O failure.
    Io {
        operation: String,
        source: std::io::Error,
    },
    /// HTTP transport failure.
    Http {
        operation: String,
        source: reqwest::Error,
    },
    /// Malformed JSON in a remote response.
    Json { source: serde_json::Error },
}

impl OptimizeError {
    /// Create a configuration error.
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an intake error for a single file.
    pub fn intake(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Intake {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an encode error.
    pub fn encode(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Create a caption error.
    pub fn caption(reason: impl Into<String>) -> Self {
        Self::Caption {
            reason: reason.into(),
        }
    }

    /// Create a missing-credential error.
    pub fn auth(variable: impl Into<String>) -> Self {
        Self::Auth {
            variable: variable.into(),
        }
    }

    /// Create an archive error.
    pub fn archive(reason: impl Into<String>) -> Self {
        Self::Archive {
            reason: reason.into(),
        }
    }

    /// Create an I/O error with the operation that produced it.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create an HTTP transport error with the operation that produced it.
    pub fn http(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            operation: operation.into(),
            source,
        }
    }

    /// Get the error category as a string.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Intake { .. } => "intake",
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::Caption { .. } => "caption",
            Self::Auth { .. } => "auth",
            Self::Archive { .. } => "archive",
            Self::Io { .. } => "io",
            Self::Http { .. } => "http",
            Self::Json { .. } => "json",
        }
    }
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizeError::Config {
                field,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            OptimizeError::Intake { path, reason } => {
                write!(f, "Could not take in '{}': {}", path, reason)
            }
            OptimizeError::Decode { name, reason } => {
                write!(f, "Failed to decode '{}': {}", name, reason)
            }
            OptimizeError::Encode { format, reason } => {
                write!(f, "Failed to encode to {}: {}", format, reason)
            }
            OptimizeError::Caption { reason } => {
                write!(f, "Caption request failed: {}", reason)
            }
            OptimizeError::Auth { variable } => {
                write!(f, "No caption credential configured (set {})", variable)
            }
            OptimizeError::Archive { reason } => {
                write!(f, "Archive build failed: {}", reason)
            }
            OptimizeError::Io { operation, source } => {
                write!(f, "I/O error during {}: {}", operation, source)
            }
            OptimizeError::Http { operation, source } => {
                write!(f, "HTTP error during {}: {}", operation, source)
            }
            OptimizeError::Json { source } => {
                write!(f, "Malformed response: {}", source)
            }
        }
    }
}

impl StdError for OptimizeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Http { source, .. } => Some(source),
            Self::Json { source } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias using the optimizer error type.
pub type OptimizeResult<T> = Result<T, OptimizeError>;

impl From<std::io::Error> for OptimizeError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<reqwest::Error> for OptimizeError {
    fn from(error: reqwest::Error) -> Self {
        Self::http("request", error)
    }
}

impl From<serde_json::Error> for OptimizeError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json { source: error }
    }
}

impl From<zip::result::ZipError> for OptimizeError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive {
            reason: error.to_string(),
        }
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error is scoped to a single tracked item. Item-scoped
    /// failures mark that item and leave every other item untouched.
    pub fn is_item_scoped(error: &OptimizeError) -> bool {
        matches!(
            error,
            OptimizeError::Intake { .. }
                | OptimizeError::Decode { .. }
                | OptimizeError::Encode { .. }
                | OptimizeError::Caption { .. }
                | OptimizeError::Auth { .. }
        )
    }

    /// Check if an error should abort the run before any work starts.
    pub fn is_fatal(error: &OptimizeError) -> bool {
        matches!(error, OptimizeError::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = OptimizeError::config("quality", "0", "must be in (0, 1]");
        assert_eq!(error.category(), "config");
        assert!(classify::is_fatal(&error));
    }

    #[test]
    fn test_item_scoping() {
        let decode = OptimizeError::decode("photo.bin", "unsupported format");
        assert!(classify::is_item_scoped(&decode));
        assert!(!classify::is_fatal(&decode));

        let archive = OptimizeError::archive("write failed");
        assert!(!classify::is_item_scoped(&archive));
    }

    #[test]
    fn test_display_carries_detail() {
        let error = OptimizeError::encode("avif", "encoder rejected dimensions");
        let message = error.to_string();
        assert!(message.contains("avif"));
        assert!(message.contains("encoder rejected dimensions"));
    }

    #[test]
    fn test_io_source_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = OptimizeError::io("read input", inner);
        assert!(error.source().is_some());
        assert_eq!(error.category(), "io");
    }
}
