//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Backend Process Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Backend executable not found: {program}")]
    BackendNotFound { program: String },

    #[error("No backend command configured for platform '{platform}' (set `{key}`)")]
    NoBackendCommand { platform: String, key: String },

    #[error("Failed to spawn backend process: {reason}")]
    ProcessSpawn { reason: String },

    #[error("Backend process error: {message}")]
    Process { message: String },

    // ─────────────────────────────────────────────────────────────
    // Protocol Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid integer for '{field}': {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("Surface error: {message}")]
    Surface { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn backend_not_found(program: impl Into<String>) -> Self {
        Self::BackendNotFound {
            program: program.into(),
        }
    }

    pub fn process(message: impl Into<String>) -> Self {
        Self::Process {
            message: message.into(),
        }
    }

    pub fn invalid_number(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidNumber {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn surface(message: impl Into<String>) -> Self {
        Self::Surface {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors fail a single command; the router keeps running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidNumber { .. }
                | Error::Surface { .. }
                | Error::ChannelSend { .. }
                | Error::Process { .. }
        )
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::BackendNotFound { .. }
                | Error::NoBackendCommand { .. }
                | Error::ProcessSpawn { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions (for use with color-eyre)
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::backend_not_found("node");
        assert_eq!(err.to_string(), "Backend executable not found: node");

        let err = Error::invalid_number("width", "wide");
        assert_eq!(err.to_string(), "Invalid integer for 'width': \"wide\"");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::backend_not_found("node").is_fatal());
        assert!(Error::ProcessSpawn {
            reason: "denied".into()
        }
        .is_fatal());
        assert!(Error::NoBackendCommand {
            platform: "linux".into(),
            key: "linux_cmd".into(),
        }
        .is_fatal());
        assert!(!Error::invalid_number("height", "x").is_fatal());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::invalid_number("width", "").is_recoverable());
        assert!(Error::surface("webview gone").is_recoverable());
        assert!(Error::channel_send("closed").is_recoverable());
        assert!(!Error::backend_not_found("node").is_recoverable());
    }

    #[test]
    fn test_context_preserves_variant() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "nope",
        ));
        let err = res.context("reading config").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
