//! Error types for the bundling pipeline.

use std::time::Duration;

/// Bundling errors.
#[derive(Debug, thiserror::Error)]
pub enum PressError {
    /// The key was never registered, or its retention window has passed.
    #[error("unresolved key {key}: no file group is bound to it (keys are kept for {})", format_retention(.retention))]
    UnresolvedKey { key: String, retention: Duration },

    /// Reading a source, minifying it or writing the artifact failed.
    #[error("build failed for {target}: {message}")]
    Build { target: String, message: String },

    /// Static group list is missing or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Administrative operation invoked while disabled.
    #[error("permission denied: {operation} is disabled")]
    PermissionDenied { operation: String },

    /// Artifact storage could not be listed or cleaned.
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl PressError {
    pub(crate) fn build(target: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Build {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status the request boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            // Expired or unknown key
            Self::UnresolvedKey { .. } => 404,

            // Admin operations
            Self::PermissionDenied { .. } => 403,

            // Server side
            Self::Build { .. } => 500,
            Self::Config { .. } => 500,
            Self::Storage { .. } => 500,
        }
    }

    /// Whether repeating the request may succeed without operator action.
    ///
    /// Failed builds are never cached, so the next request rebuilds.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Build { .. } | Self::Storage { .. })
    }
}

pub(crate) fn format_retention(retention: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*retention)
}

/// Result type for bundling operations.
pub type PressResult<T> = Result<T, PressError>;
