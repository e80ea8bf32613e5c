/// Error types for the synchronization workflows
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The backend answered with an unexpected status. Status and body are kept verbatim.
    #[error("{context}: {status} - {body}")]
    Backend {
        context: String,
        status: u16,
        body: String,
    },

    /// A translation build reached a terminal state other than `finished`
    #[error("Build failed with status: {0}")]
    BuildFailed(String),

    /// The AI call failed or its reply could not be understood.
    /// `raw` holds the reply text when there was one.
    #[error("Translation failed: {message}")]
    Translation { message: String, raw: Option<String> },

    /// Transport level failure (connection, TLS, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// A reconciliation engine runs at most once
    #[error("Reconciliation run already executed")]
    AlreadyRan,
}

impl SyncError {
    pub(crate) fn backend(context: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        SyncError::Backend {
            context: context.into(),
            status,
            body: body.into(),
        }
    }

    pub(crate) fn translation(message: impl Into<String>) -> Self {
        SyncError::Translation {
            message: message.into(),
            raw: None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures reported by the translation backend
    pub fn is_backend(&self) -> bool {
        matches!(self, SyncError::Backend { .. } | SyncError::BuildFailed(_))
    }

    /// True for failures of the AI translation stage
    pub fn is_translation(&self) -> bool {
        matches!(self, SyncError::Translation { .. })
    }

    /// The unparsed AI reply attached to a translation failure, if any
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            SyncError::Translation { raw, .. } => raw.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Network(err.to_string())
    }
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;
