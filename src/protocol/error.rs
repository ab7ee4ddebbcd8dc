//! Worker channel and walk error types.

use std::path::PathBuf;

use thiserror::Error;

use super::RequestId;

// ============================================================================
// WorkerError
// ============================================================================

/// Errors on the worker channel.
///
/// Every variant is fatal: partial worker state cannot be recovered, so the
/// worker actor stops and the error surfaces to `main`.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("malformed worker message ({reason}): {line}")]
    MalformedMessage { line: String, reason: String },

    #[error("unknown response kind `{0}`")]
    UnknownResponseKind(String),

    #[error("worker process failed: {0}")]
    ProcessFailure(String),

    #[error("unsolicited response for request #{id}")]
    UnsolicitedResponse { id: RequestId },

    #[error("failed to spawn worker `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode request")]
    Encode(#[from] serde_json::Error),

    #[error("worker I/O error")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// DirectoryAccessError
// ============================================================================

/// Per-entry failure during a walk.
///
/// Never propagated: the entry is left out of the walk's results.
#[derive(Debug, Error)]
pub enum DirectoryAccessError {
    #[error("cannot list `{}`", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot stat `{}`", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
