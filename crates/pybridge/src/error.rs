//! Error types for pybridge.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// Runtime bootstrap failed (unpack, build, or install step).
    #[error("bootstrap error: {0}")]
    Bootstrap(String),

    /// Download failed after exhausting retries.
    #[error("download failed for {url}: {message}")]
    Download { url: String, message: String },

    /// Interpreter-side dependency provisioning failed.
    #[error("dependency provisioning failed: {0}")]
    Provision(String),

    /// Malformed code template.
    #[error("template error: {0}")]
    Template(String),

    /// Template references an argument that was not supplied.
    #[error("placeholder $v{slot} out of range: {provided} argument(s) provided")]
    SlotOutOfRange { slot: usize, provided: usize },

    /// Argument or payload serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to spawn the interpreter process.
    #[error("failed to spawn interpreter at {path}: {message}")]
    Spawn { path: PathBuf, message: String },

    /// Interpreter exited with a non-zero status.
    #[error("interpreter exited with {status}: {stderr}")]
    Execution { status: ExitStatus, stderr: String },

    /// Callback channel error.
    #[error("callback channel error: {0}")]
    Callback(String),

    /// The interpreter exited but no result was posted before the deadline.
    #[error("no result received within {waited:?}")]
    ResultTimeout { waited: Duration },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
