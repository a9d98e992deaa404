//! Error types for cratedig
//!
//! Error strategy:
//! - Per-track errors (decode): recorded on the track's row, the batch continues
//! - Engine faults: never surfaced, folded into an "undetermined" field
//! - Cancellation: stops the batch, remaining tracks stay pending
//! - Persistence errors: surfaced from commit, earlier writes are kept

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC, AIFF, M4A, OGG";

// =============================================================================
// Track analysis
// =============================================================================

/// Why a single track analysis stopped without a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source audio could not be read or decoded
    DecodeFailed,
    /// Cancellation was observed at a checkpoint
    Cancelled,
    /// The decoder or engine panicked while handling the track
    Panicked,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::DecodeFailed => write!(f, "decode failed"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
            ErrorKind::Panicked => write!(f, "panicked"),
        }
    }
}

/// Failure of the track analyzer for one track
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Analysis of track '{track_id}' failed ({kind}): {reason}")]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub track_id: String,
    pub reason: String,
}

impl AnalysisError {
    pub fn cancelled(track_id: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            track_id: track_id.into(),
            reason: "analysis cancelled".to_string(),
        }
    }

    pub fn decode_failed(track_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::DecodeFailed,
            track_id: track_id.into(),
            reason: reason.into(),
        }
    }

    pub fn panicked(track_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Panicked,
            track_id: track_id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error means "stop the batch" rather than "row failed"
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

// =============================================================================
// Collaborator errors
// =============================================================================

/// Errors raised by an audio decoder
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}")]
    Failed { path: PathBuf, reason: String },

    #[error("Decoding of '{0}' was abandoned after cancellation")]
    Cancelled(PathBuf),
}

impl DecodeError {
    pub fn failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DecodeError::Failed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A fault inside the DSP engine (did not converge, rejected input, ...)
///
/// Never fails a track: the analyzer treats it as "feature undetermined".
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{engine} fault: {reason}")]
pub struct EngineFault {
    pub engine: &'static str,
    pub reason: String,
}

impl EngineFault {
    pub fn new(engine: &'static str, reason: impl Into<String>) -> Self {
        Self {
            engine,
            reason: reason.into(),
        }
    }
}

/// Failure reported by a persistence sink
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Cannot write library '{path}': {reason}\n  Tip: Check write permissions for the library file")]
    Write { path: PathBuf, reason: String },

    #[error("Library file '{path}' is not valid: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Persistence sink rejected track '{track_id}': {reason}")]
    Rejected { track_id: String, reason: String },
}

impl PersistError {
    /// Create a write error, translating common IO failures into actionable text
    pub fn write_error(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!(
                    "Directory does not exist: {}",
                    path.parent().map(|p| p.display().to_string()).unwrap_or_default()
                )
            }
            _ => err.to_string(),
        };
        PersistError::Write { path, reason }
    }
}

/// Commit stopped partway: `persisted` records were written before `source` failed
#[derive(Debug, Error)]
#[error("Commit failed after {persisted} track(s) were saved: {source}")]
pub struct CommitError {
    pub persisted: usize,
    #[source]
    pub source: PersistError,
}

// =============================================================================
// Application-level errors
// =============================================================================

/// Top-level error type for discovery, configuration and the binary
#[derive(Debug, Error)]
pub enum CratedigError {
    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    #[error("Unsupported audio format for '{path}': {format}\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("Invalid BPM range: {0}")]
    InvalidRange(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cratedig operations
pub type Result<T> = std::result::Result<T, CratedigError>;
