//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup, the run itself,
//! and the history export.

use std::path::PathBuf;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration or profile loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: populace_core::ConfigError,
    },

    /// The species cannot be simulated.
    #[error("species error: {source}")]
    Species {
        /// The underlying configuration error.
        #[from]
        source: populace_demography::ConfigurationError,
    },

    /// The history file could not be written.
    #[error("failed to write history to {path}: {source}")]
    HistoryIo {
        /// Destination path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The history could not be encoded.
    #[error("failed to encode history: {source}")]
    HistoryEncode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
