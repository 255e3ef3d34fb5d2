//! Error types for the simulation binary.
//!
//! [`SimError`] is the top-level error type that wraps all failure modes
//! during startup and scenario execution.

/// Top-level error for the simulation binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: quarry_core::config::ConfigError,
    },

    /// A coordinator operation failed.
    #[error("control error: {source}")]
    Control {
        /// The underlying control error.
        #[from]
        source: quarry_core::error::ControlError,
    },

    /// Serializing the run summary failed.
    #[error("summary error: {source}")]
    Summary {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
