//! Error types for the bucketgate core.

use std::path::PathBuf;

/// Core error type for configuration and alias validation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// An alias failed validation.
    #[error("invalid alias {alias:?}: {reason}")]
    InvalidAlias {
        /// The offending alias.
        alias: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Two aliases overlap, so first-match routing would be ambiguous.
    #[error("alias {shorter:?} is a prefix of alias {longer:?}")]
    OverlappingAliases {
        /// The alias that is a prefix of the other.
        shorter: String,
        /// The alias it shadows.
        longer: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    ConfigFile {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`GatewayConfig`](crate::GatewayConfig).
    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for bucketgate core operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
