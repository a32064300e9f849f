//! Error types for collection generation

use thiserror::Error;

/// Result type alias for collection generation operations
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Error types for downloading images and writing metadata
#[derive(Error, Debug)]
pub enum CollectionError {
    /// Input/output errors (permission denied, disk full, bad path, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure or non-success HTTP response
    #[error("Network error: {message}")]
    Network {
        /// Human readable description including the URL
        message: String,
        /// Underlying cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON or TOML (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// One or more items failed while the run was allowed to continue
    #[error("{} of {total} item(s) failed: indices {}", .failed.len(), format_indices(.failed))]
    Batch {
        /// Indices that could not be fetched
        failed: Vec<usize>,
        /// Number of items attempted
        total: usize,
    },
}

impl CollectionError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create network error with the failing request in the message
    pub fn network_error<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Network {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with the accepted values
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid: {})",
            parameter, value, valid_range
        ))
    }

    /// Whether this error came from the network layer
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<serde_json::Error> for CollectionError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for CollectionError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

fn format_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
