use thiserror::Error;

/// Unified error type for the simulation engine
#[derive(Debug, Error)]
pub enum LifeError {
    /// Configuration errors (dimensions, worker count, intervals)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// The I/O collaborator handed back a seed stream of the wrong length
    #[error("Invalid seed: expected {expected} cells, received {actual}")]
    InvalidSeed { expected: usize, actual: usize },

    /// Failures reported by an I/O collaborator
    #[error("IO operation failed: {operation} - {message}")]
    Io {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A worker-pool channel closed while the dispatcher still depended on it
    #[error("Channel error: {channel} - {message}")]
    Channel { channel: String, message: String },

    /// Malformed image handed to the file collaborator
    #[error("Malformed PGM image: {message}")]
    Pgm { message: String },

    /// Serialization errors (config files, event payloads)
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LifeError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error naming the offending field
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a seed length error
    pub fn invalid_seed(expected: usize, actual: usize) -> Self {
        Self::InvalidSeed { expected, actual }
    }

    /// Create an IO error without an underlying source
    pub fn io<S: Into<String>, M: Into<String>>(operation: S, message: M) -> Self {
        Self::Io {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an IO error wrapping the collaborator's own error
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        operation: S,
        source: E,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a channel error
    pub fn channel<S: Into<String>, M: Into<String>>(channel: S, message: M) -> Self {
        Self::Channel {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create a PGM format error
    pub fn pgm<S: Into<String>>(message: S) -> Self {
        Self::Pgm {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::InvalidSeed { .. } => "seed",
            Self::Io { .. } => "io",
            Self::Channel { .. } => "channel",
            Self::Pgm { .. } => "pgm",
            Self::Serialization { .. } => "serialization",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, LifeError>;

impl From<std::io::Error> for LifeError {
    fn from(err: std::io::Error) -> Self {
        Self::io_with_source("io_operation", err)
    }
}

impl From<serde_json::Error> for LifeError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

impl From<serde_yaml::Error> for LifeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}
