//! Error handling for the cloud collector
//!
//! Invalid captures are not errors: they are retried and logged inside the
//! acquisition loop. Everything in this module is a fatal condition that
//! aborts the run before anything is persisted.

use thiserror::Error;

/// Main error type for the collector
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Environment operation failed: {operation} - {message}")]
    Environment { operation: String, message: String },

    #[error("Capture failed: {message}")]
    Capture { message: String },

    #[error("Service call failed: {service} - {message}")]
    Service { service: String, message: String },

    #[error("Network operation failed: {operation}")]
    Network {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Dataset error: {message}")]
    Dataset { message: String },

    #[error("Scene already occupied by '{occupant}', cannot spawn '{requested}'")]
    SceneBusy { occupant: String, requested: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },
}

/// Result alias used throughout the crate
pub type CollectorResult<T> = Result<T, CollectorError>;

impl CollectorError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an environment controller error
    pub fn environment(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Environment {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a capture adapter error
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }

    /// Create a remote service error
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn network(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            operation: operation.into(),
            source,
        }
    }

    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create a dataset invariant error
    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        CollectorError::io("io_operation", err)
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        CollectorError::serialization("json_operation", err)
    }
}

/// Convert from reqwest errors
impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        CollectorError::network("http_request", err)
    }
}

/// Convert from figment errors
impl From<figment::Error> for CollectorError {
    fn from(err: figment::Error) -> Self {
        CollectorError::config(err.to_string())
    }
}
