//! Configuration error types.
//!
//! This module contains the error type returned while building client
//! configuration and resource class descriptors.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use rest_resource::{BaseUrl, ConfigError};
//!
//! let result = BaseUrl::new("");
//! assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring the client or declaring resources.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Please provide a URL with an http or https scheme (e.g., 'https://api.example.com').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Endpoint is invalid.
    #[error("Invalid endpoint '{endpoint}'. Expected a non-empty path such as '/users'.")]
    InvalidEndpoint {
        /// The invalid endpoint that was provided.
        endpoint: String,
    },

    /// A resource class name cannot be empty.
    #[error("Resource class name cannot be empty. The name is used as the cache namespace.")]
    EmptyClassName,

    /// Bearer token cannot be empty.
    #[error("Bearer token cannot be empty.")]
    EmptyBearerToken,

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
