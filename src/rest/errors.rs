//! Error types for resource operations.
//!
//! # Error Handling
//!
//! - [`ResourceError::ImproperlyConfigured`]: a dotted path walked through a
//!   missing or non-container value, a relation points at an unknown class,
//!   or an id cannot be extracted from a related value
//! - [`ResourceError::RelatedNotResolved`]: a synchronous read went through a
//!   relation that has not been resolved yet
//! - [`ResourceError::InvalidResponse`]: the server answered with a body the
//!   resource layer cannot materialize
//! - [`ResourceError::Http`]: a transport failure, including non-2xx statuses
//!
//! Reading a missing leaf attribute is never an error; it yields `Ok(None)`.
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resource::ResourceError;
//!
//! match users.detail(&client, "42", Default::default()).await {
//!     Ok(user) => println!("Found: {:?}", user.get_value("name")?),
//!     Err(e) if e.is_not_found() => println!("no such user"),
//!     Err(e) => {
//!         for (field, messages) in e.field_errors() {
//!             println!("{field}: {messages:?}");
//!         }
//!     }
//! }
//! ```

use std::collections::HashMap;

use crate::clients::HttpError;
use crate::error::ConfigError;
use thiserror::Error;

/// Error type for resource operations.
///
/// `ResourceError` is `Clone` so a single failed request can be handed to
/// every caller that was waiting on it.
///
/// # Example
///
/// ```rust
/// use rest_resource::ResourceError;
///
/// let error = ResourceError::RelatedNotResolved {
///     resource: "Todo".to_string(),
///     field: "user".to_string(),
/// };
/// assert!(error.to_string().contains("user"));
/// assert!(!error.is_improperly_configured());
/// ```
#[derive(Debug, Error, Clone)]
pub enum ResourceError {
    /// The resource model or the accessed path is not usable as requested.
    #[error("Improperly configured: {message}")]
    ImproperlyConfigured {
        /// What went wrong.
        message: String,
    },

    /// A synchronous read went through an unresolved relation.
    #[error("{resource}.{field} is not resolved; resolve the relation before reading through it")]
    RelatedNotResolved {
        /// The class name of the resource owning the relation.
        resource: String,
        /// The related field.
        field: String,
    },

    /// The server response could not be materialized into resources.
    #[error("Invalid response for {resource}: {message}")]
    InvalidResponse {
        /// The class name of the resource being materialized.
        resource: String,
        /// What was wrong with the response.
        message: String,
    },

    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// A configuration value was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ResourceError {
    /// Shorthand for [`ResourceError::ImproperlyConfigured`].
    #[must_use]
    pub fn improperly_configured(message: impl Into<String>) -> Self {
        Self::ImproperlyConfigured {
            message: message.into(),
        }
    }

    /// Returns `true` for [`ResourceError::ImproperlyConfigured`].
    #[must_use]
    pub const fn is_improperly_configured(&self) -> bool {
        matches!(self, Self::ImproperlyConfigured { .. })
    }

    /// Returns the HTTP status code when the server answered with an error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Returns `true` when the server answered 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
    }

    /// Returns the request ID of a failed response, if available.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Http(HttpError::Response(e)) => e.error_reference.as_deref(),
            _ => None,
        }
    }

    /// Returns per-field validation messages from an error response body.
    ///
    /// Empty unless the server answered with a 4xx status.
    #[must_use]
    pub fn field_errors(&self) -> HashMap<String, Vec<String>> {
        match self {
            Self::Http(HttpError::Response(e)) if (400..500).contains(&e.code) => {
                parse_validation_errors(&e.body)
            }
            _ => HashMap::new(),
        }
    }
}

/// Parses validation errors from an API response body.
///
/// Accepted shapes:
/// ```json
/// {"errors": {"title": ["can't be blank"]}}
/// {"errors": ["Title can't be blank"]}
/// {"title": ["can't be blank"], "non_field_errors": ["..."]}
/// ```
/// Messages not tied to a field are reported under `"base"`.
fn parse_validation_errors(body: &serde_json::Value) -> HashMap<String, Vec<String>> {
    let mut result = HashMap::new();

    let messages_of = |value: &serde_json::Value| -> Vec<String> {
        match value {
            serde_json::Value::Array(arr) => arr
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect(),
            serde_json::Value::String(s) => vec![s.clone()],
            other => vec![other.to_string()],
        }
    };

    let fields = match body.get("errors") {
        Some(serde_json::Value::Object(map)) => Some(map),
        Some(other) => {
            let msgs = messages_of(other);
            if !msgs.is_empty() {
                result.insert("base".to_string(), msgs);
            }
            None
        }
        None => body.as_object(),
    };

    if let Some(map) = fields {
        for (field, messages) in map {
            let key = if field == "non_field_errors" || field == "detail" {
                "base".to_string()
            } else {
                field.clone()
            };
            let msgs = messages_of(messages);
            if !msgs.is_empty() {
                result.entry(key).or_insert_with(Vec::new).extend(msgs);
            }
        }
    }

    result
}

// Verify ResourceError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceError>();
};
