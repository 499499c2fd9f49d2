//! Error types for the PayZen SDK.
//!
//! Every operation returns [`PayzenError`]. [`CallbackError`] is the only kind
//! that never leaves an operation: it is logged by the dispatcher and dropped.

use std::error::Error as StdError;

/// Boxed error used to carry transport-specific sources across crate boundaries.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Top-level error returned by [`Payment`](crate::Payment) operations.
#[derive(Debug, thiserror::Error)]
pub enum PayzenError {
    /// Credentials or endpoint could not be resolved. Raised before any I/O.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The MD redirect token could not be produced or parsed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The remote call could not be completed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Credentials, endpoint or configuration file problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// A required field has no value after merging defaults and overrides.
    #[error("missing required configuration field `{field}`")]
    MissingField {
        /// Name of the field, as spelled in per-call overrides.
        field: &'static str,
    },

    /// A field has a value that cannot be interpreted.
    #[error("invalid value {value:?} for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The endpoint is not a valid absolute URL.
    #[error("invalid endpoint {value:?}: {source}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        value: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The configuration file exists but could not be read.
    #[error("cannot read configuration file {path}: {source}")]
    Read {
        /// Path of the file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`SdkConfig`](crate::SdkConfig).
    #[error("cannot parse configuration file {path}: {source}")]
    Parse {
        /// Path of the file.
        path: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigurationError {
    pub(crate) fn invalid(
        field: &'static str,
        value: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
            reason,
        }
    }
}

/// Failures of the MD redirect token codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// One of the two parts already contains the delimiter or is empty.
    #[error("cannot encode {part} into redirect token: {reason}")]
    Encoding {
        /// Which part was rejected (`"session cookie"` or `"request id"`).
        part: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The token does not split into exactly two non-empty parts.
    #[error("malformed redirect token: {reason}")]
    MalformedToken {
        /// Why the token was rejected.
        reason: &'static str,
    },
}

/// The remote call could not be completed.
///
/// Never retried by the SDK; retry policy belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be built or sent.
    #[error("{operation}: request failed: {source}")]
    Request {
        /// Remote operation name.
        operation: &'static str,
        /// The underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The remote service answered with a non-success status.
    #[error("{operation}: unexpected status {status}: {body}")]
    Status {
        /// Remote operation name.
        operation: &'static str,
        /// Status code returned by the service.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The reply could not be decoded.
    #[error("{operation}: cannot decode reply: {source}")]
    Decode {
        /// Remote operation name.
        operation: &'static str,
        /// The underlying decode error.
        #[source]
        source: BoxError,
    },
}

impl TransportError {
    /// Returns the remote operation the error belongs to.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Request { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. } => operation,
        }
    }
}

/// A response callback failed.
///
/// Produced by [`ResponseCallback`](crate::ResponseCallback) implementations;
/// the dispatcher logs it and never propagates it.
#[derive(Debug, thiserror::Error)]
#[error("response callback failed: {source}")]
pub struct CallbackError {
    #[source]
    source: BoxError,
}

impl CallbackError {
    /// Wraps any error raised while handling a result.
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_operation() {
        let err = TransportError::Status {
            operation: "cancelPayment",
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(err.operation(), "cancelPayment");
        assert_eq!(err.to_string(), "cancelPayment: unexpected status 503: busy");
    }

    #[test]
    fn test_configuration_error_wraps_transparently() {
        let err: PayzenError = ConfigurationError::MissingField { field: "shopKey" }.into();
        assert_eq!(err.to_string(), "missing required configuration field `shopKey`");
    }

    #[test]
    fn test_callback_error_from_message() {
        let err = CallbackError::from("boom");
        assert_eq!(err.to_string(), "response callback failed: boom");
    }
}
