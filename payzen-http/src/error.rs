//! Errors raised while decorating a request.
//!
//! They travel through [`reqwest_middleware::Error::Middleware`] and surface
//! to callers as [`payzen::TransportError::Request`].

/// A signed header could not be attached to a request.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The signer rejected its inputs.
    #[error("cannot sign request: {0}")]
    Signing(#[from] payzen::ConfigurationError),

    /// A header name is not a valid HTTP token.
    #[error("invalid header name {name:?}: {source}")]
    HeaderName {
        /// The rejected name.
        name: String,
        /// The underlying error.
        #[source]
        source: http::header::InvalidHeaderName,
    },

    /// A header value contains bytes HTTP does not allow.
    #[error("invalid value for header {name:?}: {source}")]
    HeaderValue {
        /// Name of the header.
        name: String,
        /// The underlying error.
        #[source]
        source: http::header::InvalidHeaderValue,
    },
}
