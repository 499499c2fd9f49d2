//! Per-request authentication headers.
//!
//! Every outbound call carries the shop id, a fresh request id, a UTC
//! timestamp and an `authToken` proving possession of the shop key:
//!
//! ```text
//! authToken = base64(HMAC-SHA256(key = shopKey, message = requestId + timestamp))
//! ```
//!
//! The key itself is never sent.

use base64::prelude::*;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::credentials::Credentials;
use crate::error::ConfigurationError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the shop id.
pub const SHOP_ID_HEADER: &str = "shopId";
/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "requestId";
/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "timestamp";
/// Header carrying the mode.
pub const MODE_HEADER: &str = "mode";
/// Header carrying the computed token.
pub const AUTH_TOKEN_HEADER: &str = "authToken";
/// Header carrying the optional web-service user.
pub const WS_USER_HEADER: &str = "wsUser";
/// Header carrying the optional return URL.
pub const RETURN_URL_HEADER: &str = "returnUrl";
/// Header carrying the optional endpoint context.
pub const ENDPOINT_CONTEXT_HEADER: &str = "ecsPaymentId";
/// Header carrying the optional remote id.
pub const REMOTE_ID_HEADER: &str = "remoteId";

const SIGNED_HEADERS: [&str; 9] = [
    SHOP_ID_HEADER,
    REQUEST_ID_HEADER,
    TIMESTAMP_HEADER,
    MODE_HEADER,
    AUTH_TOKEN_HEADER,
    WS_USER_HEADER,
    RETURN_URL_HEADER,
    ENDPOINT_CONTEXT_HEADER,
    REMOTE_ID_HEADER,
];

/// Ordered header name/value pairs produced for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedHeaders(Vec<(String, String)>);

impl SignedHeaders {
    /// Returns the value of a header, matching the name case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the headers in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }
}

/// Computes authentication headers from one set of credentials.
///
/// Holds no state besides its inputs: the same request id and timestamp always
/// produce the same headers.
#[derive(Debug, Clone)]
pub struct CredentialSigner {
    credentials: Credentials,
    dynamic_headers: Vec<(String, String)>,
}

impl CredentialSigner {
    /// Creates a signer for the given credentials and caller-supplied headers.
    ///
    /// Dynamic headers whose name collides with a signed header are dropped
    /// when signing.
    pub fn new<I, K, V>(credentials: Credentials, dynamic_headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            credentials,
            dynamic_headers: dynamic_headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the credentials this signer signs with.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Signs with a fresh UUID v4 request id and the current time.
    ///
    /// # Errors
    ///
    /// See [`CredentialSigner::sign`].
    pub fn sign_now(&self) -> Result<SignedHeaders, ConfigurationError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.sign(&request_id, Utc::now())
    }

    /// Produces the headers for one request.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingField`] if `request_id` is blank.
    pub fn sign(
        &self,
        request_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<SignedHeaders, ConfigurationError> {
        if request_id.trim().is_empty() {
            return Err(ConfigurationError::MissingField { field: "requestId" });
        }
        let timestamp = format_timestamp(timestamp);
        let token = auth_token(self.credentials.shop_key(), request_id, &timestamp)?;

        let mut headers = SignedHeaders::default();
        headers.push(SHOP_ID_HEADER, self.credentials.shop_id());
        headers.push(REQUEST_ID_HEADER, request_id);
        headers.push(TIMESTAMP_HEADER, timestamp);
        headers.push(MODE_HEADER, self.credentials.mode().as_str());
        headers.push(AUTH_TOKEN_HEADER, token);

        let optional = [
            (WS_USER_HEADER, self.credentials.ws_user()),
            (RETURN_URL_HEADER, self.credentials.return_url()),
            (ENDPOINT_CONTEXT_HEADER, self.credentials.endpoint_context()),
            (REMOTE_ID_HEADER, self.credentials.remote_id()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                headers.push(name, value);
            }
        }

        for (name, value) in &self.dynamic_headers {
            if SIGNED_HEADERS.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                tracing::warn!(
                    header = %name,
                    "Dropping dynamic header that shadows a signed header"
                );
                continue;
            }
            headers.push(name.clone(), value.clone());
        }

        Ok(headers)
    }
}

/// Renders a timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Computes the `authToken` for a request id and rendered timestamp.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidValue`] if the key is rejected by the
/// MAC. HMAC accepts keys of any length, so this does not happen in practice.
pub fn auth_token(
    shop_key: &str,
    request_id: &str,
    timestamp: &str,
) -> Result<String, ConfigurationError> {
    let mut mac = HmacSha256::new_from_slice(shop_key.as_bytes())
        .map_err(|_| ConfigurationError::invalid("shopKey", "<redacted>", "unusable as HMAC key"))?;
    mac.update(request_id.as_bytes());
    mac.update(timestamp.as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Mode;
    use chrono::TimeZone;

    fn credentials() -> Credentials {
        Credentials::new("12345678", "1111111111111111", Mode::Test).unwrap()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(fixed_time()), "2024-03-01T12:30:05Z");
    }

    #[test]
    fn test_auth_token_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let token = auth_token("key", "The quick brown fox ", "jumps over the lazy dog").unwrap();
        assert_eq!(token, "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=");
    }

    #[test]
    fn test_sign_is_deterministic() {
        let signer = CredentialSigner::new(credentials(), Vec::<(String, String)>::new());
        let a = signer.sign("req-1", fixed_time()).unwrap();
        let b = signer.sign("req-1", fixed_time()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_emits_required_headers() {
        let signer = CredentialSigner::new(credentials(), Vec::<(String, String)>::new());
        let headers = signer.sign("req-1", fixed_time()).unwrap();

        assert_eq!(headers.get("shopId"), Some("12345678"));
        assert_eq!(headers.get("requestId"), Some("req-1"));
        assert_eq!(headers.get("timestamp"), Some("2024-03-01T12:30:05Z"));
        assert_eq!(headers.get("mode"), Some("TEST"));
        assert_eq!(
            headers.get("authToken"),
            Some(
                auth_token("1111111111111111", "req-1", "2024-03-01T12:30:05Z")
                    .unwrap()
                    .as_str()
            )
        );
        assert_eq!(headers.get("wsUser"), None);
        assert_eq!(headers.len(), 5);
    }

    #[test]
    fn test_sign_never_emits_the_key() {
        let signer = CredentialSigner::new(credentials(), Vec::<(String, String)>::new());
        let headers = signer.sign("req-1", fixed_time()).unwrap();
        assert!(headers.iter().all(|(_, v)| !v.contains("1111111111111111")));
    }

    #[test]
    fn test_sign_includes_optional_and_dynamic_headers() {
        let credentials = credentials()
            .with_ws_user("ws-user")
            .with_endpoint_context("ctx")
            .with_remote_id("remote");
        let signer = CredentialSigner::new(
            credentials,
            [("X-Trace", "abc"), ("authtoken", "forged")],
        );
        let headers = signer.sign("req-1", fixed_time()).unwrap();

        assert_eq!(headers.get("wsUser"), Some("ws-user"));
        assert_eq!(headers.get("ecsPaymentId"), Some("ctx"));
        assert_eq!(headers.get("remoteId"), Some("remote"));
        assert_eq!(headers.get("X-Trace"), Some("abc"));
        assert_ne!(headers.get("authToken"), Some("forged"));
        assert_eq!(headers.iter().filter(|(n, _)| n.eq_ignore_ascii_case("authToken")).count(), 1);
    }

    #[test]
    fn test_sign_rejects_blank_request_id() {
        let signer = CredentialSigner::new(credentials(), Vec::<(String, String)>::new());
        assert!(matches!(
            signer.sign(" ", fixed_time()),
            Err(ConfigurationError::MissingField { field: "requestId" })
        ));
    }

    #[test]
    fn test_sign_now_uses_fresh_request_ids() {
        let signer = CredentialSigner::new(credentials(), Vec::<(String, String)>::new());
        let a = signer.sign_now().unwrap();
        let b = signer.sign_now().unwrap();
        assert_ne!(a.get("requestId"), b.get("requestId"));
    }
}
