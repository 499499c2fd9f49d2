//! Shop credentials, signing modes and per-call configuration overrides.
//!
//! [`CallSettings::resolve`] is the only place where the process defaults
//! ([`SdkConfig`]) and a per-call [`ConfigOverride`] meet. The result is a
//! fresh value owned by a single call, so two concurrent calls with different
//! overrides never see each other's credentials.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::SdkConfig;
use crate::error::ConfigurationError;
use crate::signer::CredentialSigner;

/// Which platform the shop talks to.
///
/// Sent as the `mode` header of every signed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Test platform; no money moves.
    #[default]
    Test,
    /// Production platform.
    Production,
}

impl Mode {
    /// The wire value: `"TEST"` or `"PRODUCTION"`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "TEST",
            Self::Production => "PRODUCTION",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEST" => Ok(Self::Test),
            "PRODUCTION" => Ok(Self::Production),
            _ => Err(ConfigurationError::invalid(
                "mode",
                s,
                "expected TEST or PRODUCTION",
            )),
        }
    }
}

/// Shop credentials used to sign one call.
///
/// Immutable once built; the `shop_key` never leaves this value except as the
/// key of the HMAC computed by [`CredentialSigner`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    shop_id: String,
    shop_key: String,
    mode: Mode,
    ws_user: Option<String>,
    return_url: Option<String>,
    endpoint_context: Option<String>,
    remote_id: Option<String>,
}

impl Credentials {
    /// Creates credentials from the two required fields and a mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingField`] if `shop_id` or
    /// `shop_key` is blank.
    pub fn new(
        shop_id: impl Into<String>,
        shop_key: impl Into<String>,
        mode: Mode,
    ) -> Result<Self, ConfigurationError> {
        let shop_id = non_blank(shop_id.into()).ok_or(ConfigurationError::MissingField {
            field: "shopId",
        })?;
        let shop_key = non_blank(shop_key.into()).ok_or(ConfigurationError::MissingField {
            field: "shopKey",
        })?;
        Ok(Self {
            shop_id,
            shop_key,
            mode,
            ws_user: None,
            return_url: None,
            endpoint_context: None,
            remote_id: None,
        })
    }

    /// Sets the web-service user.
    #[must_use]
    pub fn with_ws_user(mut self, ws_user: impl Into<String>) -> Self {
        self.ws_user = non_blank(ws_user.into());
        self
    }

    /// Sets the return URL advertised to the service.
    #[must_use]
    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = non_blank(return_url.into());
        self
    }

    /// Sets the endpoint context (sent as `ecsPaymentId`).
    #[must_use]
    pub fn with_endpoint_context(mut self, endpoint_context: impl Into<String>) -> Self {
        self.endpoint_context = non_blank(endpoint_context.into());
        self
    }

    /// Sets the remote id.
    #[must_use]
    pub fn with_remote_id(mut self, remote_id: impl Into<String>) -> Self {
        self.remote_id = non_blank(remote_id.into());
        self
    }

    /// Returns the shop id.
    #[must_use]
    pub fn shop_id(&self) -> &str {
        &self.shop_id
    }

    pub(crate) fn shop_key(&self) -> &str {
        &self.shop_key
    }

    /// Returns the signing mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the web-service user, if any.
    #[must_use]
    pub fn ws_user(&self) -> Option<&str> {
        self.ws_user.as_deref()
    }

    /// Returns the return URL, if any.
    #[must_use]
    pub fn return_url(&self) -> Option<&str> {
        self.return_url.as_deref()
    }

    /// Returns the endpoint context, if any.
    #[must_use]
    pub fn endpoint_context(&self) -> Option<&str> {
        self.endpoint_context.as_deref()
    }

    /// Returns the remote id, if any.
    #[must_use]
    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("shop_id", &self.shop_id)
            .field("shop_key", &"<redacted>")
            .field("mode", &self.mode)
            .field("ws_user", &self.ws_user)
            .field("return_url", &self.return_url)
            .field("endpoint_context", &self.endpoint_context)
            .field("remote_id", &self.remote_id)
            .finish()
    }
}

/// Per-call configuration override.
///
/// A string map whose recognised keys mirror the [`Credentials`] fields:
/// `shopId`, `shopKey`, `mode`, `endpoint` (or `endpointHost`), `wsUser`,
/// `returnUrl`, `endpointContext` (or `ecsPaymentId`), `remoteId` and
/// `requestTimeout` (seconds). Other keys are ignored. A blank value clears
/// the default of a text field; a blank `mode` or `requestTimeout` keeps the
/// default.
///
/// ```rust
/// use payzen::ConfigOverride;
///
/// let overrides = ConfigOverride::new()
///     .with("shopId", "91335531")
///     .with("mode", "PRODUCTION");
/// assert_eq!(overrides.get("shopId"), Some("91335531"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConfigOverride(BTreeMap<String, String>);

impl ConfigOverride {
    /// Creates an empty override.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key, returning the override.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the value of a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` if no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the keys and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Debug for ConfigOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.0 {
            if OverrideKey::parse(key) == Some(OverrideKey::ShopKey) {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigOverride
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<S: std::hash::BuildHasher> From<std::collections::HashMap<String, String, S>>
    for ConfigOverride
{
    fn from(map: std::collections::HashMap<String, String, S>) -> Self {
        map.into_iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverrideKey {
    ShopId,
    ShopKey,
    Mode,
    Endpoint,
    WsUser,
    ReturnUrl,
    EndpointContext,
    RemoteId,
    RequestTimeout,
}

impl OverrideKey {
    fn parse(key: &str) -> Option<Self> {
        let key = match key {
            "shopId" => Self::ShopId,
            "shopKey" => Self::ShopKey,
            "mode" => Self::Mode,
            "endpoint" | "endpointHost" => Self::Endpoint,
            "wsUser" => Self::WsUser,
            "returnUrl" => Self::ReturnUrl,
            "endpointContext" | "ecsPaymentId" => Self::EndpointContext,
            "remoteId" => Self::RemoteId,
            "requestTimeout" => Self::RequestTimeout,
            _ => return None,
        };
        Some(key)
    }
}

/// Everything one call needs: credentials, endpoint, timeout and any extra
/// headers.
///
/// Built per call by [`CallSettings::resolve`] and handed to the
/// [`ClientFactory`](crate::ClientFactory); never shared between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSettings {
    credentials: Credentials,
    endpoint: Url,
    request_timeout: Duration,
    headers: Vec<(String, String)>,
}

impl CallSettings {
    /// Creates settings with the default request timeout.
    #[must_use]
    pub const fn new(credentials: Credentials, endpoint: Url) -> Self {
        Self {
            credentials,
            endpoint,
            request_timeout: crate::config::DEFAULT_REQUEST_TIMEOUT,
            headers: Vec::new(),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Appends caller-supplied headers sent after the signed ones.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Merges process defaults and an optional override into settings for one call.
    ///
    /// Neither input is modified.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if `shopId` or `shopKey` is missing, or
    /// if the mode, endpoint or timeout cannot be parsed.
    pub fn resolve(
        defaults: &SdkConfig,
        overrides: Option<&ConfigOverride>,
    ) -> Result<Self, ConfigurationError> {
        let mut draft = Draft::from_defaults(defaults);
        if let Some(overrides) = overrides {
            for (key, value) in overrides.iter() {
                draft.apply(key, value)?;
            }
        }
        draft.finish()
    }

    /// Returns the credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the service endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the caller-supplied headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Checks that every value sent as a header is valid HTTP.
    ///
    /// Covers the shop id, the optional credential fields and the
    /// caller-supplied headers, so a value no request could carry is reported
    /// before any port is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidValue`] naming the offending
    /// field, or `header` for a caller-supplied header.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_credential_headers(&self.credentials)?;
        for (name, value) in &self.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(ConfigurationError::invalid(
                    "header",
                    name.as_str(),
                    "not a valid HTTP header name",
                ));
            }
            if HeaderValue::from_str(value).is_err() {
                return Err(ConfigurationError::invalid(
                    "header",
                    name.as_str(),
                    "value is not a valid HTTP header value",
                ));
            }
        }
        Ok(())
    }

    /// Builds the signer for this call.
    #[must_use]
    pub fn signer(&self) -> CredentialSigner {
        CredentialSigner::new(self.credentials.clone(), self.headers.iter().cloned())
    }
}

/// Unvalidated settings while overrides are applied.
struct Draft {
    shop_id: Option<String>,
    shop_key: Option<String>,
    mode: Mode,
    endpoint: Option<String>,
    ws_user: Option<String>,
    return_url: Option<String>,
    endpoint_context: Option<String>,
    remote_id: Option<String>,
    request_timeout: Duration,
}

impl Draft {
    fn from_defaults(defaults: &SdkConfig) -> Self {
        Self {
            shop_id: defaults.shop_id.clone(),
            shop_key: defaults.shop_key.clone(),
            mode: defaults.mode,
            endpoint: Some(defaults.endpoint.clone()),
            ws_user: defaults.ws_user.clone(),
            return_url: defaults.return_url.clone(),
            endpoint_context: defaults.endpoint_context.clone(),
            remote_id: defaults.remote_id.clone(),
            request_timeout: Duration::from_secs(defaults.request_timeout_secs),
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigurationError> {
        let Some(key) = OverrideKey::parse(key) else {
            tracing::debug!(key, "Ignoring unrecognised configuration override");
            return Ok(());
        };
        let value = non_blank(value.to_owned());
        match key {
            OverrideKey::ShopId => self.shop_id = value,
            OverrideKey::ShopKey => self.shop_key = value,
            OverrideKey::Mode => {
                if let Some(mode) = value {
                    self.mode = mode.parse()?;
                }
            }
            OverrideKey::Endpoint => self.endpoint = value,
            OverrideKey::WsUser => self.ws_user = value,
            OverrideKey::ReturnUrl => self.return_url = value,
            OverrideKey::EndpointContext => self.endpoint_context = value,
            OverrideKey::RemoteId => self.remote_id = value,
            OverrideKey::RequestTimeout => {
                if let Some(raw) = value {
                    self.request_timeout = parse_timeout(&raw)?;
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<CallSettings, ConfigurationError> {
        let shop_id = self
            .shop_id
            .ok_or(ConfigurationError::MissingField { field: "shopId" })?;
        let shop_key = self
            .shop_key
            .ok_or(ConfigurationError::MissingField { field: "shopKey" })?;
        let raw_endpoint = self
            .endpoint
            .ok_or(ConfigurationError::MissingField { field: "endpoint" })?;
        let endpoint = parse_endpoint(&raw_endpoint)?;

        let mut credentials = Credentials::new(shop_id, shop_key, self.mode)?;
        credentials.ws_user = self.ws_user;
        credentials.return_url = self.return_url;
        credentials.endpoint_context = self.endpoint_context;
        credentials.remote_id = self.remote_id;
        check_credential_headers(&credentials)?;

        Ok(CallSettings {
            credentials,
            endpoint,
            request_timeout: self.request_timeout,
            headers: Vec::new(),
        })
    }
}

/// Parses an endpoint, normalising it to end with exactly one `/` so that
/// operation names join below it.
pub(crate) fn parse_endpoint(raw: &str) -> Result<Url, ConfigurationError> {
    let mut normalized = raw.trim().trim_end_matches('/').to_owned();
    normalized.push('/');
    let url = Url::parse(&normalized).map_err(|source| ConfigurationError::InvalidEndpoint {
        value: raw.to_owned(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigurationError::invalid(
            "endpoint",
            raw,
            "scheme must be http or https",
        ));
    }
    Ok(url)
}

fn check_credential_headers(credentials: &Credentials) -> Result<(), ConfigurationError> {
    let fields = [
        ("shopId", Some(credentials.shop_id())),
        ("wsUser", credentials.ws_user()),
        ("returnUrl", credentials.return_url()),
        ("endpointContext", credentials.endpoint_context()),
        ("remoteId", credentials.remote_id()),
    ];
    for (field, value) in fields {
        let Some(value) = value else {
            continue;
        };
        if HeaderValue::from_str(value).is_err() {
            return Err(ConfigurationError::invalid(
                field,
                value,
                "not a valid HTTP header value",
            ));
        }
    }
    Ok(())
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigurationError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigurationError::invalid(
            "requestTimeout",
            raw,
            "expected a positive number of seconds",
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_owned())
    }
}
