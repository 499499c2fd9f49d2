//! Process-wide default configuration.
//!
//! An [`SdkConfig`] is loaded once at process start and handed to
//! [`Payment::new`](crate::Payment::new). Nothing in the SDK reads it through
//! a global; per-call changes go through a
//! [`ConfigOverride`](crate::ConfigOverride) instead.
//!
//! # Example Configuration
//!
//! ```toml
//! shop_id = "12345678"
//! shop_key = "$PAYZEN_TEST_KEY"
//! mode = "TEST"
//! endpoint = "https://secure.payzen.eu/vads-ws/v5"
//! request_timeout_secs = 30
//! ```
//!
//! # Environment Variables
//!
//! - `PAYZEN_CONFIG` - Path to the configuration file (default: `payzen.toml`)
//! - `PAYZEN_SHOP_ID`, `PAYZEN_SHOP_KEY`, `PAYZEN_MODE`, `PAYZEN_ENDPOINT` -
//!   Override the file values
//! - Any variable referenced as `$VAR` / `${VAR}` in the file

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::Mode;
use crate::error::ConfigurationError;

/// Default web-service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://secure.payzen.eu/vads-ws/v5";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "PAYZEN_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "payzen.toml";

/// Default credentials and endpoint shared, read-only, by every call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Shop identifier.
    #[serde(default)]
    pub shop_id: Option<String>,

    /// Shop secret used to compute the auth token.
    #[serde(default)]
    pub shop_key: Option<String>,

    /// Signing mode (default: `TEST`).
    #[serde(default)]
    pub mode: Mode,

    /// Web-service endpoint (default: [`DEFAULT_ENDPOINT`]).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Optional web-service user.
    #[serde(default)]
    pub ws_user: Option<String>,

    /// Optional return URL.
    #[serde(default)]
    pub return_url: Option<String>,

    /// Optional endpoint context, sent as `ecsPaymentId`.
    #[serde(default)]
    pub endpoint_context: Option<String>,

    /// Optional remote id.
    #[serde(default)]
    pub remote_id: Option<String>,

    /// Per-request timeout in seconds (default: `30`).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_owned()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            shop_id: None,
            shop_key: None,
            mode: Mode::default(),
            endpoint: default_endpoint(),
            ws_user: None,
            return_url: None,
            endpoint_context: None,
            remote_id: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkConfig")
            .field("shop_id", &self.shop_id)
            .field("has_shop_key", &self.shop_key.is_some())
            .field("mode", &self.mode)
            .field("endpoint", &self.endpoint)
            .field("ws_user", &self.ws_user)
            .field("return_url", &self.return_url)
            .field("endpoint_context", &self.endpoint_context)
            .field("remote_id", &self.remote_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl SdkConfig {
    /// Loads configuration from the path given by `PAYZEN_CONFIG`, falling
    /// back to `payzen.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the file cannot be read or parsed,
    /// or if an environment override holds an invalid mode.
    pub fn load() -> Result<Self, ConfigurationError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults. `$VAR` references are expanded
    /// and `PAYZEN_*` environment overrides applied afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the file cannot be read or parsed,
    /// or if an environment override holds an invalid mode.
    pub fn load_from(path: &str) -> Result<Self, ConfigurationError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };

        let mut config = Self::parse(path, &content)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parses configuration text, expanding `$VAR` references.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] if the text is not valid.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        Self::parse("<inline>", content)
    }

    fn parse(path: &str, content: &str) -> Result<Self, ConfigurationError> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|source| ConfigurationError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigurationError> {
        if let Some(shop_id) = lookup("PAYZEN_SHOP_ID") {
            self.shop_id = Some(shop_id);
        }
        if let Some(shop_key) = lookup("PAYZEN_SHOP_KEY") {
            self.shop_key = Some(shop_key);
        }
        if let Some(mode) = lookup("PAYZEN_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(endpoint) = lookup("PAYZEN_ENDPOINT") {
            self.endpoint = endpoint;
        }
        Ok(())
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    closed = true;
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match std::env::var(&var_name) {
            Ok(val) if !var_name.is_empty() => result.push_str(&val),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SdkConfig::from_toml_str("").unwrap();
        assert_eq!(config, SdkConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_parse_full_config() {
        let config = SdkConfig::from_toml_str(
            r#"
            shop_id = "12345678"
            shop_key = "1111111111111111"
            mode = "PRODUCTION"
            endpoint = "http://localhost:9000/ws"
            ws_user = "ws"
            remote_id = "remote"
            request_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.shop_id.as_deref(), Some("12345678"));
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.endpoint, "http://localhost:9000/ws");
        assert_eq!(config.ws_user.as_deref(), Some("ws"));
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let err = SdkConfig::from_toml_str("mode = \"LIVE\"").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse { .. }));
    }

    #[test]
    fn test_apply_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PAYZEN_SHOP_ID", "99999999"),
            ("PAYZEN_MODE", "production"),
        ]
        .into_iter()
        .collect();
        let mut config = SdkConfig::from_toml_str("shop_id = \"12345678\"").unwrap();
        config
            .apply_env(|name| env.get(name).map(|v| (*v).to_owned()))
            .unwrap();
        assert_eq!(config.shop_id.as_deref(), Some("99999999"));
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.shop_key, None);
    }

    #[test]
    fn test_apply_env_rejects_bad_mode() {
        let mut config = SdkConfig::default();
        let result = config.apply_env(|name| (name == "PAYZEN_MODE").then(|| "LIVE".to_owned()));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = SdkConfig::parse("does-not-exist.toml", "").unwrap();
        assert_eq!(config.shop_id, None);
    }

    #[test]
    fn test_expand_leaves_unresolved_variables() {
        assert_eq!(
            expand_env_vars("key = \"$PAYZEN_SURELY_UNSET_VAR\""),
            "key = \"$PAYZEN_SURELY_UNSET_VAR\""
        );
        assert_eq!(
            expand_env_vars("key = \"${PAYZEN_SURELY_UNSET_VAR}\""),
            "key = \"${PAYZEN_SURELY_UNSET_VAR}\""
        );
        assert_eq!(expand_env_vars("cost = 5$"), "cost = 5$");
    }

    #[test]
    fn test_expand_resolves_set_variables() {
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(expand_env_vars("${PATH}"), path);
            assert_eq!(expand_env_vars("$PATH/bin"), format!("{path}/bin"));
        }
    }

    #[test]
    fn test_debug_hides_shop_key() {
        let config = SdkConfig {
            shop_key: Some("super-secret".into()),
            ..SdkConfig::default()
        };
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
