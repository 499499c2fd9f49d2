use payzen::{CallSettings, ClientFactory, PaymentPort, PayzenError, TransportError};
use reqwest::Client;
use reqwest_middleware as rqm;

use crate::constants::USER_AGENT;
use crate::middleware::SigningMiddleware;
use crate::port::HttpPort;

/// Builds a signing [`HttpPort`] for every call.
///
/// Only the connection pool is shared between calls. Credentials, endpoint
/// and timeout come from the [`CallSettings`] of each call.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    client: Client,
}

impl HttpClientFactory {
    /// Creates a factory with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Request {
                operation: "buildClient",
                source: Box::new(e),
            })?;
        Ok(Self { client })
    }

    /// Creates a factory sharing an existing client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Builds the port for one call.
    #[must_use]
    pub fn port(&self, settings: &CallSettings) -> HttpPort {
        let client = rqm::ClientBuilder::new(self.client.clone())
            .with(SigningMiddleware::new(settings.signer()))
            .build();
        HttpPort::new(client, settings.endpoint(), settings.request_timeout())
    }
}

impl ClientFactory for HttpClientFactory {
    fn build(&self, settings: CallSettings) -> Result<Box<dyn PaymentPort>, PayzenError> {
        settings.validate()?;
        tracing::trace!(
            shop_id = %settings.credentials().shop_id(),
            endpoint = %settings.endpoint(),
            "Building HTTP port"
        );
        Ok(Box::new(self.port(&settings)))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use payzen::{Credentials, Mode};

    #[test]
    fn test_port_takes_endpoint_and_timeout_from_settings() {
        let credentials = Credentials::new("12345678", "secret", Mode::Test).unwrap();
        let settings = CallSettings::new(
            credentials,
            "https://example.test/ws/v5".parse().unwrap(),
        )
        .with_request_timeout(Duration::from_secs(7));
        let port = HttpClientFactory::from_client(Client::new()).port(&settings);
        assert_eq!(port.base_url().as_str(), "https://example.test/ws/v5/");
        assert_eq!(port.timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_build_rejects_settings_unfit_for_headers() {
        let credentials = Credentials::new("12345678", "secret", Mode::Test)
            .unwrap()
            .with_ws_user("bad\nuser");
        let settings = CallSettings::new(credentials, "https://example.test/ws/".parse().unwrap());
        let result = HttpClientFactory::from_client(Client::new()).build(settings);
        assert!(matches!(result, Err(PayzenError::Configuration(_))));
    }
}
