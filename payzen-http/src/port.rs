use std::time::Duration;

use payzen::proto::{RemoteCall, ResponseFragments};
use payzen::{BoxFuture, PaymentPort, RemoteReply, SessionCookie, TransportError};
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest_middleware::ClientWithMiddleware;
use url::Url;

use crate::constants::JSON_CONTENT_TYPE;

/// A signing HTTP client bound to one call's settings.
///
/// Each operation is posted as JSON to `<endpoint>/<operationName>`. Any 2xx
/// reply is decoded; every other status is a [`TransportError::Status`].
#[derive(Debug, Clone)]
pub struct HttpPort {
    client: ClientWithMiddleware,
    base_url: Url,
    timeout: Duration,
}

impl HttpPort {
    /// Wraps a middleware client.
    ///
    /// `endpoint` is treated as a directory: operation names are appended to
    /// its path rather than replacing its last segment.
    #[must_use]
    pub fn new(client: ClientWithMiddleware, endpoint: &Url, timeout: Duration) -> Self {
        let mut base_url = endpoint.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client,
            base_url,
            timeout,
        }
    }

    /// Returns the URL operations are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts one call and decodes the reply envelope.
    ///
    /// `operation` names the remote operation in tracing and error messages.
    #[tracing::instrument(name = "payzen.http.post", skip_all, fields(operation = operation), err)]
    async fn post_json(
        &self,
        operation: &'static str,
        call: &RemoteCall,
        session: Option<&SessionCookie>,
    ) -> Result<RemoteReply, TransportError> {
        let url = self
            .base_url
            .join(operation)
            .map_err(|e| TransportError::Request {
                operation,
                source: Box::new(e),
            })?;
        let body = serde_json::to_vec(call).map_err(|e| TransportError::Request {
            operation,
            source: Box::new(e),
        })?;

        let mut req = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .timeout(self.timeout)
            .body(body);
        if let Some(cookie) = session {
            tracing::debug!(%cookie, "Sending session cookie");
            req = req.header(COOKIE, cookie.as_str());
        }

        let http_response = req.send().await.map_err(|e| TransportError::Request {
            operation,
            source: Box::new(e),
        })?;

        let status = http_response.status();
        let session_cookie = SessionCookie::from_set_cookie(
            http_response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        let bytes = http_response
            .bytes()
            .await
            .map_err(|e| TransportError::Request {
                operation,
                source: Box::new(e),
            })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                operation,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let fragments: ResponseFragments =
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
                operation,
                source: Box::new(e),
            })?;
        let reply = RemoteReply::new(fragments);
        Ok(match session_cookie {
            Some(cookie) => {
                tracing::debug!(%cookie, "Received session cookie");
                reply.with_session_cookie(cookie)
            }
            None => reply,
        })
    }
}

impl PaymentPort for HttpPort {
    fn call<'a>(
        &'a self,
        call: &'a RemoteCall,
        session: Option<&'a SessionCookie>,
    ) -> BoxFuture<'a, Result<RemoteReply, TransportError>> {
        Box::pin(self.post_json(call.remote_name(), call, session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(endpoint: &str) -> HttpPort {
        let client = reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build();
        HttpPort::new(client, &endpoint.parse().unwrap(), Duration::from_secs(5))
    }

    #[test]
    fn test_base_url_gains_trailing_slash() {
        let port = port("https://secure.payzen.eu/vads-ws/v5");
        assert_eq!(port.base_url().as_str(), "https://secure.payzen.eu/vads-ws/v5/");
        assert_eq!(
            port.base_url().join("createPayment").unwrap().as_str(),
            "https://secure.payzen.eu/vads-ws/v5/createPayment"
        );
    }

    #[test]
    fn test_base_url_keeps_existing_slash() {
        let port = port("https://secure.payzen.eu/vads-ws/v5/");
        assert_eq!(port.base_url().as_str(), "https://secure.payzen.eu/vads-ws/v5/");
    }
}
