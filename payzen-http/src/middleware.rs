use http::{Extensions, HeaderName, HeaderValue};
use payzen::CredentialSigner;
use payzen::signer::SignedHeaders;
use reqwest::{Request, Response};
use reqwest_middleware as rqm;

use crate::error::HttpError;

/// Signs every request passing through the client.
///
/// A fresh request id and timestamp are drawn per request, so a retried
/// request is signed anew.
#[derive(Debug, Clone)]
pub struct SigningMiddleware {
    signer: CredentialSigner,
}

impl SigningMiddleware {
    /// Creates a middleware signing with `signer`.
    #[must_use]
    pub const fn new(signer: CredentialSigner) -> Self {
        Self { signer }
    }

    /// Returns the signer.
    #[must_use]
    pub const fn signer(&self) -> &CredentialSigner {
        &self.signer
    }
}

/// Writes signed headers into a request, replacing same-named headers.
///
/// # Errors
///
/// Returns [`HttpError`] if a name or value is not valid HTTP.
pub(crate) fn apply_headers(
    request: &mut Request,
    signed: &SignedHeaders,
) -> Result<(), HttpError> {
    let headers = request.headers_mut();
    for (name, value) in signed.iter() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|source| HttpError::HeaderName {
                name: name.to_owned(),
                source,
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|source| HttpError::HeaderValue {
            name: name.to_owned(),
            source,
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(())
}

#[async_trait::async_trait]
impl rqm::Middleware for SigningMiddleware {
    #[tracing::instrument(name = "payzen.http.sign", skip_all, err)]
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let signed = self
            .signer
            .sign_now()
            .map_err(|e| rqm::Error::middleware(HttpError::from(e)))?;
        apply_headers(&mut req, &signed).map_err(rqm::Error::middleware)?;
        tracing::trace!(
            shop_id = %self.signer.credentials().shop_id(),
            request_id = signed.get(payzen::signer::REQUEST_ID_HEADER).unwrap_or_default(),
            "Signed request"
        );
        next.run(req, extensions).await
    }
}
