//! The [`Payment`] service.
//!
//! Every operation follows the same path: resolve [`CallSettings`] from the
//! injected defaults and the per-call override, build a fresh port, send the
//! remote call, aggregate the reply, notify the callback, return the result.
//! Configuration problems surface before any port is built.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::client::{ClientFactory, PaymentPort};
use crate::config::SdkConfig;
use crate::credentials::{CallSettings, ConfigOverride};
use crate::dispatch::{self, ResponseCallback};
use crate::error::PayzenError;
use crate::proto::{
    CancelPayment, CardRequest, CommonRequest, CreatePayment, CreateTokenFromTransaction,
    GetPaymentDetails, GetPaymentUuid, LegacyTransactionKeyRequest, PaymentRequest, QueryRequest,
    RefundPayment, RemoteCall, ThreeDSRequest, UpdatePayment, ValidatePayment,
};
use crate::result::{NormalizedResult, OperationKind};
use crate::session::{self, RedirectToken};

/// Optional inputs of one call.
///
/// ```rust
/// use payzen::{CallOptions, ConfigOverride};
///
/// let overrides = ConfigOverride::new().with("shopId", "91335531");
/// let options = CallOptions::new()
///     .with_overrides(&overrides)
///     .with_header("X-Request-Source", "backoffice");
/// ```
#[derive(Default)]
pub struct CallOptions<'a> {
    overrides: Option<&'a ConfigOverride>,
    callback: Option<&'a dyn ResponseCallback>,
    headers: Vec<(String, String)>,
}

impl<'a> CallOptions<'a> {
    /// No override, no callback, no extra header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the default configuration for this call only.
    #[must_use]
    pub const fn with_overrides(mut self, overrides: &'a ConfigOverride) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Notifies `callback` with the result before returning it.
    #[must_use]
    pub fn with_callback(mut self, callback: &'a dyn ResponseCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Sends an extra header. Signed header names are reserved.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl fmt::Debug for CallOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("overrides", &self.overrides)
            .field("has_callback", &self.callback.is_some())
            .field("headers", &self.headers)
            .finish()
    }
}

/// The proof a browser brings back from the access control server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// The `PaRes` form field.
    pub pa_res: String,
    /// The `MD` form field, as handed out by [`NormalizedResult::redirect_md`].
    pub md: RedirectToken,
}

impl ChallengeResponse {
    /// Wraps the two form fields.
    pub fn new(pa_res: impl Into<String>, md: impl Into<RedirectToken>) -> Self {
        Self {
            pa_res: pa_res.into(),
            md: md.into(),
        }
    }
}

/// What an update changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentChange {
    /// A new amount and currency.
    Amount {
        /// Amount in the smallest currency unit.
        amount: i64,
        /// ISO 4217 numeric currency code.
        currency: u16,
    },
    /// A new expected capture date.
    CaptureDate(DateTime<Utc>),
}

/// Modification of an existing transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    /// Transaction UUID.
    pub uuid: String,
    /// The change to apply.
    pub change: PaymentChange,
}

impl From<PaymentUpdate> for UpdatePayment {
    fn from(update: PaymentUpdate) -> Self {
        let payment_request = match update.change {
            PaymentChange::Amount { amount, currency } => PaymentRequest {
                amount: Some(amount),
                currency: Some(currency),
                ..PaymentRequest::default()
            },
            PaymentChange::CaptureDate(date) => PaymentRequest {
                expected_capture_date: Some(date),
                ..PaymentRequest::default()
            },
        };
        Self {
            common_request: CommonRequest::default(),
            query_request: QueryRequest::by_uuid(update.uuid),
            payment_request,
        }
    }
}

/// Refund of a captured transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    /// Transaction UUID.
    pub uuid: String,
    /// Amount to refund.
    pub amount: i64,
    /// ISO 4217 numeric currency code.
    pub currency: u16,
    /// Optional comment.
    pub comment: Option<String>,
}

impl From<Refund> for RefundPayment {
    fn from(refund: Refund) -> Self {
        Self {
            common_request: CommonRequest::with_comment(refund.comment),
            payment_request: PaymentRequest {
                amount: Some(refund.amount),
                currency: Some(refund.currency),
                ..PaymentRequest::default()
            },
            query_request: QueryRequest::by_uuid(refund.uuid),
        }
    }
}

/// Entry point exposing every remote operation.
///
/// Holds the process defaults and the factory; both are read-only, so one
/// `Payment` can serve any number of concurrent calls.
pub struct Payment<F> {
    config: Arc<SdkConfig>,
    factory: F,
}

impl<F> fmt::Debug for Payment<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payment")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<F: ClientFactory> Payment<F> {
    /// Creates the service from the process defaults and a client factory.
    pub fn new(config: impl Into<Arc<SdkConfig>>, factory: F) -> Self {
        Self {
            config: config.into(),
            factory,
        }
    }

    /// The process defaults.
    #[must_use]
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Creates a payment.
    ///
    /// When the card requires verification the result carries a
    /// [`redirect_md`](NormalizedResult::redirect_md).
    ///
    /// # Errors
    ///
    /// Returns [`PayzenError::Configuration`] before any I/O if the settings
    /// cannot be resolved, or [`PayzenError::Transport`] if the call fails.
    pub async fn create(
        &self,
        request: impl Into<CreatePayment> + Send,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let result = invoke(port.as_ref(), RemoteCall::Create(request.into())).await?;
        Ok(finish(&options, result))
    }

    /// Completes a pending verification with the proof returned by the browser.
    ///
    /// The session cookie carried by the MD is replayed so the service finds
    /// the suspended payment.
    ///
    /// # Errors
    ///
    /// Returns [`PayzenError::Session`] if the MD is malformed, plus the
    /// errors of [`Payment::create`].
    pub async fn complete_challenge(
        &self,
        response: ChallengeResponse,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let (session, request_id) = session::resume_challenge(&response.md)?;
        let call = RemoteCall::Create(CreatePayment {
            three_ds_request: Some(ThreeDSRequest::finalize(request_id, response.pa_res)),
            ..CreatePayment::default()
        });
        tracing::debug!(cookie = %session, "Replaying session cookie");
        let reply = port.call(&call, Some(&session)).await?;
        let result = NormalizedResult::aggregate(
            OperationKind::CreatePayment,
            reply.fragments,
            Some(session),
        );
        Ok(finish(&options, result))
    }

    /// Fetches a transaction by UUID.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn details(
        &self,
        uuid: &str,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let result = invoke(port.as_ref(), details_call(uuid)).await?;
        Ok(finish(&options, result))
    }

    /// Fetches a transaction by its legacy key.
    ///
    /// Looks the UUID up first. If none comes back, the lookup result is
    /// returned as is.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn details_by_key(
        &self,
        key: LegacyTransactionKeyRequest,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let lookup = invoke(port.as_ref(), uuid_call(key)).await?;
        let uuid = lookup.transaction_uuid().map(str::to_owned);
        let result = match uuid {
            Some(uuid) => invoke(port.as_ref(), details_call(&uuid)).await?,
            None => lookup,
        };
        Ok(finish(&options, result))
    }

    /// Looks up the UUID of a transaction from its legacy key.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn find_uuid(
        &self,
        key: LegacyTransactionKeyRequest,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let result = invoke(port.as_ref(), uuid_call(key)).await?;
        Ok(finish(&options, result))
    }

    /// Cancels a transaction by UUID.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn cancel(
        &self,
        uuid: &str,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let result = invoke(port.as_ref(), cancel_call(uuid)).await?;
        Ok(finish(&options, result))
    }

    /// Cancels a transaction by its legacy key.
    ///
    /// Looks the UUID up first. If none comes back, the lookup result is
    /// returned and nothing is cancelled.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn cancel_by_key(
        &self,
        key: LegacyTransactionKeyRequest,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let lookup = invoke(port.as_ref(), uuid_call(key)).await?;
        let uuid = lookup.transaction_uuid().map(str::to_owned);
        let result = match uuid {
            Some(uuid) => invoke(port.as_ref(), cancel_call(&uuid)).await?,
            None => lookup,
        };
        Ok(finish(&options, result))
    }

    /// Changes the amount or the capture date of a transaction.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn update(
        &self,
        update: PaymentUpdate,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let call = RemoteCall::Update(update.into());
        let result = invoke(port.as_ref(), call).await?;
        Ok(finish(&options, result))
    }

    /// Validates a transaction waiting for manual validation.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn validate(
        &self,
        uuid: &str,
        comment: Option<String>,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let call = RemoteCall::Validate(ValidatePayment {
            common_request: CommonRequest::with_comment(comment),
            query_request: QueryRequest::by_uuid(uuid),
        });
        let result = invoke(port.as_ref(), call).await?;
        Ok(finish(&options, result))
    }

    /// Creates a payment token from the card of an existing transaction.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn create_token(
        &self,
        uuid: &str,
        comment: Option<String>,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let call = RemoteCall::CreateToken(CreateTokenFromTransaction {
            common_request: CommonRequest::with_comment(comment),
            card_request: CardRequest::default(),
            query_request: QueryRequest::by_uuid(uuid),
        });
        let result = invoke(port.as_ref(), call).await?;
        Ok(finish(&options, result))
    }

    /// Refunds a captured transaction.
    ///
    /// # Errors
    ///
    /// See [`Payment::create`].
    pub async fn refund(
        &self,
        refund: Refund,
        options: CallOptions<'_>,
    ) -> Result<NormalizedResult, PayzenError> {
        let port = self.port(&options)?;
        let call = RemoteCall::Refund(refund.into());
        let result = invoke(port.as_ref(), call).await?;
        Ok(finish(&options, result))
    }

    /// Resolves the settings of one call and builds its port.
    fn port(&self, options: &CallOptions<'_>) -> Result<Box<dyn PaymentPort>, PayzenError> {
        let settings = CallSettings::resolve(&self.config, options.overrides)?
            .with_headers(options.headers.iter().cloned());
        settings.validate()?;
        tracing::debug!(
            shop_id = settings.credentials().shop_id(),
            mode = %settings.credentials().mode(),
            endpoint = %settings.endpoint(),
            "Building payment port"
        );
        self.factory.build(settings)
    }
}

async fn invoke(
    port: &dyn PaymentPort,
    call: RemoteCall,
) -> Result<NormalizedResult, PayzenError> {
    let kind = call.kind();
    let reply = port.call(&call, None).await?;
    tracing::debug!(operation = %kind, "Remote call completed");
    Ok(NormalizedResult::aggregate(
        kind,
        reply.fragments,
        reply.session_cookie,
    ))
}

fn finish(options: &CallOptions<'_>, result: NormalizedResult) -> NormalizedResult {
    dispatch::dispatch(options.callback, &result);
    result
}

fn details_call(uuid: &str) -> RemoteCall {
    RemoteCall::Details(GetPaymentDetails {
        query_request: QueryRequest::by_uuid(uuid),
    })
}

fn uuid_call(key: LegacyTransactionKeyRequest) -> RemoteCall {
    RemoteCall::FindUuid(GetPaymentUuid {
        legacy_transaction_key_request: key,
    })
}

fn cancel_call(uuid: &str) -> RemoteCall {
    RemoteCall::Cancel(CancelPayment {
        common_request: CommonRequest::default(),
        query_request: QueryRequest::by_uuid(uuid),
    })
}
