//! Folding operation-specific replies into one result shape.
//!
//! Every operation answers with a different subset of response fragments.
//! Which subset is a property of the operation, declared once in
//! [`OperationKind::fragments`]; [`NormalizedResult::aggregate`] copies
//! exactly those slots from the decoded reply and leaves every other slot
//! absent, whatever the wire carried.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::proto::{
    AuthorizationResponse, CaptureResponse, CardResponse, CommonResponse, CustomerResponse,
    ExtraResponse, FraudManagementResponse, MarkResponse, OrderResponse, PaymentResponse,
    ResponseFragments, ShoppingCartResponse, SubscriptionResponse, ThreeDSResponse,
    TokenResponse,
};
use crate::session::{self, RedirectToken, SessionCookie};

/// One slot of a [`NormalizedResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum Fragment {
    Common,
    Order,
    Payment,
    Card,
    Authorization,
    Capture,
    Customer,
    Extra,
    ThreeDs,
    Token,
    ShoppingCart,
    FraudManagement,
    Mark,
    Subscription,
}

impl Fragment {
    /// Every fragment, in slot order.
    pub const ALL: [Self; 14] = [
        Self::Common,
        Self::Order,
        Self::Payment,
        Self::Card,
        Self::Authorization,
        Self::Capture,
        Self::Customer,
        Self::Extra,
        Self::ThreeDs,
        Self::Token,
        Self::ShoppingCart,
        Self::FraudManagement,
        Self::Mark,
        Self::Subscription,
    ];
}

/// Remote operation whose reply is being aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum OperationKind {
    CreatePayment,
    GetPaymentDetails,
    CancelPayment,
    UpdatePayment,
    GetPaymentUuid,
    RefundPayment,
    ValidatePayment,
    CreateTokenFromTransaction,
}

const CREATE_FRAGMENTS: &[Fragment] = &[
    Fragment::Common,
    Fragment::Order,
    Fragment::Payment,
    Fragment::Card,
    Fragment::Authorization,
    Fragment::Capture,
    Fragment::Customer,
    Fragment::Extra,
    Fragment::ThreeDs,
    Fragment::ShoppingCart,
    Fragment::FraudManagement,
    Fragment::Mark,
    Fragment::Subscription,
];

// Create minus the shopping cart.
const QUERY_FRAGMENTS: &[Fragment] = &[
    Fragment::Common,
    Fragment::Order,
    Fragment::Payment,
    Fragment::Card,
    Fragment::Authorization,
    Fragment::Capture,
    Fragment::Customer,
    Fragment::Extra,
    Fragment::ThreeDs,
    Fragment::FraudManagement,
    Fragment::Mark,
    Fragment::Subscription,
];

const COMMON_ONLY: &[Fragment] = &[Fragment::Common];

const UUID_FRAGMENTS: &[Fragment] = &[Fragment::Common, Fragment::Payment];

const TRANSACTION_FRAGMENTS: &[Fragment] = &[
    Fragment::Common,
    Fragment::Payment,
    Fragment::Order,
    Fragment::Card,
    Fragment::Authorization,
    Fragment::Capture,
    Fragment::Customer,
    Fragment::Mark,
    Fragment::ThreeDs,
    Fragment::Extra,
    Fragment::FraudManagement,
];

impl OperationKind {
    /// Every operation kind.
    pub const ALL: [Self; 8] = [
        Self::CreatePayment,
        Self::GetPaymentDetails,
        Self::CancelPayment,
        Self::UpdatePayment,
        Self::GetPaymentUuid,
        Self::RefundPayment,
        Self::ValidatePayment,
        Self::CreateTokenFromTransaction,
    ];

    /// The remote operation name.
    #[must_use]
    pub const fn remote_name(self) -> &'static str {
        match self {
            Self::CreatePayment => "createPayment",
            Self::GetPaymentDetails => "getPaymentDetails",
            Self::CancelPayment => "cancelPayment",
            Self::UpdatePayment => "updatePayment",
            Self::GetPaymentUuid => "getPaymentUuid",
            Self::RefundPayment => "refundPayment",
            Self::ValidatePayment => "validatePayment",
            Self::CreateTokenFromTransaction => "createTokenFromTransaction",
        }
    }

    /// The fragments this operation's reply may populate.
    ///
    /// No operation maps [`Fragment::Token`].
    #[must_use]
    pub const fn fragments(self) -> &'static [Fragment] {
        match self {
            Self::CreatePayment => CREATE_FRAGMENTS,
            Self::GetPaymentDetails | Self::UpdatePayment => QUERY_FRAGMENTS,
            Self::CancelPayment | Self::ValidatePayment => COMMON_ONLY,
            Self::GetPaymentUuid => UUID_FRAGMENTS,
            Self::RefundPayment | Self::CreateTokenFromTransaction => TRANSACTION_FRAGMENTS,
        }
    }

    /// Whether the result of this operation keeps the session cookie.
    #[must_use]
    pub const fn carries_session(self) -> bool {
        matches!(self, Self::CreatePayment)
    }

    /// Returns `true` if `fragment` is in this operation's table.
    #[must_use]
    pub fn maps(self, fragment: Fragment) -> bool {
        self.fragments().contains(&fragment)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_name())
    }
}

/// Everything a browser needs to run a pending verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcsRedirect {
    /// Where the browser must post.
    pub acs_url: String,
    /// The `PaReq` form field.
    pub pareq: String,
    /// The `MD` form field.
    pub md: RedirectToken,
}

/// The operation-agnostic result returned by every call.
///
/// Built once per call and immutable afterwards. A slot is `None` when the
/// operation does not map it or the service did not send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    operation: OperationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    common: Option<CommonResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order: Option<OrderResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment: Option<PaymentResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card: Option<CardResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorization: Option<AuthorizationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capture: Option<CaptureResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<CustomerResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extra: Option<ExtraResponse>,
    #[serde(rename = "threeDS", skip_serializing_if = "Option::is_none")]
    three_ds: Option<ThreeDSResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<TokenResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shopping_cart: Option<ShoppingCartResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fraud_management: Option<FraudManagementResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mark: Option<MarkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscription: Option<SubscriptionResponse>,
    #[serde(skip)]
    session_cookie: Option<SessionCookie>,
}

/// Keeps `value` only when `kind` maps `fragment`.
fn pick<T>(kind: OperationKind, fragment: Fragment, value: Option<T>) -> Option<T> {
    if kind.maps(fragment) {
        value
    } else {
        if value.is_some() {
            tracing::trace!(operation = %kind, ?fragment, "Dropping unmapped fragment");
        }
        None
    }
}

impl NormalizedResult {
    /// Builds the result of one call from its decoded reply.
    ///
    /// Only the fragments in `kind.fragments()` are kept. The session cookie
    /// is kept only for [`OperationKind::CreatePayment`].
    #[must_use]
    pub fn aggregate(
        kind: OperationKind,
        reply: ResponseFragments,
        session_cookie: Option<SessionCookie>,
    ) -> Self {
        Self {
            operation: kind,
            common: pick(kind, Fragment::Common, reply.common_response),
            order: pick(kind, Fragment::Order, reply.order_response),
            payment: pick(kind, Fragment::Payment, reply.payment_response),
            card: pick(kind, Fragment::Card, reply.card_response),
            authorization: pick(kind, Fragment::Authorization, reply.authorization_response),
            capture: pick(kind, Fragment::Capture, reply.capture_response),
            customer: pick(kind, Fragment::Customer, reply.customer_response),
            extra: pick(kind, Fragment::Extra, reply.extra_response),
            three_ds: pick(kind, Fragment::ThreeDs, reply.three_ds_response),
            token: pick(kind, Fragment::Token, reply.token_response),
            shopping_cart: pick(kind, Fragment::ShoppingCart, reply.shopping_cart_response),
            fraud_management: pick(
                kind,
                Fragment::FraudManagement,
                reply.fraud_management_response,
            ),
            mark: pick(kind, Fragment::Mark, reply.mark_response),
            subscription: pick(kind, Fragment::Subscription, reply.subscription_response),
            session_cookie: session_cookie.filter(|_| kind.carries_session()),
        }
    }

    /// The operation that produced this result.
    #[must_use]
    pub const fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Returns `true` if the given slot holds a value.
    #[must_use]
    pub const fn is_populated(&self, fragment: Fragment) -> bool {
        match fragment {
            Fragment::Common => self.common.is_some(),
            Fragment::Order => self.order.is_some(),
            Fragment::Payment => self.payment.is_some(),
            Fragment::Card => self.card.is_some(),
            Fragment::Authorization => self.authorization.is_some(),
            Fragment::Capture => self.capture.is_some(),
            Fragment::Customer => self.customer.is_some(),
            Fragment::Extra => self.extra.is_some(),
            Fragment::ThreeDs => self.three_ds.is_some(),
            Fragment::Token => self.token.is_some(),
            Fragment::ShoppingCart => self.shopping_cart.is_some(),
            Fragment::FraudManagement => self.fraud_management.is_some(),
            Fragment::Mark => self.mark.is_some(),
            Fragment::Subscription => self.subscription.is_some(),
        }
    }

    /// Common fragment.
    #[must_use]
    pub const fn common(&self) -> Option<&CommonResponse> {
        self.common.as_ref()
    }

    /// Order fragment.
    #[must_use]
    pub const fn order(&self) -> Option<&OrderResponse> {
        self.order.as_ref()
    }

    /// Payment fragment.
    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentResponse> {
        self.payment.as_ref()
    }

    /// Card fragment.
    #[must_use]
    pub const fn card(&self) -> Option<&CardResponse> {
        self.card.as_ref()
    }

    /// Authorization fragment.
    #[must_use]
    pub const fn authorization(&self) -> Option<&AuthorizationResponse> {
        self.authorization.as_ref()
    }

    /// Capture fragment.
    #[must_use]
    pub const fn capture(&self) -> Option<&CaptureResponse> {
        self.capture.as_ref()
    }

    /// Customer fragment.
    #[must_use]
    pub const fn customer(&self) -> Option<&CustomerResponse> {
        self.customer.as_ref()
    }

    /// Extra fragment.
    #[must_use]
    pub const fn extra(&self) -> Option<&ExtraResponse> {
        self.extra.as_ref()
    }

    /// 3-D Secure fragment.
    #[must_use]
    pub const fn three_ds(&self) -> Option<&ThreeDSResponse> {
        self.three_ds.as_ref()
    }

    /// Token fragment.
    #[must_use]
    pub const fn token(&self) -> Option<&TokenResponse> {
        self.token.as_ref()
    }

    /// Shopping cart fragment.
    #[must_use]
    pub const fn shopping_cart(&self) -> Option<&ShoppingCartResponse> {
        self.shopping_cart.as_ref()
    }

    /// Fraud management fragment.
    #[must_use]
    pub const fn fraud_management(&self) -> Option<&FraudManagementResponse> {
        self.fraud_management.as_ref()
    }

    /// Mark fragment.
    #[must_use]
    pub const fn mark(&self) -> Option<&MarkResponse> {
        self.mark.as_ref()
    }

    /// Subscription fragment.
    #[must_use]
    pub const fn subscription(&self) -> Option<&SubscriptionResponse> {
        self.subscription.as_ref()
    }

    /// Session cookie captured by a create call.
    #[must_use]
    pub const fn session_cookie(&self) -> Option<&SessionCookie> {
        self.session_cookie.as_ref()
    }

    /// Transaction UUID from the payment fragment, if non-empty.
    #[must_use]
    pub fn transaction_uuid(&self) -> Option<&str> {
        self.payment
            .as_ref()
            .and_then(|p| p.transaction_uuid.as_deref())
            .filter(|uuid| !uuid.is_empty())
    }

    /// Returns `true` if the common response code is `0`.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.common
            .as_ref()
            .is_some_and(|c| c.response_code == Some(0))
    }

    /// The MD to carry through the browser, when a verification is pending.
    ///
    /// Present only if this result has a session cookie and a 3-D Secure
    /// fragment with a verification request id, and both encode cleanly.
    #[must_use]
    pub fn redirect_md(&self) -> Option<RedirectToken> {
        let session = self.session_cookie.as_ref()?;
        let request_id = self.three_ds.as_ref()?.pending_request_id()?;
        match session::begin_challenge(session, request_id) {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::warn!(error = %err, "Cannot build redirect token");
                None
            }
        }
    }

    /// Everything needed to send the browser to the access control server.
    ///
    /// Present only when the ACS URL, the PaReq and the MD all are.
    #[must_use]
    pub fn acs_redirect(&self) -> Option<AcsRedirect> {
        let data = self
            .three_ds
            .as_ref()?
            .authentication_request_data
            .as_ref()?;
        let acs_url = data.three_ds_acs_url.clone().filter(|s| !s.is_empty())?;
        let pareq = data
            .three_ds_encoded_pareq
            .clone()
            .filter(|s| !s.is_empty())?;
        let md = self.redirect_md()?;
        Some(AcsRedirect { acs_url, pareq, md })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::AuthenticationRequestData;

    fn full_reply() -> ResponseFragments {
        ResponseFragments {
            common_response: Some(CommonResponse {
                response_code: Some(0),
                ..CommonResponse::default()
            }),
            order_response: Some(OrderResponse::default()),
            payment_response: Some(PaymentResponse {
                transaction_uuid: Some("uuid-1".into()),
                ..PaymentResponse::default()
            }),
            card_response: Some(CardResponse::default()),
            authorization_response: Some(AuthorizationResponse::default()),
            capture_response: Some(CaptureResponse::default()),
            customer_response: Some(CustomerResponse::default()),
            extra_response: Some(ExtraResponse::default()),
            three_ds_response: Some(ThreeDSResponse {
                authentication_request_data: Some(AuthenticationRequestData {
                    three_ds_acs_url: Some("https://acs.example/".into()),
                    three_ds_encoded_pareq: Some("PAREQ".into()),
                    three_ds_request_id: Some("3ds-1".into()),
                    ..AuthenticationRequestData::default()
                }),
                authentication_result_data: None,
            }),
            token_response: Some(TokenResponse::default()),
            shopping_cart_response: Some(ShoppingCartResponse::default()),
            fraud_management_response: Some(FraudManagementResponse::default()),
            mark_response: Some(MarkResponse::default()),
            subscription_response: Some(SubscriptionResponse::default()),
        }
    }

    fn cookie() -> SessionCookie {
        SessionCookie::new("JSESSIONID=abc")
    }

    #[test]
    fn test_only_mapped_fragments_are_populated() {
        for kind in OperationKind::ALL {
            let result = NormalizedResult::aggregate(kind, full_reply(), Some(cookie()));
            for fragment in Fragment::ALL {
                assert_eq!(
                    result.is_populated(fragment),
                    kind.maps(fragment),
                    "{kind} / {fragment:?}"
                );
            }
        }
    }

    #[test]
    fn test_cancel_never_yields_card() {
        let result = NormalizedResult::aggregate(OperationKind::CancelPayment, full_reply(), None);
        assert!(result.card().is_none());
        assert!(result.common().is_some());
    }

    #[test]
    fn test_token_is_never_mapped() {
        assert!(OperationKind::ALL.iter().all(|k| !k.maps(Fragment::Token)));
    }

    #[test]
    fn test_details_and_update_omit_shopping_cart() {
        for kind in [OperationKind::GetPaymentDetails, OperationKind::UpdatePayment] {
            assert!(!kind.maps(Fragment::ShoppingCart));
            assert!(kind.maps(Fragment::Subscription));
        }
        assert!(OperationKind::CreatePayment.maps(Fragment::ShoppingCart));
    }

    #[test]
    fn test_session_only_kept_for_create() {
        let create = NormalizedResult::aggregate(
            OperationKind::CreatePayment,
            full_reply(),
            Some(cookie()),
        );
        assert_eq!(create.session_cookie(), Some(&cookie()));

        let details = NormalizedResult::aggregate(
            OperationKind::GetPaymentDetails,
            full_reply(),
            Some(cookie()),
        );
        assert!(details.session_cookie().is_none());
        assert!(details.redirect_md().is_none());
    }

    #[test]
    fn test_redirect_md_requires_session() {
        let result = NormalizedResult::aggregate(OperationKind::CreatePayment, full_reply(), None);
        assert!(result.three_ds().is_some());
        assert!(result.redirect_md().is_none());
        assert!(result.acs_redirect().is_none());
    }

    #[test]
    fn test_redirect_md_requires_request_id() {
        let mut reply = full_reply();
        reply.three_ds_response = Some(ThreeDSResponse::default());
        let result = NormalizedResult::aggregate(
            OperationKind::CreatePayment,
            reply,
            Some(cookie()),
        );
        assert!(result.redirect_md().is_none());
    }

    #[test]
    fn test_redirect_md_absent_when_not_encodable() {
        let result = NormalizedResult::aggregate(
            OperationKind::CreatePayment,
            full_reply(),
            Some(SessionCookie::new("JSESSIONID=a+b")),
        );
        assert!(result.redirect_md().is_none());
    }

    #[test]
    fn test_redirect_md_and_acs_redirect() {
        let result = NormalizedResult::aggregate(
            OperationKind::CreatePayment,
            full_reply(),
            Some(cookie()),
        );
        let md = result.redirect_md().unwrap();
        assert_eq!(md.as_str(), "JSESSIONID=abc+3ds-1");

        let acs = result.acs_redirect().unwrap();
        assert_eq!(acs.acs_url, "https://acs.example/");
        assert_eq!(acs.pareq, "PAREQ");
        assert_eq!(acs.md, md);
    }

    #[test]
    fn test_accessors() {
        let result = NormalizedResult::aggregate(OperationKind::GetPaymentUuid, full_reply(), None);
        assert_eq!(result.operation(), OperationKind::GetPaymentUuid);
        assert_eq!(result.transaction_uuid(), Some("uuid-1"));
        assert!(result.is_accepted());
        assert!(result.order().is_none());
    }

    #[test]
    fn test_serialize_omits_absent_slots() {
        let result = NormalizedResult::aggregate(
            OperationKind::CancelPayment,
            full_reply(),
            Some(cookie()),
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "operation": "cancelPayment",
                "common": { "responseCode": 0 }
            })
        );
    }
}
