//! Response fragments.
//!
//! A reply is a set of independent fragments. [`ResponseFragments`] is the
//! superset envelope every reply decodes into; which of its slots an
//! operation may fill is decided by
//! [`OperationKind::fragments`](crate::OperationKind::fragments).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::{BillingDetails, CartItemInfo, ExtraInfo};

/// Outcome common to every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonResponse {
    /// `0` on success, a positive error code otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<i32>,

    /// Human-readable detail of the response code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code_detail: Option<String>,

    /// Transaction status (`AUTHORISED`, `CAPTURED`, `REFUSED`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_status_label: Option<String>,

    /// Shop the transaction belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<String>,

    /// Origin of the payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_source: Option<String>,

    /// Date the request was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<DateTime<Utc>>,

    /// Merchant contract used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,

    /// Token linked to the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,
}

/// Order echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    /// Merchant order id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Extra order data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_info: Vec<ExtraInfo>,
}

/// Transaction data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    /// Six-digit transaction id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Transaction UUID, the key of every follow-up operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_uuid: Option<String>,

    /// Sequence number within the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,

    /// Requested amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    /// Requested currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<u16>,

    /// Amount actually charged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_amount: Option<i64>,

    /// Currency actually charged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_currency: Option<u16>,

    /// Planned capture date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_capture_date: Option<DateTime<Utc>>,

    /// `1` when the payment waits for manual validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_validation: Option<u8>,

    /// `0` for a debit, `1` for a credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<u8>,

    /// Creation date of the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,

    /// Reference on the acquirer side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_transaction_id: Option<String>,

    /// Whether liability moved to the issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liability_shift: Option<String>,

    /// `SINGLE`, `INSTALLMENT`, `SPLIT` or `SUBSCRIPTION`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,

    /// Payment error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_error: Option<i32>,
}

/// Card data as stored by the service; the number is masked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CardResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<u16>,
}

/// Authorization outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResponse {
    /// `FULL` or `MARK`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Authorized amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    /// Authorized currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<u16>,

    /// Authorization date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,

    /// Authorization number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    /// Acquirer result code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<i32>,
}

/// Capture state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CaptureResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliation_status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_currency: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chargeback: Option<bool>,
}

/// Customer echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    /// Billing contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_details: Option<BillingDetails>,

    /// Shipping contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_details: Option<BillingDetails>,
}

/// Options attached to the payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraResponse {
    /// Payment option code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_option_code: Option<String>,

    /// Instalment occurrence number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_option_occ_number: Option<u32>,
}

/// Challenge to forward to the access control server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequestData {
    /// Access control server URL the browser must post to.
    #[serde(
        rename = "threeDSAcsUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub three_ds_acs_url: Option<String>,

    /// Brand running the verification.
    #[serde(
        rename = "threeDSBrand",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub three_ds_brand: Option<String>,

    /// PaReq to post to the access control server.
    #[serde(
        rename = "threeDSEncodedPareq",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub three_ds_encoded_pareq: Option<String>,

    /// Enrolment status (`Y`, `N`, `U`).
    #[serde(
        rename = "threeDSEnrolled",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub three_ds_enrolled: Option<String>,

    /// Id of the verification request; half of the MD.
    #[serde(
        rename = "threeDSRequestId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub three_ds_request_id: Option<String>,
}

/// Outcome of a completed verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct AuthenticationResultData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eci: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cavv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cavv_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_valid: Option<String>,
}

/// 3-D Secure state of the payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDSResponse {
    /// Present when a challenge is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_request_data: Option<AuthenticationRequestData>,

    /// Present once the verification ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_result_data: Option<AuthenticationResultData>,
}

impl ThreeDSResponse {
    /// The id of the pending verification request, if any.
    #[must_use]
    pub fn pending_request_id(&self) -> Option<&str> {
        self.authentication_request_data
            .as_ref()
            .and_then(|data| data.three_ds_request_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Token created from a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_date: Option<DateTime<Utc>>,
}

/// Shopping cart echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCartResponse {
    /// Cart lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cart_item_info: Vec<CartItemInfo>,
}

/// Result of one risk control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct RiskControl {
    pub name: String,
    pub result: String,
}

/// Fraud screening results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudManagementResponse {
    /// Individual risk controls.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_control: Vec<RiskControl>,

    /// Overall assessment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<String>,
}

/// Card mark (zero-amount authorization) outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct MarkResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<i32>,
}

/// Subscription attached to the transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SubscriptionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Every fragment any reply can carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ResponseFragments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_response: Option<CommonResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_response: Option<OrderResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_response: Option<PaymentResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_response: Option<CardResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_response: Option<AuthorizationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_response: Option<CaptureResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_response: Option<CustomerResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_response: Option<ExtraResponse>,
    #[serde(
        rename = "threeDSResponse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub three_ds_response: Option<ThreeDSResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_response: Option<TokenResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_cart_response: Option<ShoppingCartResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_management_response: Option<FraudManagementResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_response: Option<MarkResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_response: Option<SubscriptionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_partial_reply() {
        let reply: ResponseFragments = serde_json::from_value(json!({
            "commonResponse": { "responseCode": 0, "transactionStatusLabel": "AUTHORISED" },
            "paymentResponse": { "transactionUuid": "9f1c", "amount": 1000, "currency": 978 },
            "threeDSResponse": {
                "authenticationRequestData": {
                    "threeDSAcsUrl": "https://acs.example/pareq",
                    "threeDSRequestId": "3ds-1"
                }
            },
            "somethingNew": { "ignored": true }
        }))
        .unwrap();

        assert_eq!(reply.common_response.unwrap().response_code, Some(0));
        assert_eq!(
            reply.payment_response.unwrap().transaction_uuid.as_deref(),
            Some("9f1c")
        );
        assert_eq!(
            reply.three_ds_response.unwrap().pending_request_id(),
            Some("3ds-1")
        );
        assert!(reply.card_response.is_none());
    }

    #[test]
    fn test_pending_request_id_ignores_empty() {
        let response = ThreeDSResponse {
            authentication_request_data: Some(AuthenticationRequestData {
                three_ds_request_id: Some(String::new()),
                ..AuthenticationRequestData::default()
            }),
            authentication_result_data: None,
        };
        assert_eq!(response.pending_request_id(), None);
    }
}
