//! Request groups and per-operation call bodies.
//!
//! Every remote operation takes a fixed set of groups. The call bodies below
//! mirror those sets one to one, and [`RemoteCall`] ties each body to the
//! [`OperationKind`] that interprets its reply.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::OperationKind;

/// Free-form key/value attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraInfo {
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}

/// Parameters shared by every write operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonRequest {
    /// Origin of the payment (`EC`, `MOTO`, `CC`, `OTHER`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_source: Option<String>,

    /// Date the request is submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<DateTime<Utc>>,

    /// Merchant contract to use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_number: Option<String>,

    /// Free comment stored with the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CommonRequest {
    /// A request holding only a comment.
    #[must_use]
    pub fn with_comment(comment: Option<String>) -> Self {
        Self {
            comment,
            ..Self::default()
        }
    }
}

/// Order reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Merchant order id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Extra order data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_info: Vec<ExtraInfo>,
}

/// Amount, currency and capture parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Amount in the smallest currency unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    /// ISO 4217 numeric currency code (`978` for EUR).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<u16>,

    /// When the payment should be captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_capture_date: Option<DateTime<Utc>>,

    /// `1` when the merchant validates the payment manually.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_validation: Option<u8>,

    /// Payment option (instalments, deferred).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_option_code: Option<String>,
}

/// Card data.
///
/// `Debug` masks the number and the security code.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    /// Card number (PAN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,

    /// Card scheme (`VISA`, `MASTERCARD`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    /// Expiry month, `1..=12`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<u8>,

    /// Four-digit expiry year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<u16>,

    /// CVV.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_security_code: Option<String>,

    /// Cardholder birth day, required by some schemes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_holder_birth_day: Option<String>,

    /// Token to pay with instead of a card number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,
}

impl fmt::Debug for CardRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardRequest")
            .field("number", &self.number.as_deref().map(mask_pan))
            .field("scheme", &self.scheme)
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field(
                "card_security_code",
                &self.card_security_code.as_ref().map(|_| "<redacted>"),
            )
            .field("card_holder_birth_day", &self.card_holder_birth_day)
            .field("payment_token", &self.payment_token)
            .finish()
    }
}

fn mask_pan(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= 4 {
        return "****".to_owned();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// How the 3-D Secure step is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreeDSMode {
    /// No verification.
    Disabled,
    /// The service checks enrolment and may return a challenge.
    EnabledCreate,
    /// Completes a pending challenge with the returned PaRes.
    EnabledFinalize,
    /// The merchant ran the verification itself.
    #[serde(rename = "MERCHANT_3DS")]
    Merchant3ds,
}

/// 3-D Secure parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDSRequest {
    /// Verification mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ThreeDSMode>,

    /// Id of the verification request being completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Proof returned by the access control server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pares: Option<String>,

    /// Browser `User-Agent` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_user_agent: Option<String>,

    /// Browser `Accept` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_accept: Option<String>,
}

impl ThreeDSRequest {
    /// Parameters completing a pending challenge.
    #[must_use]
    pub fn finalize(request_id: impl Into<String>, pares: impl Into<String>) -> Self {
        Self {
            mode: Some(ThreeDSMode::EnabledFinalize),
            request_id: Some(request_id.into()),
            pares: Some(pares.into()),
            ..Self::default()
        }
    }
}

/// Billing contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct BillingDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Customer data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    /// Billing contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_details: Option<BillingDetails>,

    /// Shipping contact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_details: Option<BillingDetails>,
}

/// Technical data about the buyer's browser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechRequest {
    /// Browser `User-Agent` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_user_agent: Option<String>,

    /// Browser `Accept` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_accept: Option<String>,
}

/// One line of a shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CartItemInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_qty: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_vat: Option<i64>,
}

/// Shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCartRequest {
    /// Insurance amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_amount: Option<i64>,

    /// Shipping amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_amount: Option<i64>,

    /// Tax amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<i64>,

    /// Cart lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cart_item_info: Vec<CartItemInfo>,
}

/// Identifies an existing transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Transaction UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Merchant order id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Subscription id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    /// Payment token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<String>,
}

impl QueryRequest {
    /// A query by transaction UUID.
    #[must_use]
    pub fn by_uuid(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            ..Self::default()
        }
    }
}

/// Identifies a transaction by its legacy key: id, sequence number and
/// creation date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTransactionKeyRequest {
    /// Six-digit transaction id, unique per shop and day.
    pub transaction_id: String,

    /// Sequence number within the transaction.
    pub sequence_number: u32,

    /// Creation date of the transaction.
    pub creation_date: DateTime<Utc>,
}

impl LegacyTransactionKeyRequest {
    /// Builds a key. `sequence_number` is `1` for a single payment.
    #[must_use]
    pub fn new(
        transaction_id: impl Into<String>,
        creation_date: DateTime<Utc>,
        sequence_number: u32,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            sequence_number,
            creation_date,
        }
    }
}

/// Body of `createPayment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CreatePayment {
    pub common_request: CommonRequest,
    #[serde(
        rename = "threeDSRequest",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub three_ds_request: Option<ThreeDSRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_request: Option<PaymentRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_request: Option<OrderRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_request: Option<CardRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_request: Option<CustomerRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_request: Option<TechRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_cart_request: Option<ShoppingCartRequest>,
}

/// Body of `getPaymentDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct GetPaymentDetails {
    pub query_request: QueryRequest,
}

/// Body of `getPaymentUuid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct GetPaymentUuid {
    pub legacy_transaction_key_request: LegacyTransactionKeyRequest,
}

/// Body of `cancelPayment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CancelPayment {
    pub common_request: CommonRequest,
    pub query_request: QueryRequest,
}

/// Body of `updatePayment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct UpdatePayment {
    pub common_request: CommonRequest,
    pub query_request: QueryRequest,
    pub payment_request: PaymentRequest,
}

/// Body of `validatePayment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ValidatePayment {
    pub common_request: CommonRequest,
    pub query_request: QueryRequest,
}

/// Body of `refundPayment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct RefundPayment {
    pub common_request: CommonRequest,
    pub payment_request: PaymentRequest,
    pub query_request: QueryRequest,
}

/// Body of `createTokenFromTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CreateTokenFromTransaction {
    pub common_request: CommonRequest,
    pub card_request: CardRequest,
    pub query_request: QueryRequest,
}

/// One remote call, ready to be sent.
///
/// Serializes as the bare body of the wrapped operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
#[allow(missing_docs)]
pub enum RemoteCall {
    Create(CreatePayment),
    Details(GetPaymentDetails),
    FindUuid(GetPaymentUuid),
    Cancel(CancelPayment),
    Update(UpdatePayment),
    Validate(ValidatePayment),
    Refund(RefundPayment),
    CreateToken(CreateTokenFromTransaction),
}

impl RemoteCall {
    /// The operation whose fragment table applies to the reply.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Create(_) => OperationKind::CreatePayment,
            Self::Details(_) => OperationKind::GetPaymentDetails,
            Self::FindUuid(_) => OperationKind::GetPaymentUuid,
            Self::Cancel(_) => OperationKind::CancelPayment,
            Self::Update(_) => OperationKind::UpdatePayment,
            Self::Validate(_) => OperationKind::ValidatePayment,
            Self::Refund(_) => OperationKind::RefundPayment,
            Self::CreateToken(_) => OperationKind::CreateTokenFromTransaction,
        }
    }

    /// The remote operation name.
    #[must_use]
    pub const fn remote_name(&self) -> &'static str {
        self.kind().remote_name()
    }

    /// Serializes the call body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if a field cannot be serialized.
    pub fn to_body(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_body_uses_wire_names() {
        let call = RemoteCall::Create(CreatePayment {
            three_ds_request: Some(ThreeDSRequest::finalize("req-1", "PARES")),
            ..CreatePayment::default()
        });
        assert_eq!(
            call.to_body().unwrap(),
            json!({
                "commonRequest": {},
                "threeDSRequest": {
                    "mode": "ENABLED_FINALIZE",
                    "requestId": "req-1",
                    "pares": "PARES"
                }
            })
        );
        assert_eq!(call.remote_name(), "createPayment");
    }

    #[test]
    fn test_cancel_body() {
        let call = RemoteCall::Cancel(CancelPayment {
            common_request: CommonRequest::default(),
            query_request: QueryRequest::by_uuid("u-1"),
        });
        assert_eq!(
            call.to_body().unwrap(),
            json!({ "commonRequest": {}, "queryRequest": { "uuid": "u-1" } })
        );
        assert_eq!(call.kind(), OperationKind::CancelPayment);
    }

    #[test]
    fn test_card_debug_masks_sensitive_fields() {
        let card = CardRequest {
            number: Some("4970100000000003".into()),
            card_security_code: Some("123".into()),
            ..CardRequest::default()
        };
        let debug = format!("{card:?}");
        assert!(debug.contains("****0003"));
        assert!(!debug.contains("4970100000000003"));
        assert!(!debug.contains("\"123\""));
    }

    #[test]
    fn test_three_ds_mode_wire_names() {
        assert_eq!(
            serde_json::to_value(ThreeDSMode::Merchant3ds).unwrap(),
            json!("MERCHANT_3DS")
        );
        assert_eq!(
            serde_json::to_value(ThreeDSMode::EnabledCreate).unwrap(),
            json!("ENABLED_CREATE")
        );
    }
}
