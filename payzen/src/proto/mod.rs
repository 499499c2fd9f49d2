//! Wire format types for the PayZen web services.
//!
//! Requests and replies travel as camelCase JSON. Each remote operation takes
//! a body made of request groups and answers with a set of response
//! fragments; a fragment the service did not send is simply absent.
//!
//! # Modules
//!
//! - [`request`] - Request groups and the per-operation call bodies
//! - [`response`] - Response fragments and the [`ResponseFragments`] envelope

pub mod request;
pub mod response;

pub use request::{
    BillingDetails, CancelPayment, CardRequest, CartItemInfo, CommonRequest, CreatePayment,
    CreateTokenFromTransaction, CustomerRequest, ExtraInfo, GetPaymentDetails, GetPaymentUuid,
    LegacyTransactionKeyRequest, OrderRequest, PaymentRequest, QueryRequest, RefundPayment,
    RemoteCall, ShoppingCartRequest, TechRequest, ThreeDSMode, ThreeDSRequest, UpdatePayment,
    ValidatePayment,
};
pub use response::{
    AuthenticationRequestData, AuthenticationResultData, AuthorizationResponse, CaptureResponse,
    CardResponse, CommonResponse, CustomerResponse, ExtraResponse, FraudManagementResponse,
    MarkResponse, OrderResponse, PaymentResponse, ResponseFragments, RiskControl,
    ShoppingCartResponse, SubscriptionResponse, ThreeDSResponse, TokenResponse,
};
