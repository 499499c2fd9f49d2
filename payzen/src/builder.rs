//! Builders for create requests and transaction queries.

use chrono::{DateTime, Utc};

use crate::proto::{
    CardRequest, CommonRequest, CreatePayment, CustomerRequest, OrderRequest, PaymentRequest,
    QueryRequest, ShoppingCartRequest, TechRequest, ThreeDSRequest,
};

/// Placeholder scheme sent by [`SimplePayment`]; the service re-qualifies
/// the card from its number.
pub const PLACEHOLDER_SCHEME: &str = "VISA";

/// Assembles a [`CreatePayment`] body one group at a time.
///
/// ```rust
/// use payzen::builder::PaymentBuilder;
/// use payzen::proto::{OrderRequest, PaymentRequest};
///
/// let create = PaymentBuilder::new()
///     .payment_source("EC")
///     .order(OrderRequest { order_id: Some("ORD-1".into()), ..Default::default() })
///     .payment(PaymentRequest { amount: Some(1000), currency: Some(978), ..Default::default() })
///     .build();
/// assert_eq!(create.common_request.payment_source.as_deref(), Some("EC"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PaymentBuilder {
    common: CommonRequest,
    order: Option<OrderRequest>,
    payment: Option<PaymentRequest>,
    card: Option<CardRequest>,
    three_ds: Option<ThreeDSRequest>,
    customer: Option<CustomerRequest>,
    tech: Option<TechRequest>,
    shopping_cart: Option<ShoppingCartRequest>,
}

impl PaymentBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the payment source (`EC`, `MOTO`, `CC`, `OTHER`).
    #[must_use]
    pub fn payment_source(mut self, source: impl Into<String>) -> Self {
        self.common.payment_source = Some(source.into());
        self
    }

    /// Sets the submission date.
    #[must_use]
    pub fn submission_date(mut self, date: DateTime<Utc>) -> Self {
        self.common.submission_date = Some(date);
        self
    }

    /// Sets the merchant contract.
    #[must_use]
    pub fn contract_number(mut self, contract: impl Into<String>) -> Self {
        self.common.contract_number = Some(contract.into());
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.common.comment = Some(comment.into());
        self
    }

    /// Sets the order group.
    #[must_use]
    pub fn order(mut self, order: OrderRequest) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the amount group.
    #[must_use]
    pub fn payment(mut self, payment: PaymentRequest) -> Self {
        self.payment = Some(payment);
        self
    }

    /// Sets the card group.
    #[must_use]
    pub fn card(mut self, card: CardRequest) -> Self {
        self.card = Some(card);
        self
    }

    /// Sets the 3-D Secure group.
    #[must_use]
    pub fn three_ds(mut self, three_ds: ThreeDSRequest) -> Self {
        self.three_ds = Some(three_ds);
        self
    }

    /// Sets the customer group.
    #[must_use]
    pub fn customer(mut self, customer: CustomerRequest) -> Self {
        self.customer = Some(customer);
        self
    }

    /// Sets the browser data group.
    #[must_use]
    pub fn tech(mut self, tech: TechRequest) -> Self {
        self.tech = Some(tech);
        self
    }

    /// Sets the shopping cart.
    #[must_use]
    pub fn shopping_cart(mut self, cart: ShoppingCartRequest) -> Self {
        self.shopping_cart = Some(cart);
        self
    }

    /// Produces the `createPayment` body.
    #[must_use]
    pub fn build(self) -> CreatePayment {
        CreatePayment {
            common_request: self.common,
            three_ds_request: self.three_ds,
            payment_request: self.payment,
            order_request: self.order,
            card_request: self.card,
            customer_request: self.customer,
            tech_request: self.tech,
            shopping_cart_request: self.shopping_cart,
        }
    }
}

/// The minimal card payment: order, amount and card.
#[derive(Clone, PartialEq, Eq)]
pub struct SimplePayment {
    /// Merchant order id.
    pub order_id: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// ISO 4217 numeric currency code.
    pub currency: u16,
    /// Card number.
    pub card_number: String,
    /// Expiry month, `1..=12`.
    pub expiry_month: u8,
    /// Four-digit expiry year.
    pub expiry_year: u16,
    /// CVV.
    pub cvv: String,
}

impl std::fmt::Debug for SimplePayment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplePayment")
            .field("order_id", &self.order_id)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("card_number", &"<redacted>")
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvv", &"<redacted>")
            .finish()
    }
}

impl From<SimplePayment> for CreatePayment {
    fn from(simple: SimplePayment) -> Self {
        PaymentBuilder::new()
            .order(OrderRequest {
                order_id: Some(simple.order_id),
                ..OrderRequest::default()
            })
            .payment(PaymentRequest {
                amount: Some(simple.amount),
                currency: Some(simple.currency),
                ..PaymentRequest::default()
            })
            .card(CardRequest {
                number: Some(simple.card_number),
                scheme: Some(PLACEHOLDER_SCHEME.to_owned()),
                expiry_month: Some(simple.expiry_month),
                expiry_year: Some(simple.expiry_year),
                card_security_code: Some(simple.cvv),
                ..CardRequest::default()
            })
            .build()
    }
}

/// Assembles a [`QueryRequest`].
#[derive(Debug, Clone, Default)]
pub struct QueryRequestBuilder {
    query: QueryRequest,
}

impl QueryRequestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transaction UUID.
    #[must_use]
    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.query.uuid = Some(uuid.into());
        self
    }

    /// Sets the order id.
    #[must_use]
    pub fn order_id(mut self, order_id: impl Into<String>) -> Self {
        self.query.order_id = Some(order_id.into());
        self
    }

    /// Sets the subscription id.
    #[must_use]
    pub fn subscription_id(mut self, subscription_id: impl Into<String>) -> Self {
        self.query.subscription_id = Some(subscription_id.into());
        self
    }

    /// Sets the payment token.
    #[must_use]
    pub fn payment_token(mut self, token: impl Into<String>) -> Self {
        self.query.payment_token = Some(token.into());
        self
    }

    /// Produces the query.
    #[must_use]
    pub fn build(self) -> QueryRequest {
        self.query
    }
}
