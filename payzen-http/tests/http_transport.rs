//! [`HttpClientFactory`] against a mock PayZen endpoint.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use payzen::proto::{GetPaymentDetails, LegacyTransactionKeyRequest, QueryRequest, RemoteCall};
use payzen::signer::auth_token;
use payzen::{
    CallOptions, CallSettings, ChallengeResponse, ClientFactory, ConfigOverride,
    ConfigurationError, Credentials, Mode, Payment, PaymentPort, PayzenError, SdkConfig,
    SessionCookie, SimplePayment, TransportError,
};
use payzen_http::HttpClientFactory;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn config(server: &MockServer) -> SdkConfig {
    SdkConfig {
        shop_id: Some("12345678".into()),
        shop_key: Some("1111111111111111".into()),
        endpoint: format!("{}/vads-ws/v5", server.uri()),
        ..SdkConfig::default()
    }
}

fn header_value<'a>(request: &'a Request, name: &str) -> &'a str {
    request
        .headers
        .get(name)
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_str()
        .unwrap()
}

fn accepted() -> Value {
    json!({ "commonResponse": { "responseCode": 0 } })
}

fn simple(order_id: &str) -> SimplePayment {
    SimplePayment {
        order_id: order_id.into(),
        amount: 1000,
        currency: 978,
        card_number: "4970100000000003".into(),
        expiry_month: 12,
        expiry_year: 2030,
        cvv: "123".into(),
    }
}

#[tokio::test]
async fn requests_carry_a_verifiable_signature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/getPaymentDetails"))
        .and(header("shopId", "12345678"))
        .and(header("mode", "TEST"))
        .and(header("Content-Type", "application/json"))
        .and(header_exists("requestId"))
        .and(header_exists("timestamp"))
        .and(header_exists("authToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "commonResponse": { "responseCode": 0 },
            "paymentResponse": { "transactionUuid": "b5e4c2a1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payment = Payment::new(config(&server), HttpClientFactory::new().unwrap());
    let result = payment.details("b5e4c2a1", CallOptions::new()).await.unwrap();
    assert_eq!(result.transaction_uuid(), Some("b5e4c2a1"));
    assert!(result.is_accepted());

    let received = server.received_requests().await.unwrap();
    let request = &received[0];
    let token = auth_token(
        "1111111111111111",
        header_value(request, "requestId"),
        header_value(request, "timestamp"),
    )
    .unwrap();
    assert_eq!(header_value(request, "authToken"), token);
    assert!(request.headers.get("shopKey").is_none());

    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["queryRequest"]["uuid"], "b5e4c2a1");
}

#[tokio::test]
async fn each_request_draws_a_fresh_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/getPaymentDetails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(2)
        .mount(&server)
        .await;

    let payment = Payment::new(config(&server), HttpClientFactory::new().unwrap());
    payment.details("u-1", CallOptions::new()).await.unwrap();
    payment.details("u-1", CallOptions::new()).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_ne!(
        header_value(&received[0], "requestId"),
        header_value(&received[1], "requestId")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_sign_with_their_own_shop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/createPayment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(12)
        .mount(&server)
        .await;

    let payment = Arc::new(Payment::new(
        config(&server),
        HttpClientFactory::new().unwrap(),
    ));
    let mut tasks = Vec::new();
    for i in 0..12 {
        let payment = Arc::clone(&payment);
        tasks.push(tokio::spawn(async move {
            let overrides = ConfigOverride::new()
                .with("shopId", format!("1000000{i:02}"))
                .with("shopKey", format!("key-{i}"));
            payment
                .create(
                    simple(&format!("ORD-{i}")),
                    CallOptions::new().with_overrides(&overrides),
                )
                .await
                .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 12);
    let mut seen = HashSet::new();
    for request in &received {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let order_id = body["orderRequest"]["orderId"].as_str().unwrap().to_owned();
        let i: usize = order_id.trim_start_matches("ORD-").parse().unwrap();
        assert_eq!(header_value(request, "shopId"), format!("1000000{i:02}"));
        let token = auth_token(
            &format!("key-{i}"),
            header_value(request, "requestId"),
            header_value(request, "timestamp"),
        )
        .unwrap();
        assert_eq!(header_value(request, "authToken"), token);
        seen.insert(order_id);
    }
    assert_eq!(seen.len(), 12);
}

#[tokio::test]
async fn challenge_flow_replays_the_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/createPayment"))
        .and(body_partial_json(json!({
            "threeDSRequest": { "mode": "ENABLED_FINALIZE", "requestId": "3ds-req-9" }
        })))
        .and(header("Cookie", "JSESSIONID=7F3A9C.node1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "commonResponse": { "responseCode": 0 },
            "paymentResponse": { "transactionUuid": "tx-1" },
            "cardResponse": { "number": "497010XXXXXX0003" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/createPayment"))
        .and(body_partial_json(json!({ "orderRequest": { "orderId": "ORD-3DS" } })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "JSESSIONID=7F3A9C.node1; Path=/vads-ws; HttpOnly")
                .set_body_json(json!({
                    "commonResponse": { "responseCode": 0 },
                    "threeDSResponse": {
                        "authenticationRequestData": {
                            "threeDSAcsUrl": "https://acs.example.test/pareq",
                            "threeDSEncodedPareq": "eJzVWNmu",
                            "threeDSEnrolled": "Y",
                            "threeDSRequestId": "3ds-req-9"
                        }
                    }
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let payment = Payment::new(config(&server), HttpClientFactory::new().unwrap());
    let first = payment
        .create(simple("ORD-3DS"), CallOptions::new())
        .await
        .unwrap();
    assert_eq!(
        first.session_cookie(),
        Some(&SessionCookie::new("JSESSIONID=7F3A9C.node1"))
    );
    let redirect = first.acs_redirect().expect("verification pending");
    assert_eq!(redirect.acs_url, "https://acs.example.test/pareq");
    assert_eq!(redirect.md.as_str(), "JSESSIONID=7F3A9C.node1+3ds-req-9");

    let second = payment
        .complete_challenge(
            ChallengeResponse::new("PARES-FROM-ACS", redirect.md),
            CallOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(second.transaction_uuid(), Some("tx-1"));
    assert!(second.card().is_some());
    assert!(second.redirect_md().is_none());
}

#[tokio::test]
async fn non_success_status_maps_to_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/cancelPayment"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let payment = Payment::new(config(&server), HttpClientFactory::new().unwrap());
    let err = payment.cancel("u-1", CallOptions::new()).await.unwrap_err();
    match err {
        PayzenError::Transport(TransportError::Status {
            operation,
            status,
            body,
        }) => {
            assert_eq!(operation, "cancelPayment");
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_reply_maps_to_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/validatePayment"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<soap:Envelope/>"))
        .mount(&server)
        .await;

    let payment = Payment::new(config(&server), HttpClientFactory::new().unwrap());
    let err = payment
        .validate("u-1", None, CallOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PayzenError::Transport(TransportError::Decode { operation: "validatePayment", .. })
    ));
}

#[tokio::test]
async fn unreachable_endpoint_maps_to_request_error() {
    let server = MockServer::start().await;
    let endpoint = format!("{}/vads-ws/v5", server.uri());
    drop(server);

    let credentials = Credentials::new("12345678", "1111111111111111", Mode::Test).unwrap();
    let settings = CallSettings::new(credentials, endpoint.parse().unwrap());
    let port = HttpClientFactory::new().unwrap().build(settings).unwrap();
    let call = RemoteCall::Details(GetPaymentDetails {
        query_request: QueryRequest::by_uuid("u-1"),
    });
    let err = port.call(&call, None).await.unwrap_err();
    assert!(matches!(
        err,
        TransportError::Request { operation: "getPaymentDetails", .. }
    ));
}

#[tokio::test]
async fn caller_headers_are_sent_without_replacing_the_signature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/getPaymentUuid"))
        .and(header("X-Correlation-Id", "corr-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(1)
        .mount(&server)
        .await;

    let payment = Payment::new(config(&server), HttpClientFactory::new().unwrap());
    let options = CallOptions::new()
        .with_header("X-Correlation-Id", "corr-7")
        .with_header("authToken", "forged");
    let key = LegacyTransactionKeyRequest::new(
        "123456",
        Utc.with_ymd_and_hms(2024, 5, 6, 10, 0, 0).unwrap(),
        1,
    );
    payment.find_uuid(key, options).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let request = &received[0];
    let token = auth_token(
        "1111111111111111",
        header_value(request, "requestId"),
        header_value(request, "timestamp"),
    )
    .unwrap();
    assert_eq!(header_value(request, "authToken"), token);
}

#[tokio::test]
async fn header_unfit_override_fails_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(0)
        .mount(&server)
        .await;

    let payment = Payment::new(config(&server), HttpClientFactory::new().unwrap());
    let overrides = ConfigOverride::new().with("wsUser", "bad\nuser");
    let err = payment
        .details("u-1", CallOptions::new().with_overrides(&overrides))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PayzenError::Configuration(ConfigurationError::InvalidValue { field: "wsUser", .. })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn any_success_status_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/refundPayment"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "commonResponse": { "responseCode": 0 },
            "paymentResponse": { "transactionUuid": "rf-1" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vads-ws/v5/cancelPayment"))
        .respond_with(ResponseTemplate::new(409).set_body_string("already cancelled"))
        .mount(&server)
        .await;

    let payment = Payment::new(config(&server), HttpClientFactory::new().unwrap());
    let refund = payzen::Refund {
        uuid: "tx-1".into(),
        amount: 500,
        currency: 978,
        comment: None,
    };
    let result = payment.refund(refund, CallOptions::new()).await.unwrap();
    assert_eq!(result.transaction_uuid(), Some("rf-1"));

    let err = payment.cancel("tx-1", CallOptions::new()).await.unwrap_err();
    assert!(matches!(
        err,
        PayzenError::Transport(TransportError::Status { status: 409, .. })
    ));
}
