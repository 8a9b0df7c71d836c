mod common;

use payment_client::adapters::{
    CardDetails, CardInput, PaymentIntent, StripeRestLoader, StripeSdk, StripeSdkError, StripeSdkLoader,
};
use payment_client::BillingDetails;
use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn billing() -> BillingDetails {
    BillingDetails {
        name: "Acme Traders".into(),
        email: "accounts@acme.test".into(),
    }
}

#[tokio::test]
async fn confirms_intent_with_saved_payment_method() {
    common::init_tracing();
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payment_intents/pi_123/confirm"))
        .and(header("authorization", "Bearer pk_test_123"))
        .and(body_string_contains("client_secret=pi_123_secret_abc"))
        .and(body_string_contains("payment_method=pm_card_visa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "object": "payment_intent",
            "status": "succeeded"
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let sdk = StripeRestLoader::new(stripe.uri()).load("pk_test_123").await.unwrap();
    let intent = sdk
        .confirm_card_payment(
            "pi_123_secret_abc",
            &CardInput::PaymentMethod("pm_card_visa".into()),
            &billing(),
        )
        .await
        .unwrap();

    assert_eq!(
        intent,
        PaymentIntent {
            id: "pi_123".into(),
            status: "succeeded".into()
        }
    );
}

#[tokio::test]
async fn raw_card_fields_are_form_encoded() {
    common::init_tracing();
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payment_intents/pi_9/confirm"))
        .and(body_string_contains("payment_method_data%5Btype%5D=card"))
        .and(body_string_contains("payment_method_data%5Bcard%5D%5Bexp_month%5D=12"))
        .and(body_string_contains("payment_method_data%5Bbilling_details%5D%5Bemail%5D=accounts%40acme.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "pi_9", "status": "processing"})))
        .expect(1)
        .mount(&stripe)
        .await;

    let sdk = StripeRestLoader::new(stripe.uri()).load("pk_test_123").await.unwrap();
    let card = CardInput::Card(CardDetails {
        number: Secret::new("4242424242424242".into()),
        exp_month: 12,
        exp_year: 2030,
        cvc: Secret::new("123".into()),
    });

    let intent = sdk.confirm_card_payment("pi_9_secret_x", &card, &billing()).await.unwrap();

    assert_eq!(intent.status, "processing");
}

#[tokio::test]
async fn card_errors_keep_code_and_message() {
    common::init_tracing();
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payment_intents/pi_123/confirm"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {
                "type": "card_error",
                "code": "card_declined",
                "message": "Your card was declined."
            }
        })))
        .mount(&stripe)
        .await;

    let sdk = StripeRestLoader::new(stripe.uri()).load("pk_test_123").await.unwrap();
    let err = sdk
        .confirm_card_payment(
            "pi_123_secret_abc",
            &CardInput::PaymentMethod("pm_card_chargeDeclined".into()),
            &billing(),
        )
        .await
        .unwrap_err();

    match err {
        StripeSdkError::Api { code, message } => {
            assert_eq!(code.as_deref(), Some("card_declined"));
            assert_eq!(message.as_deref(), Some("Your card was declined."));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn non_json_failure_is_a_transport_error() {
    common::init_tracing();
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&stripe)
        .await;

    let sdk = StripeRestLoader::new(stripe.uri()).load("pk_test_123").await.unwrap();
    let err = sdk
        .confirm_card_payment("pi_1_secret_2", &CardInput::PaymentMethod("pm_card_visa".into()), &billing())
        .await
        .unwrap_err();

    assert!(matches!(err, StripeSdkError::Transport(_)));
}

#[tokio::test]
async fn empty_publishable_key_does_not_load() {
    let result = StripeRestLoader::default().load("  ").await;
    assert!(matches!(result, Err(StripeSdkError::Load(_))));
}
