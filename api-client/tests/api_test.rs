mod common;

use api_client::models::analytics::{ChartRange, Period};
use api_client::models::contact::ContactMessage;
use api_client::models::invoice::{InvoiceFilter, InvoiceStatus};
use api_client::models::payment::{CreateSessionRequest, PaymentStatus};
use api_client::models::user::LoginRequest;
use api_client::models::PageQuery;
use api_client::{AppError, SessionStatus};
use chrono::NaiveDate;
use common::{invoice_json, user_json, TestApi};
use secrecy::Secret;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn login_stores_tokens_and_user() {
    let app = TestApi::anonymous().await;

    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .and(body_json(json!({"email": "owner@example.com", "password": "correct-horse"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json(),
            "tokens": {"access": "access-1", "refresh": "refresh-1"}
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let user = app
        .client
        .accounts()
        .login(&LoginRequest::new(
            "owner@example.com",
            Secret::new("correct-horse".into()),
        ))
        .await
        .unwrap();

    assert_eq!(user.display_name(), "Ayesha Khan");
    assert_eq!(app.client.auth().status(), SessionStatus::Authenticated);
    assert_eq!(app.stored_access().as_deref(), Some("access-1"));
    assert_eq!(
        app.client.auth().current_user().await.map(|u| u.id),
        Some(7)
    );
}

#[tokio::test]
async fn bad_credentials_do_not_trigger_refresh() {
    let app = TestApi::anonymous().await;

    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let err = app
        .client
        .accounts()
        .login(&LoginRequest::new("owner@example.com", Secret::new("wrong".into())))
        .await
        .unwrap_err();
    assert_eq!(err.detail(), "Invalid credentials");
}

#[tokio::test]
async fn login_is_validated_before_sending() {
    let app = TestApi::anonymous().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let err = app
        .client
        .accounts()
        .login(&LoginRequest::new("not-an-email", Secret::new("pw".into())))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));
    assert!(err.user_message().contains("Please enter a valid email address"));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    app.client.accounts().logout().await.unwrap();

    assert!(app.store.snapshot().is_none());
    assert_eq!(app.client.auth().status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn invoice_filters_become_query_parameters() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/invoice/"))
        .and(query_param("status", "unpaid"))
        .and(query_param("search", "acme"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 11,
            "next": null,
            "previous": "http://host/api/invoice/?page=1",
            "results": [invoice_json(id)]
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let filter = InvoiceFilter {
        status: Some(InvoiceStatus::Unpaid),
        search: Some("acme".into()),
        page: Some(2),
        ..Default::default()
    };
    let listing = app.client.invoices().list(&filter).await.unwrap();

    assert_eq!(listing.total(), 11);
    assert_eq!(listing.items()[0].id, id);
}

#[tokio::test]
async fn session_creation_omits_absent_optional_fields() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;
    let invoice_id = Uuid::new_v4();
    let payment_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/payment/create-session/"))
        .and(body_json(json!({
            "invoice_id": invoice_id,
            "success_url": "https://app.test/ok",
            "cancel_url": "https://app.test/cancel"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment_id": payment_id,
            "order_id": "5O190127TN364715T"
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let session = app
        .client
        .payments()
        .create_payment_session(&CreateSessionRequest {
            invoice_id,
            success_url: "https://app.test/ok".into(),
            cancel_url: "https://app.test/cancel".into(),
            currency: None,
            gateway_id: None,
        })
        .await
        .unwrap();

    assert_eq!(session.payment_id, Some(payment_id));
    assert_eq!(session.order_id.as_deref(), Some("5O190127TN364715T"));
}

#[tokio::test]
async fn session_error_field_is_a_failure() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("POST"))
        .and(path("/api/payment/create-session/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "Gateway credentials are invalid"})),
        )
        .mount(&app.server)
        .await;

    let err = app
        .client
        .payments()
        .create_payment_session(&CreateSessionRequest {
            invoice_id: Uuid::new_v4(),
            success_url: "https://app.test/ok".into(),
            cancel_url: "https://app.test/cancel".into(),
            currency: Some("usd".into()),
            gateway_id: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.detail(), "Gateway credentials are invalid");
}

#[tokio::test]
async fn status_update_and_capture_send_expected_bodies() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;
    let payment_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path(format!("/api/payment/status/{}/", payment_id)))
        .and(body_json(json!({"status": "completed", "gateway_payment_id": "pi_123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": payment_id, "status": "completed", "gateway_payment_id": "pi_123"
        })))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/payment/capture/{}/", payment_id)))
        .and(body_json(json!({"order_id": "ORDER-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": payment_id, "status": "completed", "gateway_payment_id": "ORDER-1"
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let payments = app.client.payments();
    let updated = payments
        .update_payment_status(payment_id, PaymentStatus::Completed, "pi_123")
        .await
        .unwrap();
    assert_eq!(updated.status, PaymentStatus::Completed);

    let captured = payments.capture_payment(payment_id, "ORDER-1").await.unwrap();
    assert_eq!(captured.gateway_payment_id.as_deref(), Some("ORDER-1"));
}

#[tokio::test]
async fn payment_history_is_paginated() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/payment/all/"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "id": "8a0e8f4c-1c7e-4f7e-9d0a-5d8f3f2b9a11",
                "invoice": "6f1c2a4e-8a7b-4c59-9c89-0d5e2c1f7a10",
                "invoice_number": "INV-0001",
                "gateway_name": "stripe",
                "amount": "110.00",
                "currency": "usd",
                "status": "completed",
                "gateway_payment_id": "pi_123",
                "metadata": {}
            }]
        })))
        .mount(&app.server)
        .await;

    let listing = app
        .client
        .payments()
        .all_payments(&PageQuery::new(1, 20))
        .await
        .unwrap();
    let payments = listing.into_items();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Completed);
}

#[tokio::test]
async fn missing_bank_account_is_none() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/users/bank-account/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&app.server)
        .await;

    assert!(app.client.bank_account().get().await.unwrap().is_none());
}

#[tokio::test]
async fn expense_categories_accept_bare_arrays() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/expense/categories/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Travel", "description": "Flights and taxis"},
            {"id": 2, "name": "Office"}
        ])))
        .mount(&app.server)
        .await;

    let categories = app.client.expenses().categories().await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].name, "Office");
}

#[tokio::test]
async fn profile_refreshes_cached_user() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/users/profile/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(&app.server)
        .await;

    let user = app.client.profile().me().await.unwrap();
    assert_eq!(user.currency().symbol(), "Rs ");
    let stored = app.store.snapshot().unwrap();
    assert_eq!(stored.user.map(|u| u.email).as_deref(), Some("owner@example.com"));
}

#[tokio::test]
async fn dashboard_passes_date_range() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/users/dashboard/"))
        .and(query_param("range_type", "last_30_days"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stats": {"total_income": 1500.5, "total_expenses": 300, "balance": 1200.5,
                      "income_trend": 12.5, "expense_trend": -3.0, "balance_trend": 20.1},
            "recent_invoices": [],
            "recent_expenses": []
        })))
        .mount(&app.server)
        .await;

    let range = api_client::models::dashboard::DateRange {
        range_type: Some("last_30_days".into()),
        ..Default::default()
    };
    let dashboard = app.client.dashboard().get(Some(&range)).await.unwrap();
    assert_eq!(dashboard.stats.total_expenses.to_string(), "300");
}

#[tokio::test]
async fn income_expenses_sends_range_and_period() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/analytic/income-expenses/"))
        .and(query_param("range", "6months"))
        .and(query_param("start_date", "2024-01-01"))
        .and(query_param("end_date", "2024-02-29"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range_type": "6months",
            "start_date": "2024-01-01",
            "end_date": "2024-02-29",
            "data": [
                {"date": "2024-01-01", "label": "Jan 2024", "income": 900, "expenses": 150.5, "net": 749.5},
                {"date": "2024-02-01", "label": "Feb 2024", "income": 100, "expenses": 0, "net": 100}
            ]
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let period = Period::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
    );
    let report = app
        .client
        .analytics()
        .income_expenses(Some(ChartRange::SixMonths), Some(period))
        .await
        .unwrap();

    assert_eq!(report.data.len(), 2);
    assert_eq!(report.data[0].label, "Jan 2024");
    assert_eq!(report.total_income().to_string(), "1000");
}

#[tokio::test]
async fn invalid_chart_range_surfaces_server_error() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/analytic/income-expenses/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid range type"})))
        .mount(&app.server)
        .await;

    let err = app
        .client
        .analytics()
        .income_expenses(None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));
    assert_eq!(err.detail(), "Invalid range type");
}

#[tokio::test]
async fn status_breakdown_and_top_categories_decode() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("GET"))
        .and(path("/api/analytic/invoice-status-breakdown/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"status": "paid", "count": 4, "total": 2200.0},
            {"status": "unpaid", "count": 1, "total": 0}
        ])))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytic/top-expense-categories/"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"category": "Travel", "total": 500.0},
            {"category": "Office", "total": 120.0},
            {"category": "Others", "total": 45.5}
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let analytics = app.client.analytics();
    let breakdown = analytics.invoice_status_breakdown(None).await.unwrap();
    assert_eq!(breakdown[0].status, InvoiceStatus::Paid);
    assert_eq!(breakdown[0].count, 4);

    let categories = analytics.top_expense_categories(2, None).await.unwrap();
    assert_eq!(categories.len(), 3);
    assert!(!categories[0].is_others());
    assert!(categories[2].is_others());
}

#[tokio::test]
async fn upcoming_payments_and_growth_rate_decode() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;
    let invoice_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/analytic/upcoming-payments/"))
        .and(query_param("days", "14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "invoice_id": invoice_id,
            "invoice_number": "INV-0007",
            "client_id": "0b7d6f0e-5a39-4b8e-9c57-3f0f0b3c2d11",
            "client_name": "Acme Traders",
            "amount": 110.0,
            "due_date": "2024-06-10",
            "days_until_due": 3,
            "status": "unpaid"
        }])))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analytic/growth-rate/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_month_revenue": 1500.0,
            "previous_month_revenue": 1200.0,
            "growth_rate": 25.0,
            "is_positive": true,
            "current_month": "June 2024",
            "previous_month": "May 2024"
        })))
        .mount(&app.server)
        .await;

    let analytics = app.client.analytics();
    let upcoming = analytics.upcoming_payments(14).await.unwrap();
    assert_eq!(upcoming[0].invoice_id, invoice_id);
    assert_eq!(upcoming[0].days_until_due, 3);
    assert_eq!(upcoming[0].status, InvoiceStatus::Unpaid);

    let growth = analytics.growth_rate().await.unwrap();
    assert!(growth.is_positive);
    assert_eq!(growth.growth_rate.to_string(), "25");
    assert_eq!(growth.previous_month, "May 2024");
}

#[tokio::test]
async fn contact_form_is_sent_without_credentials() {
    let app = TestApi::signed_in("access-1", Some("refresh-1")).await;

    Mock::given(method("POST"))
        .and(path("/api/users/contact/"))
        .and(body_json(json!({
            "name": "Sara",
            "email": "sara@example.com",
            "subject": "Billing",
            "message": "Can I pay in USD?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Your message has been sent successfully. We will get back to you soon."
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let receipt = app
        .client
        .contact()
        .send(&ContactMessage {
            name: "Sara".into(),
            email: "sara@example.com".into(),
            subject: "Billing".into(),
            message: "Can I pay in USD?".into(),
        })
        .await
        .unwrap();
    assert!(receipt.success);

    let requests = app.server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn incomplete_contact_form_is_rejected_locally() {
    let app = TestApi::anonymous().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let err = app
        .client
        .contact()
        .send(&ContactMessage {
            name: "Sara".into(),
            email: "sara@example.com".into(),
            subject: String::new(),
            message: "Hello".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest { .. }));
}
