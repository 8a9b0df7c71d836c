use anyhow::Context;
use api_client::auth::FileTokenStore;
use api_client::models::user::LoginRequest;
use api_client::{ApiClient, AuthContext, SessionStatus};
use payment_client::adapters::{PromptButtons, StaticCardForm, StripeRestLoader};
use payment_client::config::Settings;
use payment_client::{CheckoutFlow, CheckoutOutcome, PayOptions};
use service_core::observability::init_tracing;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let invoice_id: Uuid = std::env::args()
        .nth(1)
        .context("usage: pay-invoice <invoice-id>")?
        .parse()
        .context("invoice id must be a UUID")?;

    let settings = Settings::load().context("Failed to load configuration")?;
    init_tracing("pay-invoice", &settings.log_level);

    let store = Arc::new(FileTokenStore::new(&settings.session.token_file));
    let auth = Arc::new(AuthContext::restore(store).await?);
    let api = ApiClient::new(settings.api.clone(), Arc::clone(&auth))?;

    if !auth.is_authenticated().await {
        let (Some(email), Some(password)) = (settings.session.email.clone(), settings.session.password.clone()) else {
            anyhow::bail!("Not signed in. Set APP_SESSION__EMAIL and APP_SESSION__PASSWORD to log in.");
        };
        api.accounts()
            .login(&LoginRequest::new(email, password))
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    }

    let mut status = auth.subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            if *status.borrow() == SessionStatus::Expired {
                tracing::warn!("Session expired; sign in again to continue");
            }
        }
    });

    let invoice = api
        .invoices()
        .get(invoice_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    if invoice.is_paid() {
        println!("Invoice {} is already paid.", invoice.invoice_number);
        return Ok(());
    }

    let card_form = match settings.stripe.payment_method.clone() {
        Some(method) => StaticCardForm::payment_method(method),
        None => StaticCardForm::empty(),
    };
    let flow = CheckoutFlow::new(
        api.clone(),
        Arc::new(StripeRestLoader::new(settings.stripe.api_base.clone())),
        Arc::new(card_form),
        Arc::new(PromptButtons::new(settings.paypal.approval_base.clone())),
    );

    let return_url = format!(
        "{}/invoices/{}",
        settings.checkout.origin.trim_end_matches('/'),
        invoice.id
    );
    let mut options = PayOptions::new(return_url);
    if let Some(currency) = settings.checkout.currency() {
        options = options.with_currency(currency);
    }

    let mut outcome = flow.pay(&invoice, &options).await;
    if let CheckoutOutcome::CapturedButUnconfirmed(pending) = &outcome {
        println!("{}", outcome.message());
        outcome = flow.retry_confirmation(pending).await;
    }

    println!("{}", outcome.title());
    println!("{}", outcome.message());

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
