//! Invoice payment orchestration.
//!
//! The flow for paying an invoice:
//!
//! 1. [`GatewayResolver`] asks the backend whether the invoice owner has a
//!    gateway and which one.
//! 2. [`SessionCoordinator`] creates a payment session (de-duplicated per
//!    invoice).
//! 3. A [`CheckoutAdapter`] drives the gateway: Stripe card confirmation or
//!    PayPal approval and capture.
//! 4. [`Reconciler`] records the outcome on the backend before success is
//!    reported.
//!
//! [`CheckoutFlow`] ties the steps together for a UI; [`HostedCheckout`]
//! covers the redirect-based public payment page.

pub mod adapters;
pub mod checkout;
pub mod config;
pub mod gateway;
pub mod reconcile;
pub mod redirect;
pub mod session;
pub mod state;

pub use adapters::{BillingDetails, CheckoutAdapter, CheckoutRequest};
pub use checkout::{CheckoutFlow, CheckoutOutcome, CheckoutView, PayOptions, PaymentSummary};
pub use gateway::{Gateway, GatewayAvailability, GatewayResolver};
pub use reconcile::Reconciler;
pub use redirect::{can_pay_now, HostedCheckout, HostedSession, ReturnOutcome};
pub use session::{PaymentSession, PlatformFee, SessionCoordinator, SessionRequest};
pub use state::{CheckoutError, CheckoutState, PaymentReceipt, PendingReconciliation};
