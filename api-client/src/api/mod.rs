//! Resource endpoints, exposed as borrowed views over [`ApiClient`].

mod analytics;
mod auth;
mod bank_account;
mod clients;
mod contact;
mod dashboard;
mod expenses;
mod invoices;
mod payments;
mod profile;

pub use analytics::AnalyticsApi;
pub use auth::AuthApi;
pub use bank_account::BankAccountApi;
pub use clients::ClientsApi;
pub use contact::ContactApi;
pub use dashboard::DashboardApi;
pub use expenses::ExpensesApi;
pub use invoices::InvoicesApi;
pub use payments::PaymentsApi;
pub use profile::ProfileApi;

use crate::ApiClient;

impl ApiClient {
    pub fn accounts(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn invoices(&self) -> InvoicesApi<'_> {
        InvoicesApi::new(self)
    }

    pub fn expenses(&self) -> ExpensesApi<'_> {
        ExpensesApi::new(self)
    }

    pub fn clients(&self) -> ClientsApi<'_> {
        ClientsApi::new(self)
    }

    pub fn payments(&self) -> PaymentsApi<'_> {
        PaymentsApi::new(self)
    }

    pub fn bank_account(&self) -> BankAccountApi<'_> {
        BankAccountApi::new(self)
    }

    pub fn profile(&self) -> ProfileApi<'_> {
        ProfileApi::new(self)
    }

    pub fn dashboard(&self) -> DashboardApi<'_> {
        DashboardApi::new(self)
    }

    pub fn analytics(&self) -> AnalyticsApi<'_> {
        AnalyticsApi::new(self)
    }

    pub fn contact(&self) -> ContactApi<'_> {
        ContactApi::new(self)
    }
}
