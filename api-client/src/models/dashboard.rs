use super::invoice::InvoiceStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_income: Decimal,
    #[serde(default)]
    pub total_expenses: Decimal,
    #[serde(default)]
    pub balance: Decimal,
    /// Percent change against the previous period.
    #[serde(default)]
    pub income_trend: Decimal,
    #[serde(default)]
    pub expense_trend: Decimal,
    #[serde(default)]
    pub balance_trend: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentInvoice {
    pub id: Uuid,
    pub invoice_number: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub total: Decimal,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentExpense {
    pub id: Uuid,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub stats: DashboardStats,
    #[serde(default)]
    pub recent_invoices: Vec<RecentInvoice>,
    #[serde(default)]
    pub recent_expenses: Vec<RecentExpense>,
}

/// Optional reporting window, e.g. `range_type = "last_30_days"`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_type: Option<String>,
}
