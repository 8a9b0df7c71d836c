use super::invoice::InvoiceStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Predefined chart windows understood by `/analytic/income-expenses/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartRange {
    /// Last 30 days, grouped by day.
    Daily,
    /// Last 12 weeks, grouped by week.
    Weekly,
    /// Last 6 months, grouped by month.
    Monthly,
    #[serde(rename = "6months")]
    SixMonths,
    /// Last year, grouped by year.
    Yearly,
}

/// Custom reporting window. The backend ignores one without the other,
/// so both ends are always sent together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct AnalyticsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<ChartRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}

impl AnalyticsQuery {
    pub fn within(period: Option<Period>) -> Self {
        Self {
            start_date: period.map(|p| p.start),
            end_date: period.map(|p| p.end),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomeExpensePoint {
    pub date: NaiveDate,
    /// Human label for the bucket, e.g. `May 2024` or `Week 19 (06 May - 12 May)`.
    pub label: String,
    #[serde(default)]
    pub income: Decimal,
    #[serde(default)]
    pub expenses: Decimal,
    #[serde(default)]
    pub net: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomeExpenses {
    /// The requested range, or the grouping picked for a custom period.
    pub range_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub data: Vec<IncomeExpensePoint>,
}

impl IncomeExpenses {
    pub fn total_income(&self) -> Decimal {
        self.data.iter().map(|p| p.income).sum()
    }

    pub fn total_expenses(&self) -> Decimal {
        self.data.iter().map(|p| p.expenses).sum()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusBreakdown {
    pub status: InvoiceStatus,
    pub count: u64,
    #[serde(default)]
    pub total: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    #[serde(default)]
    pub total: Decimal,
}

impl CategoryTotal {
    pub const OTHERS: &'static str = "Others";

    /// True for the trailing bucket that sums everything past the limit.
    pub fn is_others(&self) -> bool {
        self.category == Self::OTHERS
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpcomingPayment {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub client_id: Uuid,
    pub client_name: String,
    #[serde(default)]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub days_until_due: i64,
    pub status: InvoiceStatus,
}

/// Month-over-month revenue from paid invoices.
#[derive(Debug, Clone, Deserialize)]
pub struct GrowthRate {
    #[serde(default)]
    pub current_month_revenue: Decimal,
    #[serde(default)]
    pub previous_month_revenue: Decimal,
    /// Percent, rounded to two places. 100 when last month had no revenue.
    #[serde(default)]
    pub growth_rate: Decimal,
    pub is_positive: bool,
    pub current_month: String,
    pub previous_month: String,
}
