use crate::models::analytics::{
    AnalyticsQuery, CategoryTotal, ChartRange, GrowthRate, IncomeExpenses, Period,
    StatusBreakdown, UpcomingPayment,
};
use crate::ApiClient;
use service_core::error::AppError;

/// Chart data and insights for the signed-in user.
pub struct AnalyticsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AnalyticsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// A custom `period` takes precedence over `range` on the backend.
    pub async fn income_expenses(
        &self,
        range: Option<ChartRange>,
        period: Option<Period>,
    ) -> Result<IncomeExpenses, AppError> {
        let query = AnalyticsQuery {
            range,
            ..AnalyticsQuery::within(period)
        };
        self.client
            .get_with_query("/analytic/income-expenses/", &query)
            .await
    }

    pub async fn invoice_status_breakdown(
        &self,
        period: Option<Period>,
    ) -> Result<Vec<StatusBreakdown>, AppError> {
        self.client
            .get_with_query(
                "/analytic/invoice-status-breakdown/",
                &AnalyticsQuery::within(period),
            )
            .await
    }

    /// Largest categories first, plus an `Others` bucket past `limit`.
    pub async fn top_expense_categories(
        &self,
        limit: u32,
        period: Option<Period>,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        let query = AnalyticsQuery {
            limit: Some(limit),
            ..AnalyticsQuery::within(period)
        };
        self.client
            .get_with_query("/analytic/top-expense-categories/", &query)
            .await
    }

    /// Unpaid invoices due within the next `days` days, soonest first.
    pub async fn upcoming_payments(&self, days: u32) -> Result<Vec<UpcomingPayment>, AppError> {
        let query = AnalyticsQuery {
            days: Some(days),
            ..Default::default()
        };
        self.client
            .get_with_query("/analytic/upcoming-payments/", &query)
            .await
    }

    pub async fn growth_rate(&self) -> Result<GrowthRate, AppError> {
        self.client.get("/analytic/growth-rate/").await
    }
}
