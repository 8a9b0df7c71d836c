use super::client::Client;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Unpaid,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// List views embed the client id, detail views the whole client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientRef {
    Detail(Client),
    Id(Uuid),
}

impl ClientRef {
    pub fn id(&self) -> Uuid {
        match self {
            ClientRef::Detail(client) => client.id,
            ClientRef::Id(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Computed server-side.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub client: ClientRef,
    #[serde(default)]
    pub client_name: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Falls back to the owner's currency preference when absent.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn client_id(&self) -> Uuid {
        self.client.id()
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Name used for card billing details.
    pub fn billing_name(&self) -> String {
        match &self.client {
            ClientRef::Detail(client) if !client.name.trim().is_empty() => client.name.clone(),
            _ => self
                .client_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Client".to_string()),
        }
    }

    pub fn billing_email(&self) -> String {
        match &self.client {
            ClientRef::Detail(client) => client.email.clone().unwrap_or_default(),
            ClientRef::Id(_) => String::new(),
        }
    }
}

/// Subtotal, tax and total as shown on the invoice form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    /// `lines` yields `(quantity, unit_price)`; `tax_rate` is a percentage.
    pub fn compute<I>(lines: I, tax_rate: Decimal) -> Self
    where
        I: IntoIterator<Item = (Decimal, Decimal)>,
    {
        let subtotal: Decimal = lines.into_iter().map(|(qty, price)| qty * price).sum();
        let tax_amount = subtotal * tax_rate / Decimal::ONE_HUNDRED;
        Self {
            subtotal: round_money(subtotal),
            tax_amount: round_money(tax_amount),
            total: round_money(subtotal + tax_amount),
        }
    }
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemDraft {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(custom(function = "positive_quantity"))]
    pub quantity: Decimal,
    #[validate(custom(function = "non_negative_price"))]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Validate)]
#[validate(schema(function = "due_after_issue"))]
pub struct InvoiceDraft {
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    pub client: Uuid,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub tax_rate: Decimal,
    #[validate(length(min = 1, message = "At least one line item is required"))]
    #[validate(nested)]
    pub items: Vec<LineItemDraft>,
}

impl InvoiceDraft {
    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::compute(
            self.items.iter().map(|item| (item.quantity, item.unit_price)),
            self.tax_rate,
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InvoiceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

fn positive_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if *quantity <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("Quantity must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Unit price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

fn due_after_issue(draft: &InvoiceDraft) -> Result<(), ValidationError> {
    if draft.due_date < draft.issue_date {
        let mut err = ValidationError::new("due_date");
        err.message = Some("Due date cannot be before the issue date".into());
        return Err(err);
    }
    Ok(())
}
