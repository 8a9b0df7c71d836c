use super::Upload;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::multipart::Form;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CategoryDraft {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// URL of the uploaded receipt, if any.
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ExpenseDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    #[validate(custom(function = "positive_amount"))]
    pub amount: Decimal,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExpenseDraft {
    /// Multipart body carrying the draft fields plus the receipt file.
    pub(crate) fn to_form(&self, receipt: &Upload) -> Form {
        let mut form = Form::new()
            .text("amount", self.amount.to_string())
            .text("date", self.date.format("%Y-%m-%d").to_string())
            .text("description", self.description.clone());
        if let Some(category) = self.category {
            form = form.text("category", category.to_string());
        }
        if let Some(notes) = &self.notes {
            form = form.text("notes", notes.clone());
        }
        form.part("receipt", receipt.to_part())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpenseFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

fn positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("Amount must be greater than zero".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_amount() {
        let draft = ExpenseDraft {
            category: None,
            amount: Decimal::ZERO,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            description: "Printer paper".into(),
            notes: None,
        };
        let errors = draft.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("amount"));
    }
}
