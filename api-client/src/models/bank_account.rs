use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    #[serde(default)]
    pub id: Option<i64>,
    pub account_holder_name: String,
    pub bank_name: String,
    pub iban_number: String,
    #[serde(default)]
    pub ifsc_code: Option<String>,
    #[serde(default)]
    pub swift_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct BankAccountDraft {
    #[validate(length(min = 1, message = "Account holder name is required"))]
    pub account_holder_name: String,
    #[validate(length(min = 1, message = "Bank name is required"))]
    pub bank_name: String,
    #[validate(length(min = 1, message = "IBAN is required"))]
    pub iban_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifsc_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift_code: Option<String>,
}
