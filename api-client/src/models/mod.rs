pub mod analytics;
pub mod bank_account;
pub mod client;
pub mod contact;
pub mod currency;
pub mod dashboard;
pub mod expense;
pub mod invoice;
pub mod page;
pub mod payment;
pub mod user;

use reqwest::multipart::Part;

pub use page::{Listing, PageQuery, Paginated};

/// A file sent as one part of a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Build a fresh part. Called once per attempt since a sent form is consumed.
    pub(crate) fn to_part(&self) -> Part {
        let part = Part::bytes(self.bytes.clone()).file_name(self.file_name.clone());
        match part.mime_str(&self.mime_type) {
            Ok(part) => part,
            Err(_) => {
                tracing::warn!(mime_type = %self.mime_type, "Ignoring invalid upload mime type");
                Part::bytes(self.bytes.clone()).file_name(self.file_name.clone())
            }
        }
    }
}
