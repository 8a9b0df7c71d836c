use serde::{Deserialize, Serialize};

/// Django REST framework page envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// List endpoints answer with either a page envelope or a bare array,
/// depending on whether pagination is enabled for the view.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged(Paginated<T>),
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Listing::Paged(page) => &page.results,
            Listing::Plain(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Paged(page) => page.results,
            Listing::Plain(items) => items,
        }
    }

    /// Total number of records on the server.
    pub fn total(&self) -> u64 {
        match self {
            Listing::Paged(page) => page.count,
            Listing::Plain(items) => items.len() as u64,
        }
    }

    pub fn has_next(&self) -> bool {
        matches!(self, Listing::Paged(page) if page.next.is_some())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_page_envelope() {
        let listing: Listing<u32> = serde_json::from_str(
            r#"{"count": 12, "next": "http://host/api/invoice/?page=2", "previous": null, "results": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(listing.total(), 12);
        assert!(listing.has_next());
        assert_eq!(listing.into_items(), vec![1, 2]);
    }

    #[test]
    fn accepts_bare_array() {
        let listing: Listing<u32> = serde_json::from_str("[3, 4, 5]").unwrap();
        assert_eq!(listing.total(), 3);
        assert!(!listing.has_next());
        assert_eq!(listing.items(), &[3, 4, 5]);
    }
}
