use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Filters = BTreeMap<String, String>;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Identifies a single server fetch: one page of a filtered collection.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    limit: u32,
    filters: Filters,
}

impl PageRequest {
    /// `page` and `limit` are clamped to at least 1.
    pub fn new(page: u32, limit: u32) -> Self {
        PageRequest {
            page: page.max(1),
            limit: limit.max(1),
            filters: Filters::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Same limit and filters, different page.
    pub fn for_page(&self, page: u32) -> Self {
        PageRequest {
            page: page.max(1),
            limit: self.limit,
            filters: self.filters.clone(),
        }
    }

    /// Query string pairs. Filters with blank values are skipped and cannot
    /// override `page` or `limit`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];

        pairs.extend(
            self.filters
                .iter()
                .filter(|(key, value)| {
                    !value.trim().is_empty() && key.as_str() != "page" && key.as_str() != "limit"
                })
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        pairs
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(1, DEFAULT_PAGE_LIMIT)
    }
}

#[derive(Default)]
pub struct PageRequestBuilder {
    page: Option<u32>,
    limit: Option<u32>,
    filters: Filters,
}

impl PageRequestBuilder {
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters.extend(filters);
        self
    }

    pub fn build(self) -> PageRequest {
        let mut request = PageRequest::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        );
        request.filters = self.filters;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = PageRequestBuilder::default()
            .with_page(2)
            .with_limit(50)
            .with_filter("search", "grade 10")
            .build();

        assert_eq!(request.page(), 2);
        assert_eq!(request.limit(), 50);
        assert_eq!(request.filters().get("search").map(String::as_str), Some("grade 10"));
    }

    #[test]
    fn test_clamps_to_one() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 1);
        assert_eq!(request.for_page(0).page(), 1);
    }

    #[test]
    fn test_query_pairs_skip_blank_filters() {
        let request = PageRequestBuilder::default()
            .with_limit(20)
            .with_filter("status", "active")
            .with_filter("search", "   ")
            .with_filter("limit", "1000")
            .build();

        assert_eq!(
            request.query_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("limit".to_string(), "20".to_string()),
                ("status".to_string(), "active".to_string()),
            ]
        );
    }
}
