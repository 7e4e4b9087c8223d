use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::fetch_error::FetchError;

/// One page of items plus the server-reported pagination metadata.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PageResponse<T> {
    items: Vec<T>,
    total: u64,
    total_pages: u32,
}

impl<T> PageResponse<T> {
    pub fn new(items: Vec<T>, total: u64, total_pages: u32) -> Self {
        PageResponse {
            items,
            total,
            total_pages,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// A page shorter than `limit` is the last one, whatever `total_pages` says.
    pub fn is_last_page(&self, limit: u32) -> bool {
        self.items.len() < limit as usize
    }
}

pub fn total_pages_for(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    total.div_ceil(limit).min(u64::from(u32::MAX)) as u32
}

#[derive(Deserialize, Default, Debug, Clone, Copy)]
#[serde(rename_all = "camelCase")]
struct PaginationMeta {
    total: Option<u64>,
    #[serde(alias = "pages")]
    total_pages: Option<u32>,
}

impl PaginationMeta {
    fn is_present(&self) -> bool {
        self.total.is_some() || self.total_pages.is_some()
    }
}

#[derive(Deserialize, Default, Debug)]
struct Meta {
    pagination: Option<PaginationMeta>,
    #[serde(flatten)]
    direct: PaginationMeta,
}

#[derive(Deserialize, Debug)]
#[serde(bound = "T: DeserializeOwned")]
struct ListEnvelope<T> {
    success: Option<bool>,
    message: Option<String>,
    data: Option<Vec<T>>,
    meta: Option<Meta>,
    pagination: Option<PaginationMeta>,
}

impl<T> ListEnvelope<T> {
    /// The backend nests pagination under `meta.pagination`, `pagination` or
    /// `meta` depending on the endpoint. First non-empty one wins.
    fn pagination_meta(&self) -> Option<PaginationMeta> {
        let nested = self.meta.as_ref().and_then(|meta| meta.pagination);
        let direct = self.meta.as_ref().map(|meta| meta.direct);

        [nested, self.pagination, direct]
            .into_iter()
            .flatten()
            .find(PaginationMeta::is_present)
    }
}

/// Decodes a list envelope body into a [`PageResponse`].
pub fn parse_list_response<T>(body: &[u8], limit: u32) -> Result<PageResponse<T>, FetchError>
where
    T: DeserializeOwned,
{
    let envelope: ListEnvelope<T> = serde_json::from_slice(body)?;

    if envelope.success == Some(false) {
        return Err(FetchError::Rejected(envelope.message.unwrap_or_default()));
    }

    let meta = envelope
        .pagination_meta()
        .ok_or_else(|| FetchError::MalformedResponse("missing pagination metadata".into()))?;

    let items = envelope
        .data
        .ok_or_else(|| FetchError::MalformedResponse("missing data".into()))?;

    let limit = limit.max(1);
    let (total, total_pages) = match (meta.total, meta.total_pages) {
        (Some(total), Some(total_pages)) => (total, total_pages),
        (Some(total), None) => (total, total_pages_for(total, limit)),
        // Without a total, assume every earlier page was full.
        (None, Some(total_pages)) => (
            u64::from(total_pages.saturating_sub(1)) * u64::from(limit) + items.len() as u64,
            total_pages,
        ),
        (None, None) => {
            return Err(FetchError::MalformedResponse(
                "missing pagination metadata".into(),
            ));
        }
    };

    Ok(PageResponse::new(items, total, total_pages))
}

/// Extracts `message` from an error body, if any.
pub fn parse_error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn parse(body: Value, limit: u32) -> Result<PageResponse<Value>, FetchError> {
        parse_list_response(body.to_string().as_bytes(), limit)
    }

    #[test]
    fn test_total_pages_computed_from_total() {
        let items: Vec<Value> = (0..20).map(|i| json!({ "id": i })).collect();
        let response = parse(
            json!({ "success": true, "data": items, "meta": { "total": 45 } }),
            20,
        )
        .unwrap();

        assert_eq!(response.total(), 45);
        assert_eq!(response.total_pages(), 3);
        assert!(!response.is_last_page(20));
    }

    #[test]
    fn test_meta_pagination_shape() {
        let response = parse(
            json!({
                "success": true,
                "data": [{ "id": 1 }],
                "meta": { "timestamp": "2025-01-01", "pagination": { "total": 41, "totalPages": 5 } }
            }),
            10,
        )
        .unwrap();

        assert_eq!(response.total(), 41);
        assert_eq!(response.total_pages(), 5);
    }

    #[test]
    fn test_top_level_pagination_shape_with_pages_alias() {
        let response = parse(
            json!({
                "data": [{ "id": 1 }, { "id": 2 }],
                "pagination": { "page": 2, "limit": 2, "total": 7, "pages": 4 }
            }),
            2,
        )
        .unwrap();

        assert_eq!(response.total_pages(), 4);
        assert_eq!(response.items().len(), 2);
    }

    #[test]
    fn test_nested_meta_wins_over_top_level() {
        let response = parse(
            json!({
                "data": [],
                "meta": { "pagination": { "total": 0, "totalPages": 0 } },
                "pagination": { "total": 99, "totalPages": 9 }
            }),
            20,
        )
        .unwrap();

        assert_eq!(response.total_pages(), 0);
        assert!(response.is_last_page(20));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        assert!(matches!(
            parse(json!({ "success": true, "meta": { "total": 3 } }), 20),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse(json!({ "success": true, "data": [] }), 20),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_list_response::<Value>(b"<html>", 20),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_success_false_is_rejected_with_backend_message() {
        let error = parse(json!({ "success": false, "message": "No school selected" }), 20)
            .unwrap_err();
        assert_eq!(error, FetchError::Rejected("No school selected".to_string()));
        assert!(error.is_malformed());
        assert_eq!(error.user_message(), "No school selected");
    }

    #[test]
    fn test_parse_error_message() {
        assert_eq!(
            parse_error_message(br#"{"success":false,"message":"Forbidden"}"#),
            Some("Forbidden".to_string())
        );
        assert_eq!(parse_error_message(b"Bad Gateway"), None);
    }
}
