/// Success response envelopes
///
/// Every successful response wraps its payload in `{data, message, success}`;
/// paginated list responses add `{total, page, size, pages}`. The envelope is
/// part of the API contract, so clients can treat every endpoint uniformly.

use serde::Serialize;

/// Standard success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Payload, if any
    pub data: Option<T>,

    /// Human-readable outcome message
    pub message: Option<String>,

    /// Always true for this type; error responses use `ErrorResponse`
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload with a message
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            message: Some(message.into()),
            success: true,
        }
    }
}

impl ApiResponse<()> {
    /// A success envelope with no payload
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            success: true,
        }
    }
}

/// Success envelope with pagination metadata
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub message: Option<String>,
    pub success: bool,

    /// Total rows matching the filter, ignoring pagination
    pub total: i64,

    /// 1-based page number derived from skip/limit
    pub page: i64,

    /// Number of rows in this page
    pub size: i64,

    /// Total number of pages
    pub pages: i64,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Builds a page envelope from the fetched rows and the total count
    pub fn new(
        data: Vec<T>,
        message: impl Into<String>,
        total: i64,
        skip: i64,
        limit: i64,
    ) -> Self {
        let size = data.len() as i64;
        let (page, pages) = page_meta(total, skip, limit);

        Self {
            data,
            message: Some(message.into()),
            success: true,
            total,
            page,
            size,
            pages,
        }
    }
}

/// Computes (page, pages) for a skip/limit window over `total` rows
///
/// A non-positive limit degenerates to a single page.
fn page_meta(total: i64, skip: i64, limit: i64) -> (i64, i64) {
    if limit > 0 {
        let page = skip / limit + 1;
        let pages = (total + limit - 1) / limit;
        (page, pages.max(1))
    } else {
        (1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_first_page() {
        assert_eq!(page_meta(25, 0, 10), (1, 3));
    }

    #[test]
    fn test_page_meta_middle_page() {
        assert_eq!(page_meta(25, 10, 10), (2, 3));
    }

    #[test]
    fn test_page_meta_exact_fit() {
        assert_eq!(page_meta(30, 20, 10), (3, 3));
    }

    #[test]
    fn test_page_meta_empty_result() {
        assert_eq!(page_meta(0, 0, 10), (1, 1));
    }

    #[test]
    fn test_page_meta_zero_limit() {
        assert_eq!(page_meta(100, 50, 0), (1, 1));
    }

    #[test]
    fn test_paginated_response_size_matches_rows() {
        let response = PaginatedResponse::new(vec![1, 2, 3], "ok", 13, 0, 3);
        assert_eq!(response.size, 3);
        assert_eq!(response.total, 13);
        assert_eq!(response.page, 1);
        assert_eq!(response.pages, 5);
        assert!(response.success);
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = ApiResponse::new(42, "the answer");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"], 42);
        assert_eq!(json["message"], "the answer");
        assert_eq!(json["success"], true);
    }
}
