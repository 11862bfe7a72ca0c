//! Shared response envelope types for API handlers.
//!
//! Successful JSON responses use `{ "success": true, "data"?: ..., "message"?: ... }`.
//! Errors are rendered by [`crate::error::AppError`] instead.

use fixit_core::listing::Pagination;
use serde::Serialize;

/// Standard success envelope.
///
/// ```ignore
/// Ok(Json(ApiResponse::data(issue)))
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    /// A success envelope carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// `data` payload of the listing endpoints.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub issues: Vec<T>,
    pub pagination: Pagination,
}
