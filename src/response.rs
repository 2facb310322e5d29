use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;

/// Envelope wrapped around every successful response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Shorthand used by handlers: `return ok(data)`.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::new(data)))
}

/// Like [`ok`], with a `201 Created` status.
pub fn created<T: Serialize>(data: T) -> Result<(StatusCode, Json<ApiResponse<T>>), AppError> {
    Ok((StatusCode::CREATED, Json(ApiResponse::new(data))))
}
