//! API responses and error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use oikos_core::{Receipt, ValidationError};
use serde::Serialize;

/// JSON body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// Whether the submission was accepted.
    pub success: bool,
    /// Message shown to the visitor.
    pub message: String,
    /// Stored record, when there is one to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    /// A failure body.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl From<Receipt> for ApiResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            success: true,
            message: receipt.message,
            data: receipt.data,
        }
    }
}

/// Request failure as seen by the visitor.
///
/// Server-side details are logged where the error is raised; only a generic
/// message leaves the process.
#[derive(Debug)]
pub enum ApiError {
    /// Wrong HTTP method.
    MethodNotAllowed,
    /// Body is not valid JSON or form data.
    InvalidBody,
    /// Form failed validation.
    Validation(ValidationError),
    /// Client exceeded its request budget.
    TooManyRequests,
    /// Contact log could not be written.
    MessageNotSaved,
    /// Anything else.
    Internal,
    /// Unknown route.
    NotFound,
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidBody | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::MessageNotSaved | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::InvalidBody => "Invalid JSON data received".to_string(),
            Self::Validation(e) => e.to_string(),
            Self::TooManyRequests => "Too many requests".to_string(),
            Self::MessageNotSaved => "Error saving message. Please try again.".to_string(),
            Self::Internal => "Server error. Please try again.".to_string(),
            Self::NotFound => "Not found".to_string(),
        }
    }
}

impl From<oikos_core::Error> for ApiError {
    fn from(err: oikos_core::Error) -> Self {
        match err {
            oikos_core::Error::Validation(e) => Self::Validation(e),
            other => {
                tracing::error!(error = %other, "submission failed");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ApiResponse::failure(self.message()))).into_response()
    }
}
