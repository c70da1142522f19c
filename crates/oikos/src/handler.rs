//! Endpoint handlers.

use crate::app::AppState;
use crate::error::{ApiError, ApiResponse};
use crate::extract::{ClientIp, JsonOrForm};
use axum::Json;
use axum::extract::State;
use oikos_core::{BookingForm, ContactForm, Error, GetStartedForm};
use serde::Serialize;

/// `POST /api/contact`
///
/// # Errors
///
/// Fails on a bad body, a form that does not validate, or a contact log that
/// cannot be written.
pub async fn contact(
    State(state): State<AppState>,
    JsonOrForm(form): JsonOrForm<ContactForm>,
) -> Result<Json<ApiResponse>, ApiError> {
    match state.intake.submit_contact(&form).await {
        Ok(receipt) => Ok(Json(receipt.into())),
        Err(Error::Storage(e)) => {
            tracing::error!(error = %e, "contact log write failed");
            Err(ApiError::MessageNotSaved)
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /api/booking`
///
/// # Errors
///
/// Fails on a bad body, a form that does not validate, or a booking that
/// cannot be saved.
pub async fn booking(
    State(state): State<AppState>,
    JsonOrForm(form): JsonOrForm<BookingForm>,
) -> Result<Json<ApiResponse>, ApiError> {
    let receipt = state.intake.submit_booking(&form).await?;
    Ok(Json(receipt.into()))
}

/// `POST /api/get-started`
///
/// # Errors
///
/// Fails on a bad body, a form that does not validate, or logs that cannot be
/// written.
pub async fn get_started(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    JsonOrForm(form): JsonOrForm<GetStartedForm>,
) -> Result<Json<ApiResponse>, ApiError> {
    let receipt = state.intake.submit_get_started(&form, ip).await?;
    Ok(Json(receipt.into()))
}

/// Liveness body.
#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    version: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Any method other than the one a route accepts.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Unknown path.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
