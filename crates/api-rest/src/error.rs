//! Mapping of domain failures onto HTTP responses.

use api_shared::{AuthError, Envelope};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use vethere_core::ClinicError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Clinic(#[from] ClinicError),
    /// Malformed body or query string.
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Clinic(e) => match e {
                ClinicError::Validation(_) => StatusCode::BAD_REQUEST,
                ClinicError::NotFound { .. } => StatusCode::NOT_FOUND,
                ClinicError::InvalidTransition { .. }
                | ClinicError::NotAccepted { .. }
                | ClinicError::ConcurrentModification { .. } => StatusCode::CONFLICT,
                ClinicError::UnknownVaccine(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ClinicError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ClinicError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Clinic(ClinicError::StoreUnavailable(e)) => {
                tracing::error!("store failure: {}", e);
                "storage is temporarily unavailable".to_string()
            }
            ApiError::Clinic(ClinicError::Config(e)) => {
                tracing::error!("configuration error while serving request: {}", e);
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(Envelope::<()>::failure(message))).into_response();
        if let ApiError::Unauthorized(_) = self {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
