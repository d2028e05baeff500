//! # API REST
//!
//! REST API implementation for VetHere.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, bearer authentication, CORS)
//!
//! Uses `api-shared` for wire types and `vethere-core` for the domain operations.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

use api_shared::{
    validate_bearer, AppointmentRes, AttachVaccineReq, ChangeStatusReq, HealthRes,
    MedicalRecordReq, MedicalRecordRes, PermittedActionsRes, ResponseMeta, VaccineAttachmentRes,
    VaccineRes,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;
use vethere_core::ClinicServices;

pub use error::ApiError;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    services: ClinicServices,
    api_token: Arc<str>,
}

impl AppState {
    pub fn new(services: ClinicServices, api_token: impl Into<String>) -> Self {
        let api_token: String = api_token.into();
        Self {
            services,
            api_token: Arc::from(api_token),
        }
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_appointments,
        handlers::get_appointment,
        handlers::permitted_actions,
        handlers::change_status,
        handlers::submit_medical_record,
        handlers::attach_vaccine,
        handlers::vaccine_catalog,
        handlers::medical_history,
        handlers::vaccination_history,
    ),
    components(schemas(
        ResponseMeta,
        HealthRes,
        AppointmentRes,
        PermittedActionsRes,
        ChangeStatusReq,
        MedicalRecordReq,
        MedicalRecordRes,
        AttachVaccineReq,
        VaccineAttachmentRes,
        VaccineRes,
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Rejects requests without the configured bearer token.
async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match validate_bearer(authorization, &state.api_token) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!("unauthenticated request to {}: {}", request.uri().path(), e);
            ApiError::from(e).into_response()
        }
    }
}

/// Builds the full router: authenticated API routes, `/health`, Swagger UI, permissive CORS.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/appointments", get(handlers::list_appointments))
        .route("/appointments/:id", get(handlers::get_appointment))
        .route("/appointments/:id/actions", get(handlers::permitted_actions))
        .route("/appointments/:id/status", patch(handlers::change_status))
        .route(
            "/appointments/:id/medical-records",
            post(handlers::submit_medical_record),
        )
        .route(
            "/appointments/:id/vaccinations",
            post(handlers::attach_vaccine),
        )
        .route("/vaccines", get(handlers::vaccine_catalog))
        .route("/pets/:id/medical-records", get(handlers::medical_history))
        .route("/pets/:id/vaccinations", get(handlers::vaccination_history))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
