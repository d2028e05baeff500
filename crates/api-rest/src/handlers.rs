use crate::error::ApiError;
use crate::AppState;
use api_shared::{
    AppointmentRes, AttachVaccineReq, ChangeStatusReq, Envelope, HealthRes, HealthService,
    MedicalRecordReq, MedicalRecordRes, PermittedActionsRes, VaccineAttachmentRes, VaccineRes,
};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use vethere_core::validation::parse_appointment_date;
use vethere_core::{AppointmentId, AppointmentStatus, DoctorId, PetId, VaccineId};

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAppointmentsQuery {
    /// Doctor whose day to list.
    pub doctor_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint. Requires no credential.
#[axum::debug_handler]
pub async fn health() -> Json<Envelope<HealthRes>> {
    Json(Envelope::ok("ok", HealthService::check_health()))
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(ListAppointmentsQuery),
    responses(
        (
            status = 200,
            description = "The doctor's appointments for the day, by time",
            body = [AppointmentRes]
        ),
        (status = 400, description = "Bad doctor id or date"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    query: Result<Query<ListAppointmentsQuery>, QueryRejection>,
) -> ApiResult<Vec<AppointmentRes>> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let doctor_id: DoctorId = query.doctor_id.parse()?;
    let date = parse_appointment_date(&query.date)?;

    let appointments = state
        .services
        .lifecycle()
        .appointments_for_doctor(&doctor_id, date)?;
    Ok(Json(Envelope::ok(
        format!("{} appointment(s)", appointments.len()),
        appointments.into_iter().map(AppointmentRes::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The appointment", body = AppointmentRes),
        (status = 404, description = "No such appointment")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<AppointmentRes> {
    let id: AppointmentId = id.parse()?;
    let appointment = state.services.lifecycle().appointment(&id)?;
    Ok(Json(Envelope::ok("appointment found", appointment.into())))
}

#[utoipa::path(
    get,
    path = "/appointments/{id}/actions",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (
            status = 200,
            description = "Current status and permitted next steps",
            body = PermittedActionsRes
        ),
        (status = 404, description = "No such appointment")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn permitted_actions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PermittedActionsRes> {
    let id: AppointmentId = id.parse()?;
    let actions = state.services.lifecycle().permitted_actions(&id)?;
    Ok(Json(Envelope::ok("permitted actions", actions.into())))
}

#[utoipa::path(
    patch,
    path = "/appointments/{id}/status",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = ChangeStatusReq,
    responses(
        (
            status = 200,
            description = "Status changed (or already in that status)",
            body = AppointmentRes
        ),
        (status = 400, description = "Unknown status name"),
        (status = 404, description = "No such appointment"),
        (status = 409, description = "Transition not allowed, or status kept changing concurrently")
    ),
    security(("bearer" = []))
)]
/// Change an appointment's status.
///
/// Only `Waiting -> Accepted | Rejected`, `Accepted -> Finished | Waiting` and no-op moves to the
/// current status are accepted.
#[axum::debug_handler]
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ChangeStatusReq>, JsonRejection>,
) -> ApiResult<AppointmentRes> {
    let req = body(payload)?;
    let id: AppointmentId = id.parse()?;
    let target: AppointmentStatus = req.appointment_status.parse()?;

    let updated = state.services.lifecycle().change_status(&id, target)?;
    Ok(Json(Envelope::ok(
        format!("appointment is {}", updated.status),
        updated.into(),
    )))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/medical-records",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = MedicalRecordReq,
    responses(
        (status = 201, description = "Medical record filed", body = MedicalRecordRes),
        (status = 400, description = "Empty diagnosis or treatment"),
        (status = 404, description = "No such appointment"),
        (status = 409, description = "Appointment is not Accepted")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn submit_medical_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MedicalRecordReq>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<MedicalRecordRes>>), ApiError> {
    let req = body(payload)?;
    let id: AppointmentId = id.parse()?;

    let record = state
        .services
        .coordinator()
        .submit_medical_record(&id, &req.diagnosis, &req.treatment)?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("medical record created", record.into())),
    ))
}

#[utoipa::path(
    post,
    path = "/appointments/{id}/vaccinations",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = AttachVaccineReq,
    responses(
        (status = 201, description = "Vaccination recorded", body = VaccineAttachmentRes),
        (status = 404, description = "No such appointment"),
        (status = 409, description = "Appointment is not Accepted"),
        (status = 422, description = "Vaccine not in the catalogue")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn attach_vaccine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AttachVaccineReq>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<VaccineAttachmentRes>>), ApiError> {
    let req = body(payload)?;
    let id: AppointmentId = id.parse()?;
    let vaccine_id: VaccineId = req.vaccine_id.parse()?;

    let attachment = state
        .services
        .coordinator()
        .attach_vaccine(&id, &vaccine_id)?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("vaccination recorded", attachment.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/vaccines",
    responses(
        (status = 200, description = "Vaccine catalogue, by name", body = [VaccineRes])
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn vaccine_catalog(State(state): State<AppState>) -> ApiResult<Vec<VaccineRes>> {
    let catalog = state.services.coordinator().vaccine_catalog()?;
    Ok(Json(Envelope::ok(
        format!("{} vaccine(s)", catalog.len()),
        catalog.into_iter().map(VaccineRes::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/pets/{id}/medical-records",
    params(("id" = String, Path, description = "Pet id")),
    responses(
        (status = 200, description = "Medical history, oldest first", body = [MedicalRecordRes])
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn medical_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<MedicalRecordRes>> {
    let pet_id: PetId = id.parse()?;
    let records = state.services.coordinator().medical_history(&pet_id)?;
    Ok(Json(Envelope::ok(
        format!("{} medical record(s)", records.len()),
        records.into_iter().map(MedicalRecordRes::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/pets/{id}/vaccinations",
    params(("id" = String, Path, description = "Pet id")),
    responses(
        (
            status = 200,
            description = "Vaccination history, oldest first",
            body = [VaccineAttachmentRes]
        )
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn vaccination_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<VaccineAttachmentRes>> {
    let pet_id: PetId = id.parse()?;
    let records = state.services.coordinator().vaccination_history(&pet_id)?;
    Ok(Json(Envelope::ok(
        format!("{} vaccination(s)", records.len()),
        records.into_iter().map(VaccineAttachmentRes::from).collect(),
    )))
}
