//! Request and response bodies.
//!
//! Field names follow the clinic API's snake_case vocabulary (`appointment_status`,
//! `appointment_date`, `vaccine_name`, ...). Every response body is wrapped in an [`Envelope`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use vethere_core::{
    Appointment, MedicalRecord, PermittedActions, VaccineAttachment, VaccineCatalogEntry,
};

/// Outcome summary carried by every response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    pub success: bool,
    pub message: String,
}

/// `{ "meta": { "success", "message" }, "data": ... }`
///
/// `data` is `null` on failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: ResponseMeta,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            meta: ResponseMeta {
                success: true,
                message: message.into(),
            },
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            meta: ResponseMeta {
                success: false,
                message: message.into(),
            },
            data: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AppointmentRes {
    pub appointment_id: String,
    pub client_id: String,
    pub pet_id: String,
    pub doctor_id: String,
    /// `YYYY-MM-DD`
    pub appointment_date: String,
    /// `HH:MM:SS`
    pub appointment_time: String,
    pub appointment_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_notes: Option<String>,
}

impl From<Appointment> for AppointmentRes {
    fn from(a: Appointment) -> Self {
        Self {
            appointment_id: a.id.to_string(),
            client_id: a.client_id.to_string(),
            pet_id: a.pet_id.to_string(),
            doctor_id: a.doctor_id.to_string(),
            appointment_date: a.scheduled_date.format("%Y-%m-%d").to_string(),
            appointment_time: a.scheduled_time.format("%H:%M:%S").to_string(),
            appointment_status: a.status.to_string(),
            appointment_notes: a.notes,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PermittedActionsRes {
    pub appointment_id: String,
    pub appointment_status: String,
    /// Statuses the appointment may move to next.
    pub transitions: Vec<String>,
    /// Whether medical records and vaccinations may be filed now.
    pub can_file_records: bool,
}

impl From<PermittedActions> for PermittedActionsRes {
    fn from(p: PermittedActions) -> Self {
        Self {
            appointment_id: p.appointment_id.to_string(),
            appointment_status: p.status.to_string(),
            transitions: p.transitions.iter().map(|s| s.to_string()).collect(),
            can_file_records: p.can_file_records,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangeStatusReq {
    /// One of `Waiting`, `Accepted`, `Rejected`, `Finished` (case-insensitive).
    pub appointment_status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicalRecordReq {
    pub diagnosis: String,
    pub treatment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MedicalRecordRes {
    pub medical_record_id: String,
    pub appointment_id: String,
    pub pet_id: String,
    pub doctor_id: String,
    pub diagnosis: String,
    pub treatment: String,
    /// RFC 3339
    pub created_at: String,
}

impl From<MedicalRecord> for MedicalRecordRes {
    fn from(r: MedicalRecord) -> Self {
        Self {
            medical_record_id: r.id.to_string(),
            appointment_id: r.appointment_id.to_string(),
            pet_id: r.pet_id.to_string(),
            doctor_id: r.doctor_id.to_string(),
            diagnosis: r.diagnosis.into_inner(),
            treatment: r.treatment.into_inner(),
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachVaccineReq {
    pub vaccine_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VaccineAttachmentRes {
    pub vaccination_id: String,
    pub pet_id: String,
    pub vaccine_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
    /// RFC 3339
    pub administered_at: String,
}

impl From<VaccineAttachment> for VaccineAttachmentRes {
    fn from(v: VaccineAttachment) -> Self {
        Self {
            vaccination_id: v.id.to_string(),
            pet_id: v.pet_id.to_string(),
            vaccine_id: v.vaccine_id.to_string(),
            appointment_id: v.appointment_id.map(|id| id.to_string()),
            administered_at: v.administered_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct VaccineRes {
    pub vaccine_id: String,
    pub vaccine_name: String,
}

impl From<VaccineCatalogEntry> for VaccineRes {
    fn from(v: VaccineCatalogEntry) -> Self {
        Self {
            vaccine_id: v.vaccine_id.to_string(),
            vaccine_name: v.name,
        }
    }
}
