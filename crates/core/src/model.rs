//! Domain types: identifiers, appointments and the clinical records filed against them.

use crate::error::{ClinicError, ClinicResult};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vethere_types::{NonEmptyText, SafeId};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(SafeId);

        impl $name {
            /// Validates an externally supplied identifier.
            ///
            /// # Errors
            ///
            /// Returns [`ClinicError::Validation`] if the identifier is empty, too long, or not
            /// path-safe.
            pub fn new(input: impl AsRef<str>) -> ClinicResult<Self> {
                SafeId::new(input.as_ref())
                    .map(Self)
                    .map_err(|e| ClinicError::Validation(format!("invalid {}: {}", $label, e)))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ClinicError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

opaque_id!(
    /// Identifier of an appointment, assigned by the booking flow.
    AppointmentId,
    "appointment id"
);
opaque_id!(
    /// Identifier of the pet's owner.
    ClientId,
    "client id"
);
opaque_id!(PetId, "pet id");
opaque_id!(DoctorId, "doctor id");
opaque_id!(
    /// Identifier of a vaccine catalogue entry.
    VaccineId,
    "vaccine id"
);
opaque_id!(
    /// Identifier of a medical record or vaccine attachment, minted by an
    /// [`IdGenerator`](crate::clock::IdGenerator).
    RecordId,
    "record id"
);

/// Appointment status.
///
/// Serialised with the canonical vocabulary used on the wire: `Waiting`, `Accepted`, `Rejected`,
/// `Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    /// Booked, awaiting the doctor's decision.
    Waiting,
    /// The doctor has taken the visit; clinical records may be filed.
    Accepted,
    Rejected,
    Finished,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Waiting,
        AppointmentStatus::Accepted,
        AppointmentStatus::Rejected,
        AppointmentStatus::Finished,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Waiting => "Waiting",
            AppointmentStatus::Accepted => "Accepted",
            AppointmentStatus::Rejected => "Rejected",
            AppointmentStatus::Finished => "Finished",
        }
    }

    /// No status may be left once reached.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Rejected | AppointmentStatus::Finished
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ClinicError;

    /// Case-insensitive parse of the canonical vocabulary. Legacy labels such as `Confirmed` or
    /// `Pending` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ClinicError::Validation(format!(
                    "unknown appointment status '{}' (expected Waiting, Accepted, Rejected or Finished)",
                    s
                ))
            })
    }
}

/// A scheduled visit linking a client's pet to a doctor.
///
/// Only `status` changes after booking, and only through
/// [`AppointmentLifecycle`](crate::lifecycle::AppointmentLifecycle).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    pub pet_id: PetId,
    pub doctor_id: DoctorId,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Appointment {
    /// A freshly booked appointment, in `Waiting`.
    pub fn booked(
        id: AppointmentId,
        client_id: ClientId,
        pet_id: PetId,
        doctor_id: DoctorId,
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
    ) -> Self {
        Self {
            id,
            client_id,
            pet_id,
            doctor_id,
            scheduled_date,
            scheduled_time,
            status: AppointmentStatus::Waiting,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Diagnosis and treatment filed during an accepted visit. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: RecordId,
    pub appointment_id: AppointmentId,
    pub pet_id: PetId,
    pub doctor_id: DoctorId,
    pub diagnosis: NonEmptyText,
    pub treatment: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

/// One vaccine administration event. Repeats for the same pet and vaccine are legitimate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineAttachment {
    pub id: RecordId,
    pub pet_id: PetId,
    pub vaccine_id: VaccineId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<AppointmentId>,
    pub administered_at: DateTime<Utc>,
}

/// Read-only vaccine reference data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineCatalogEntry {
    pub vaccine_id: VaccineId,
    pub name: String,
}

/// What may be done with an appointment right now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PermittedActions {
    pub appointment_id: AppointmentId,
    pub status: AppointmentStatus,
    /// Statuses reachable in one step, excluding the current one.
    pub transitions: Vec<AppointmentStatus>,
    /// Whether medical records and vaccine attachments may be filed.
    pub can_file_records: bool,
}
