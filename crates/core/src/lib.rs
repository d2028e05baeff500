//! # VetHere Core
//!
//! Appointment lifecycle and clinical visit workflow for the VetHere clinic service.
//!
//! - [`AppointmentLifecycle`]: the appointment status state machine.
//! - [`ClinicalRecordCoordinator`]: files medical records and vaccine attachments against
//!   accepted appointments.
//! - [`Store`]: persistence seam, with in-memory and YAML-file implementations.
//!
//! **No transport concerns**: authentication and HTTP belong in `api-rest` and `api-shared`.

pub mod clock;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod service;
pub mod store;
pub mod validation;

pub use clock::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, TimestampIds};
pub use config::{CoreConfig, StoreBackend};
pub use coordinator::ClinicalRecordCoordinator;
pub use error::{ClinicError, ClinicResult, StoreError, StoreResult};
pub use lifecycle::{next_statuses, transition_allowed, AppointmentLifecycle};
pub use model::{
    Appointment, AppointmentId, AppointmentStatus, ClientId, DoctorId, MedicalRecord, PetId,
    PermittedActions, RecordId, VaccineAttachment, VaccineCatalogEntry, VaccineId,
};
pub use service::ClinicServices;
pub use store::{FileStore, MemoryStore, Store};
