use crate::model::AppointmentStatus;

/// Failures raised by a [`Store`](crate::store::Store) implementation.
///
/// Every variant is surfaced to callers as [`ClinicError::StoreUnavailable`]; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to read store file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write store file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to lock store file: {0}")]
    Lock(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("failed to allocate record id: {0}")]
    IdAllocation(String),
    #[error("corrupt store entry: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures returned by the appointment lifecycle and the clinical record coordinator.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("appointment {id} is {status}; clinical records require an Accepted appointment")]
    NotAccepted {
        id: String,
        status: AppointmentStatus,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown vaccine: {0}")]
    UnknownVaccine(String),

    #[error("appointment {id} changed concurrently {attempts} times; giving up")]
    ConcurrentModification { id: String, attempts: usize },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClinicError {
    pub(crate) fn appointment_not_found(id: impl std::fmt::Display) -> Self {
        ClinicError::NotFound {
            kind: "appointment",
            id: id.to_string(),
        }
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
