//! Constants used throughout the VetHere core crate.
//!
//! File-store layout names live here so the store, the CLI and the tests agree on them.

/// Default directory for the file store when none is configured.
pub const DEFAULT_DATA_DIR: &str = "vethere_data";

/// Directory holding one subdirectory per appointment.
pub const APPOINTMENTS_DIR_NAME: &str = "appointments";

/// Directory holding one subdirectory per pet.
pub const PETS_DIR_NAME: &str = "pets";

/// Per-pet directory of medical records.
pub const MEDICAL_RECORDS_DIR_NAME: &str = "medical_records";

/// Per-pet directory of vaccine attachments.
pub const VACCINATIONS_DIR_NAME: &str = "vaccinations";

/// Filename for an appointment row.
pub const APPOINTMENT_FILENAME: &str = "appointment.yaml";

/// Filename of the per-appointment advisory lock.
pub const LOCK_FILENAME: &str = ".lock";

/// Filename for the vaccine catalogue.
pub const VACCINE_CATALOG_FILENAME: &str = "vaccines.yaml";

/// Filename of the catalogue's advisory lock.
pub const VACCINE_CATALOG_LOCK_FILENAME: &str = "vaccines.lock";

/// Default number of compare-and-swap attempts for a status change.
pub const DEFAULT_MAX_STATUS_ATTEMPTS: usize = 8;

/// Upper bound on diagnosis / treatment text.
pub const MAX_CLINICAL_TEXT_LEN: usize = 10_000;
