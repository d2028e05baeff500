//! Persistence for appointments, clinical records and the vaccine catalogue.
//!
//! The [`Store`] trait is the only seam between the domain services and storage. It owns the
//! per-appointment serialisation the lifecycle depends on:
//!
//! - [`Store::swap_status`] is a compare-and-swap on an appointment's status.
//! - [`Store::append_medical_record`] and [`Store::append_vaccination`] re-check the
//!   appointment's status in the same serialised step as the insert, so a concurrent status
//!   change cannot slip in between the check and the write. The record's id is taken from the
//!   [`IdGenerator`] only once that check has passed, so refused appends consume no ids.
//!
//! Two implementations are provided: [`MemoryStore`] and [`FileStore`].

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::clock::IdGenerator;
use crate::error::StoreResult;
use crate::model::{
    Appointment, AppointmentId, AppointmentStatus, DoctorId, MedicalRecord, PetId, RecordId,
    VaccineAttachment, VaccineCatalogEntry, VaccineId,
};
use chrono::{DateTime, NaiveDate, Utc};
use vethere_types::NonEmptyText;

/// Outcome of [`Store::swap_status`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusSwap {
    /// The status matched the expected value and was replaced.
    Swapped(Appointment),
    Missing,
    /// The status no longer matched; carries the status actually found.
    Conflict(AppointmentStatus),
}

/// Outcome of a status-guarded append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardedWrite<T> {
    Written(T),
    Missing,
    /// The appointment was not in the required status; nothing was written.
    StatusMismatch(AppointmentStatus),
}

/// A medical record before it is bound to its appointment and given an id.
#[derive(Clone, Debug)]
pub struct MedicalRecordDraft {
    pub diagnosis: NonEmptyText,
    pub treatment: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

impl MedicalRecordDraft {
    /// Binds the draft to the pet and doctor of `appointment`.
    pub fn into_record(self, id: RecordId, appointment: &Appointment) -> MedicalRecord {
        MedicalRecord {
            id,
            appointment_id: appointment.id.clone(),
            pet_id: appointment.pet_id.clone(),
            doctor_id: appointment.doctor_id.clone(),
            diagnosis: self.diagnosis,
            treatment: self.treatment,
            created_at: self.created_at,
        }
    }
}

/// A vaccine attachment before it is bound to its appointment and given an id.
#[derive(Clone, Debug)]
pub struct VaccinationDraft {
    pub vaccine_id: VaccineId,
    pub administered_at: DateTime<Utc>,
}

impl VaccinationDraft {
    pub fn into_record(self, id: RecordId, appointment: &Appointment) -> VaccineAttachment {
        VaccineAttachment {
            id,
            pet_id: appointment.pet_id.clone(),
            vaccine_id: self.vaccine_id,
            appointment_id: Some(appointment.id.clone()),
            administered_at: self.administered_at,
        }
    }
}

/// Storage contract required by the lifecycle and the coordinator.
///
/// Implementations must serialise every operation that reads and then writes the same
/// appointment. Any I/O or backend failure is reported as a [`StoreError`](crate::StoreError)
/// and is never retried here.
pub trait Store: Send + Sync {
    fn appointment(&self, id: &AppointmentId) -> StoreResult<Option<Appointment>>;

    /// Appointments for `doctor_id` on `date`, ordered by scheduled time.
    fn appointments_for_doctor_on(
        &self,
        doctor_id: &DoctorId,
        date: NaiveDate,
    ) -> StoreResult<Vec<Appointment>>;

    /// Inserts a booked appointment. Returns `false` if the id is already taken.
    fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<bool>;

    /// Sets the status to `target` only if it is currently `expected`.
    fn swap_status(
        &self,
        id: &AppointmentId,
        expected: AppointmentStatus,
        target: AppointmentStatus,
    ) -> StoreResult<StatusSwap>;

    /// Appends a medical record if the appointment is in `required` status.
    ///
    /// `ids` is called at most once, and only after the status check has passed.
    fn append_medical_record(
        &self,
        appointment_id: &AppointmentId,
        required: AppointmentStatus,
        draft: MedicalRecordDraft,
        ids: &dyn IdGenerator,
    ) -> StoreResult<GuardedWrite<MedicalRecord>>;

    /// Appends a vaccine attachment if the appointment is in `required` status.
    ///
    /// `ids` is called at most once, and only after the status check has passed.
    fn append_vaccination(
        &self,
        appointment_id: &AppointmentId,
        required: AppointmentStatus,
        draft: VaccinationDraft,
        ids: &dyn IdGenerator,
    ) -> StoreResult<GuardedWrite<VaccineAttachment>>;

    /// Oldest first.
    fn medical_records_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<MedicalRecord>>;

    /// Oldest first.
    fn vaccinations_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<VaccineAttachment>>;

    fn vaccine(&self, id: &VaccineId) -> StoreResult<Option<VaccineCatalogEntry>>;

    /// The whole catalogue, ordered by name.
    fn vaccine_catalog(&self) -> StoreResult<Vec<VaccineCatalogEntry>>;

    /// Adds or renames a catalogue entry.
    fn upsert_vaccine(&self, entry: &VaccineCatalogEntry) -> StoreResult<()>;
}

fn sort_medical_records(records: &mut [MedicalRecord]) {
    records.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
}

fn sort_vaccinations(records: &mut [VaccineAttachment]) {
    records.sort_by(|a, b| (a.administered_at, &a.id).cmp(&(b.administered_at, &b.id)));
}

fn sort_catalog(entries: &mut [VaccineCatalogEntry]) {
    entries.sort_by(|a, b| (&a.name, &a.vaccine_id).cmp(&(&b.name, &b.vaccine_id)));
}
