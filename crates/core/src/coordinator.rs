//! Clinical visit workflow.
//!
//! Medical records and vaccine attachments may only be filed against an `Accepted` appointment.
//! The status check is made by the store in the same serialised step as the write, never from an
//! earlier read, so a racing status change cannot let a record through. The two operations are
//! independent: either may run first, or both at once.

use crate::clock::{Clock, IdGenerator};
use crate::error::{ClinicError, ClinicResult};
use crate::model::{
    AppointmentId, AppointmentStatus, MedicalRecord, PetId, VaccineAttachment,
    VaccineCatalogEntry, VaccineId,
};
use crate::store::{GuardedWrite, MedicalRecordDraft, Store, VaccinationDraft};
use crate::validation::validate_clinical_text;
use std::sync::Arc;

#[derive(Clone)]
pub struct ClinicalRecordCoordinator {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ClinicalRecordCoordinator {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, clock, ids }
    }

    /// Files a medical record against an accepted appointment.
    ///
    /// Both texts are trimmed and validated before the store is touched. The record inherits the
    /// appointment's pet and doctor and is stamped with the clock's current time. The
    /// appointment's status is left unchanged. A refused call takes no id from the generator.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::Validation`] if `diagnosis` or `treatment` is empty.
    /// - [`ClinicError::NotFound`] if the appointment does not exist.
    /// - [`ClinicError::NotAccepted`] if the appointment is not `Accepted`.
    pub fn submit_medical_record(
        &self,
        appointment_id: &AppointmentId,
        diagnosis: &str,
        treatment: &str,
    ) -> ClinicResult<MedicalRecord> {
        let diagnosis = validate_clinical_text("diagnosis", diagnosis)?;
        let treatment = validate_clinical_text("treatment", treatment)?;

        let draft = MedicalRecordDraft {
            diagnosis,
            treatment,
            created_at: self.clock.now(),
        };

        let written = self.store.append_medical_record(
            appointment_id,
            AppointmentStatus::Accepted,
            draft,
            self.ids.as_ref(),
        )?;
        let record = accepted_write(appointment_id, written)?;

        tracing::info!(
            "filed medical record {} for pet {} (appointment {})",
            record.id,
            record.pet_id,
            appointment_id
        );
        Ok(record)
    }

    /// Records a vaccine administered during an accepted appointment.
    ///
    /// Every call appends a new attachment; repeats are not deduplicated.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::UnknownVaccine`] if the catalogue has no such vaccine. Checked first.
    /// - [`ClinicError::NotFound`] if the appointment does not exist.
    /// - [`ClinicError::NotAccepted`] if the appointment is not `Accepted`.
    pub fn attach_vaccine(
        &self,
        appointment_id: &AppointmentId,
        vaccine_id: &VaccineId,
    ) -> ClinicResult<VaccineAttachment> {
        if self.store.vaccine(vaccine_id)?.is_none() {
            tracing::warn!(
                "unknown vaccine {} for appointment {}",
                vaccine_id,
                appointment_id
            );
            return Err(ClinicError::UnknownVaccine(vaccine_id.to_string()));
        }

        let draft = VaccinationDraft {
            vaccine_id: vaccine_id.clone(),
            administered_at: self.clock.now(),
        };

        let written = self.store.append_vaccination(
            appointment_id,
            AppointmentStatus::Accepted,
            draft,
            self.ids.as_ref(),
        )?;
        let attachment = accepted_write(appointment_id, written)?;

        tracing::info!(
            "attached vaccine {} to pet {} (appointment {})",
            attachment.vaccine_id,
            attachment.pet_id,
            appointment_id
        );
        Ok(attachment)
    }

    /// Oldest first.
    pub fn medical_history(&self, pet_id: &PetId) -> ClinicResult<Vec<MedicalRecord>> {
        let records = self.store.medical_records_for_pet(pet_id)?;
        tracing::debug!("pet {} has {} medical record(s)", pet_id, records.len());
        Ok(records)
    }

    /// Oldest first.
    pub fn vaccination_history(&self, pet_id: &PetId) -> ClinicResult<Vec<VaccineAttachment>> {
        let records = self.store.vaccinations_for_pet(pet_id)?;
        tracing::debug!("pet {} has {} vaccination(s)", pet_id, records.len());
        Ok(records)
    }

    pub fn vaccine_catalog(&self) -> ClinicResult<Vec<VaccineCatalogEntry>> {
        Ok(self.store.vaccine_catalog()?)
    }
}

fn accepted_write<T>(appointment_id: &AppointmentId, written: GuardedWrite<T>) -> ClinicResult<T> {
    match written {
        GuardedWrite::Written(value) => Ok(value),
        GuardedWrite::Missing => Err(ClinicError::appointment_not_found(appointment_id)),
        GuardedWrite::StatusMismatch(status) => {
            tracing::warn!(
                "refused clinical record for appointment {} in status {}",
                appointment_id,
                status
            );
            Err(ClinicError::NotAccepted {
                id: appointment_id.to_string(),
                status,
            })
        }
    }
}
