use super::{
    sort_catalog, sort_medical_records, sort_vaccinations, GuardedWrite, MedicalRecordDraft,
    StatusSwap, Store, VaccinationDraft,
};
use crate::clock::IdGenerator;
use crate::error::{StoreError, StoreResult};
use crate::model::{
    Appointment, AppointmentId, AppointmentStatus, DoctorId, MedicalRecord, PetId,
    VaccineAttachment, VaccineCatalogEntry, VaccineId,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    appointments: BTreeMap<AppointmentId, Appointment>,
    medical_records: Vec<MedicalRecord>,
    vaccinations: Vec<VaccineAttachment>,
    vaccines: BTreeMap<VaccineId, VaccineCatalogEntry>,
}

/// Process-local store. Every operation holds one mutex over all tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an appointment, replacing any with the same id.
    pub fn with_appointment(mut self, appointment: Appointment) -> Self {
        self.tables_mut()
            .appointments
            .insert(appointment.id.clone(), appointment);
        self
    }

    /// Seeds a catalogue entry.
    pub fn with_vaccine(mut self, entry: VaccineCatalogEntry) -> Self {
        self.tables_mut()
            .vaccines
            .insert(entry.vaccine_id.clone(), entry);
        self
    }

    /// Makes every subsequent operation fail with [`StoreError::Unavailable`] until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn tables_mut(&mut self) -> &mut Tables {
        match self.tables.get_mut() {
            Ok(tables) => tables,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn appointment(&self, id: &AppointmentId) -> StoreResult<Option<Appointment>> {
        Ok(self.lock()?.appointments.get(id).cloned())
    }

    fn appointments_for_doctor_on(
        &self,
        doctor_id: &DoctorId,
        date: NaiveDate,
    ) -> StoreResult<Vec<Appointment>> {
        let tables = self.lock()?;
        let mut found: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| &a.doctor_id == doctor_id && a.scheduled_date == date)
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.scheduled_time, &a.id).cmp(&(b.scheduled_time, &b.id)));
        Ok(found)
    }

    fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if tables.appointments.contains_key(&appointment.id) {
            return Ok(false);
        }
        tables
            .appointments
            .insert(appointment.id.clone(), appointment.clone());
        Ok(true)
    }

    fn swap_status(
        &self,
        id: &AppointmentId,
        expected: AppointmentStatus,
        target: AppointmentStatus,
    ) -> StoreResult<StatusSwap> {
        let mut tables = self.lock()?;
        let Some(appointment) = tables.appointments.get_mut(id) else {
            return Ok(StatusSwap::Missing);
        };
        if appointment.status != expected {
            return Ok(StatusSwap::Conflict(appointment.status));
        }
        appointment.status = target;
        Ok(StatusSwap::Swapped(appointment.clone()))
    }

    fn append_medical_record(
        &self,
        appointment_id: &AppointmentId,
        required: AppointmentStatus,
        draft: MedicalRecordDraft,
        ids: &dyn IdGenerator,
    ) -> StoreResult<GuardedWrite<MedicalRecord>> {
        let mut tables = self.lock()?;
        let record = match tables.appointments.get(appointment_id) {
            None => return Ok(GuardedWrite::Missing),
            Some(a) if a.status != required => return Ok(GuardedWrite::StatusMismatch(a.status)),
            Some(a) => draft.into_record(ids.next_id()?, a),
        };
        tables.medical_records.push(record.clone());
        Ok(GuardedWrite::Written(record))
    }

    fn append_vaccination(
        &self,
        appointment_id: &AppointmentId,
        required: AppointmentStatus,
        draft: VaccinationDraft,
        ids: &dyn IdGenerator,
    ) -> StoreResult<GuardedWrite<VaccineAttachment>> {
        let mut tables = self.lock()?;
        let attachment = match tables.appointments.get(appointment_id) {
            None => return Ok(GuardedWrite::Missing),
            Some(a) if a.status != required => return Ok(GuardedWrite::StatusMismatch(a.status)),
            Some(a) => draft.into_record(ids.next_id()?, a),
        };
        tables.vaccinations.push(attachment.clone());
        Ok(GuardedWrite::Written(attachment))
    }

    fn medical_records_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<MedicalRecord>> {
        let mut records: Vec<MedicalRecord> = self
            .lock()?
            .medical_records
            .iter()
            .filter(|r| &r.pet_id == pet_id)
            .cloned()
            .collect();
        sort_medical_records(&mut records);
        Ok(records)
    }

    fn vaccinations_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<VaccineAttachment>> {
        let mut records: Vec<VaccineAttachment> = self
            .lock()?
            .vaccinations
            .iter()
            .filter(|v| &v.pet_id == pet_id)
            .cloned()
            .collect();
        sort_vaccinations(&mut records);
        Ok(records)
    }

    fn vaccine(&self, id: &VaccineId) -> StoreResult<Option<VaccineCatalogEntry>> {
        Ok(self.lock()?.vaccines.get(id).cloned())
    }

    fn vaccine_catalog(&self) -> StoreResult<Vec<VaccineCatalogEntry>> {
        let mut entries: Vec<VaccineCatalogEntry> =
            self.lock()?.vaccines.values().cloned().collect();
        sort_catalog(&mut entries);
        Ok(entries)
    }

    fn upsert_vaccine(&self, entry: &VaccineCatalogEntry) -> StoreResult<()> {
        self.lock()?
            .vaccines
            .insert(entry.vaccine_id.clone(), entry.clone());
        Ok(())
    }
}
