//! YAML-on-disk store.
//!
//! Layout under the data directory:
//!
//! ```text
//! vaccines.yaml
//! vaccines.lock
//! appointments/<appointment_id>/appointment.yaml
//! appointments/<appointment_id>/.lock
//! pets/<pet_id>/medical_records/<record_id>.yaml
//! pets/<pet_id>/vaccinations/<record_id>.yaml
//! ```
//!
//! Every read-check-write of an appointment runs under an exclusive advisory lock on that
//! appointment's `.lock` file, so separate processes sharing a data directory are serialised
//! too. Files are written to a sibling temporary file and renamed into place.

use super::{
    sort_catalog, sort_medical_records, sort_vaccinations, GuardedWrite, MedicalRecordDraft,
    StatusSwap, Store, VaccinationDraft,
};
use crate::clock::IdGenerator;
use crate::constants::{
    APPOINTMENT_FILENAME, APPOINTMENTS_DIR_NAME, LOCK_FILENAME, MEDICAL_RECORDS_DIR_NAME,
    PETS_DIR_NAME, VACCINATIONS_DIR_NAME, VACCINE_CATALOG_FILENAME, VACCINE_CATALOG_LOCK_FILENAME,
};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    Appointment, AppointmentId, AppointmentStatus, DoctorId, MedicalRecord, PetId,
    VaccineAttachment, VaccineCatalogEntry, VaccineId,
};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Store backed by YAML files under a data directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DirCreation`] if the directory tree cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        for dir in [root.join(APPOINTMENTS_DIR_NAME), root.join(PETS_DIR_NAME)] {
            fs::create_dir_all(&dir).map_err(StoreError::DirCreation)?;
        }
        Ok(Self { root })
    }

    fn appointment_dir(&self, id: &AppointmentId) -> PathBuf {
        self.root.join(APPOINTMENTS_DIR_NAME).join(id.as_str())
    }

    fn appointment_path(&self, id: &AppointmentId) -> PathBuf {
        self.appointment_dir(id).join(APPOINTMENT_FILENAME)
    }

    fn pet_dir(&self, pet_id: &PetId, kind: &str) -> PathBuf {
        self.root.join(PETS_DIR_NAME).join(pet_id.as_str()).join(kind)
    }

    fn catalog_path(&self) -> PathBuf {
        self.root.join(VACCINE_CATALOG_FILENAME)
    }

    fn read_appointment(&self, id: &AppointmentId) -> StoreResult<Option<Appointment>> {
        let Some(appointment) = read_yaml::<Appointment>(&self.appointment_path(id))? else {
            return Ok(None);
        };
        if &appointment.id != id {
            return Err(StoreError::Corrupt(format!(
                "appointment file for {} records id {}",
                id, appointment.id
            )));
        }
        Ok(Some(appointment))
    }

    /// Runs `f` while holding the appointment's lock. Returns `None` without creating anything
    /// if the appointment has never been stored.
    fn with_appointment_lock<T>(
        &self,
        id: &AppointmentId,
        f: impl FnOnce(Appointment) -> StoreResult<T>,
    ) -> StoreResult<Option<T>> {
        let dir = self.appointment_dir(id);
        if !dir.join(APPOINTMENT_FILENAME).is_file() {
            return Ok(None);
        }

        with_lock(&dir.join(LOCK_FILENAME), || match self.read_appointment(id)? {
            Some(appointment) => f(appointment).map(Some),
            None => Ok(None),
        })
    }

    fn read_catalog(&self) -> StoreResult<Vec<VaccineCatalogEntry>> {
        Ok(read_yaml(&self.catalog_path())?.unwrap_or_default())
    }

    fn list_pet_files<T: DeserializeOwned>(
        &self,
        pet_id: &PetId,
        kind: &str,
    ) -> StoreResult<Vec<T>> {
        let dir = self.pet_dir(pet_id, kind);
        let entries = match fs::read_dir(&dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::FileRead(e)),
        };

        let mut items = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            match read_yaml::<T>(&path) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => tracing::warn!("skipping unreadable record {}: {}", path.display(), e),
            }
        }
        Ok(items)
    }
}

impl Store for FileStore {
    fn appointment(&self, id: &AppointmentId) -> StoreResult<Option<Appointment>> {
        self.read_appointment(id)
    }

    fn appointments_for_doctor_on(
        &self,
        doctor_id: &DoctorId,
        date: NaiveDate,
    ) -> StoreResult<Vec<Appointment>> {
        let appointments_dir = self.root.join(APPOINTMENTS_DIR_NAME);
        let entries = match fs::read_dir(&appointments_dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::FileRead(e)),
        };

        let mut found = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path().join(APPOINTMENT_FILENAME);
            if !path.is_file() {
                continue;
            }
            match read_yaml::<Appointment>(&path) {
                Ok(Some(a)) if &a.doctor_id == doctor_id && a.scheduled_date == date => {
                    found.push(a)
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("skipping unreadable appointment {}: {}", path.display(), e)
                }
            }
        }
        found.sort_by(|a, b| (a.scheduled_time, &a.id).cmp(&(b.scheduled_time, &b.id)));
        Ok(found)
    }

    fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<bool> {
        let dir = self.appointment_dir(&appointment.id);
        fs::create_dir_all(&dir).map_err(StoreError::DirCreation)?;

        with_lock(&dir.join(LOCK_FILENAME), || {
            let path = dir.join(APPOINTMENT_FILENAME);
            if path.exists() {
                return Ok(false);
            }
            write_yaml(&path, appointment)?;
            Ok(true)
        })
    }

    fn swap_status(
        &self,
        id: &AppointmentId,
        expected: AppointmentStatus,
        target: AppointmentStatus,
    ) -> StoreResult<StatusSwap> {
        let outcome = self.with_appointment_lock(id, |mut appointment| {
            if appointment.status != expected {
                return Ok(StatusSwap::Conflict(appointment.status));
            }
            appointment.status = target;
            write_yaml(&self.appointment_path(id), &appointment)?;
            Ok(StatusSwap::Swapped(appointment))
        })?;
        Ok(outcome.unwrap_or(StatusSwap::Missing))
    }

    fn append_medical_record(
        &self,
        appointment_id: &AppointmentId,
        required: AppointmentStatus,
        draft: MedicalRecordDraft,
        ids: &dyn IdGenerator,
    ) -> StoreResult<GuardedWrite<MedicalRecord>> {
        let outcome = self.with_appointment_lock(appointment_id, |appointment| {
            if appointment.status != required {
                return Ok(GuardedWrite::StatusMismatch(appointment.status));
            }
            let record = draft.into_record(ids.next_id()?, &appointment);
            let path = self
                .pet_dir(&record.pet_id, MEDICAL_RECORDS_DIR_NAME)
                .join(format!("{}.yaml", record.id));
            write_new_yaml(&path, &record)?;
            Ok(GuardedWrite::Written(record))
        })?;
        Ok(outcome.unwrap_or(GuardedWrite::Missing))
    }

    fn append_vaccination(
        &self,
        appointment_id: &AppointmentId,
        required: AppointmentStatus,
        draft: VaccinationDraft,
        ids: &dyn IdGenerator,
    ) -> StoreResult<GuardedWrite<VaccineAttachment>> {
        let outcome = self.with_appointment_lock(appointment_id, |appointment| {
            if appointment.status != required {
                return Ok(GuardedWrite::StatusMismatch(appointment.status));
            }
            let attachment = draft.into_record(ids.next_id()?, &appointment);
            let path = self
                .pet_dir(&attachment.pet_id, VACCINATIONS_DIR_NAME)
                .join(format!("{}.yaml", attachment.id));
            write_new_yaml(&path, &attachment)?;
            Ok(GuardedWrite::Written(attachment))
        })?;
        Ok(outcome.unwrap_or(GuardedWrite::Missing))
    }

    fn medical_records_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<MedicalRecord>> {
        let mut records: Vec<MedicalRecord> =
            self.list_pet_files(pet_id, MEDICAL_RECORDS_DIR_NAME)?;
        records.retain(|r| &r.pet_id == pet_id);
        sort_medical_records(&mut records);
        Ok(records)
    }

    fn vaccinations_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<VaccineAttachment>> {
        let mut records: Vec<VaccineAttachment> =
            self.list_pet_files(pet_id, VACCINATIONS_DIR_NAME)?;
        records.retain(|v| &v.pet_id == pet_id);
        sort_vaccinations(&mut records);
        Ok(records)
    }

    fn vaccine(&self, id: &VaccineId) -> StoreResult<Option<VaccineCatalogEntry>> {
        Ok(self
            .read_catalog()?
            .into_iter()
            .find(|entry| &entry.vaccine_id == id))
    }

    fn vaccine_catalog(&self) -> StoreResult<Vec<VaccineCatalogEntry>> {
        let mut entries = self.read_catalog()?;
        sort_catalog(&mut entries);
        Ok(entries)
    }

    fn upsert_vaccine(&self, entry: &VaccineCatalogEntry) -> StoreResult<()> {
        with_lock(&self.root.join(VACCINE_CATALOG_LOCK_FILENAME), || {
            let mut entries = self.read_catalog()?;
            match entries.iter_mut().find(|e| e.vaccine_id == entry.vaccine_id) {
                Some(existing) => existing.name = entry.name.clone(),
                None => entries.push(entry.clone()),
            }
            sort_catalog(&mut entries);
            write_yaml(&self.catalog_path(), &entries)
        })
    }
}

/// Runs `f` while holding an exclusive lock on `lock_path`.
fn with_lock<T>(lock_path: &Path, f: impl FnOnce() -> StoreResult<T>) -> StoreResult<T> {
    let lock_file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)
        .map_err(StoreError::Lock)?;
    FileExt::lock_exclusive(&lock_file).map_err(StoreError::Lock)?;

    let result = f();

    if let Err(e) = FileExt::unlock(&lock_file) {
        tracing::warn!("failed to release lock {}: {}", lock_path.display(), e);
    }
    result
}

/// Reads and parses a YAML file. A missing file is `Ok(None)`.
fn read_yaml<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::FileRead(e)),
    };
    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(StoreError::YamlDeserialization)
}

/// Writes `value` to a temporary sibling and renames it over `path`.
fn write_yaml<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(StoreError::DirCreation)?;
    }
    let yaml = serde_yaml::to_string(value).map_err(StoreError::YamlSerialization)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, yaml).map_err(StoreError::FileWrite)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::FileWrite(e)
    })
}

/// Like [`write_yaml`], but refuses to replace an existing record.
fn write_new_yaml<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    if path.exists() {
        return Err(StoreError::Corrupt(format!(
            "record {} already exists",
            path.display()
        )));
    }
    write_yaml(path, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, FileStore) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).expect("open store");
        (temp_dir, store)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn test_insert_and_fetch() {
        let (_tmp, store) = setup_store();
        contract::insert_and_fetch(&store);
    }

    #[test]
    fn test_doctor_day_listing() {
        let (_tmp, store) = setup_store();
        contract::doctor_day_listing_is_filtered_and_ordered(&store);
    }

    #[test]
    fn test_swap_status() {
        let (_tmp, store) = setup_store();
        contract::swap_status_is_compare_and_swap(&store);
    }

    #[test]
    fn test_guarded_appends() {
        let (_tmp, store) = setup_store();
        contract::guarded_appends_check_status(&store);
    }

    #[test]
    fn test_guarded_appends_race_a_revert() {
        for _ in 0..10 {
            let (_tmp, store) = setup_store();
            contract::guarded_appends_race_a_revert(&store);
        }
    }

    #[test]
    fn test_histories() {
        let (_tmp, store) = setup_store();
        contract::histories_are_oldest_first_and_not_deduplicated(&store);
    }

    #[test]
    fn test_catalogue() {
        let (_tmp, store) = setup_store();
        contract::catalogue_upsert_and_order(&store);
    }

    #[test]
    fn test_layout_on_disk() {
        let (tmp, store) = setup_store();
        let a1 = contract::appointment("A1", "D1", day(), 9);
        store.insert_appointment(&a1).unwrap();

        let appointment_dir = tmp.path().join("appointments").join("A1");
        assert!(appointment_dir.join("appointment.yaml").is_file());
        assert!(appointment_dir.join(".lock").is_file());
        assert!(!appointment_dir.join("appointment.yaml.tmp").exists());

        let contents = fs::read_to_string(appointment_dir.join("appointment.yaml")).unwrap();
        assert!(contents.contains("status: Waiting"));
    }

    #[test]
    fn test_missing_appointment_leaves_no_trace() {
        let (tmp, store) = setup_store();
        let missing = AppointmentId::new("ghost").unwrap();

        assert_eq!(
            store
                .swap_status(&missing, AppointmentStatus::Waiting, AppointmentStatus::Accepted)
                .unwrap(),
            StatusSwap::Missing
        );
        assert!(!tmp.path().join("appointments").join("ghost").exists());
    }

    #[test]
    fn test_corrupt_appointment_is_skipped_in_listing() {
        let (tmp, store) = setup_store();
        store
            .insert_appointment(&contract::appointment("A1", "D1", day(), 9))
            .unwrap();

        let broken = tmp.path().join("appointments").join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("appointment.yaml"), "status: [not valid").unwrap();

        let listed = store
            .appointments_for_doctor_on(&DoctorId::new("D1").unwrap(), day())
            .unwrap();
        assert_eq!(listed.len(), 1);

        assert!(matches!(
            store.appointment(&AppointmentId::new("broken").unwrap()),
            Err(StoreError::YamlDeserialization(_))
        ));
    }

    #[test]
    fn test_reopened_store_sees_existing_data() {
        let (tmp, store) = setup_store();
        let a1 = contract::appointment("A1", "D1", day(), 9);
        store.insert_appointment(&a1).unwrap();
        drop(store);

        let reopened = FileStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.appointment(&a1.id).unwrap(), Some(a1));
    }

    #[test]
    fn test_concurrent_swaps_have_one_winner() {
        let (_tmp, store) = setup_store();
        let a1 = contract::appointment("A1", "D1", day(), 9);
        store.insert_appointment(&a1).unwrap();
        let store = Arc::new(store);

        let handles: Vec<_> = [AppointmentStatus::Accepted, AppointmentStatus::Rejected]
            .into_iter()
            .cycle()
            .take(8)
            .map(|target| {
                let store = Arc::clone(&store);
                let id = a1.id.clone();
                std::thread::spawn(move || {
                    store
                        .swap_status(&id, AppointmentStatus::Waiting, target)
                        .unwrap()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| matches!(outcome, StatusSwap::Swapped(_)))
            .count();
        assert_eq!(winners, 1);
    }
}
