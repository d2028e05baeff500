//! Wiring of the store, clock and id source into the two domain services.

use crate::clock::{Clock, IdGenerator, SystemClock, TimestampIds};
use crate::config::{CoreConfig, StoreBackend};
use crate::coordinator::ClinicalRecordCoordinator;
use crate::error::ClinicResult;
use crate::lifecycle::AppointmentLifecycle;
use crate::store::{FileStore, MemoryStore, Store};
use std::sync::Arc;

/// The lifecycle and the coordinator sharing one store.
#[derive(Clone)]
pub struct ClinicServices {
    store: Arc<dyn Store>,
    lifecycle: AppointmentLifecycle,
    coordinator: ClinicalRecordCoordinator,
}

impl ClinicServices {
    /// Opens the configured store with the system clock and timestamp-prefixed record ids.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::StoreUnavailable`](crate::ClinicError::StoreUnavailable) if the
    /// file store's directory cannot be prepared.
    pub fn open(cfg: &CoreConfig) -> ClinicResult<Self> {
        let store: Arc<dyn Store> = match cfg.store_backend() {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::File => Arc::new(FileStore::open(cfg.data_dir())?),
        };
        tracing::info!(
            "opened {} store (data dir {})",
            cfg.store_backend(),
            cfg.data_dir().display()
        );

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ids = Arc::new(TimestampIds::new(clock.clone()));
        Ok(Self::with_parts(store, clock, ids, cfg.max_status_attempts()))
    }

    pub fn with_parts(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        max_status_attempts: usize,
    ) -> Self {
        Self {
            lifecycle: AppointmentLifecycle::new(store.clone(), max_status_attempts),
            coordinator: ClinicalRecordCoordinator::new(store.clone(), clock, ids),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn lifecycle(&self) -> &AppointmentLifecycle {
        &self.lifecycle
    }

    pub fn coordinator(&self) -> &ClinicalRecordCoordinator {
        &self.coordinator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VaccineCatalogEntry, VaccineId};
    use tempfile::TempDir;

    #[test]
    fn test_open_file_backend_creates_layout() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("data");
        let cfg = CoreConfig::new(data_dir.clone(), StoreBackend::File, 8).unwrap();

        let services = ClinicServices::open(&cfg).unwrap();
        assert!(data_dir.join("appointments").is_dir());
        assert!(data_dir.join("pets").is_dir());

        services
            .store()
            .upsert_vaccine(&VaccineCatalogEntry {
                vaccine_id: VaccineId::new("rabies-v1").unwrap(),
                name: "Rabies".into(),
            })
            .unwrap();
        assert_eq!(services.coordinator().vaccine_catalog().unwrap().len(), 1);
    }

    #[test]
    fn test_open_memory_backend() {
        let services = ClinicServices::open(&CoreConfig::in_memory()).unwrap();
        assert!(services.coordinator().vaccine_catalog().unwrap().is_empty());
    }
}
