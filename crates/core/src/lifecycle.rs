//! # Appointment lifecycle
//!
//! The status state machine for appointments:
//!
//! ```text
//! Waiting ──► Accepted ──► Finished
//!    │  ◄──────┘
//!    ▼
//! Rejected
//! ```
//!
//! `Rejected` and `Finished` are terminal. Asking for the status an appointment already has is a
//! successful no-op, terminal statuses included.
//!
//! Status writes go through [`Store::swap_status`]. If another writer changes the status between
//! the read and the swap, the transition is re-validated against the fresh status and retried, up
//! to a configured number of attempts.

use crate::error::{ClinicError, ClinicResult};
use crate::model::{Appointment, AppointmentId, AppointmentStatus, DoctorId, PermittedActions};
use crate::store::{StatusSwap, Store};
use chrono::NaiveDate;
use std::sync::Arc;

/// Whether an appointment in `from` may be moved to `to`.
///
/// A move to the current status is always allowed.
pub fn transition_allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use crate::model::AppointmentStatus::*;

    from == to
        || matches!(
            (from, to),
            (Waiting, Accepted) | (Waiting, Rejected) | (Accepted, Finished) | (Accepted, Waiting)
        )
}

/// Statuses reachable from `from` in one step, excluding `from` itself.
pub fn next_statuses(from: AppointmentStatus) -> Vec<AppointmentStatus> {
    AppointmentStatus::ALL
        .into_iter()
        .filter(|to| *to != from && transition_allowed(from, *to))
        .collect()
}

/// Enforces valid status transitions and answers lifecycle queries.
#[derive(Clone)]
pub struct AppointmentLifecycle {
    store: Arc<dyn Store>,
    max_attempts: usize,
}

impl AppointmentLifecycle {
    /// `max_attempts` is clamped to at least one.
    pub fn new(store: Arc<dyn Store>, max_attempts: usize) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Moves an appointment to `target`.
    ///
    /// # Errors
    ///
    /// - [`ClinicError::NotFound`] if no appointment has this id.
    /// - [`ClinicError::InvalidTransition`] if the edge is not in the transition table.
    /// - [`ClinicError::ConcurrentModification`] if the status kept changing underneath us.
    /// - [`ClinicError::StoreUnavailable`] on any storage failure.
    pub fn change_status(
        &self,
        id: &AppointmentId,
        target: AppointmentStatus,
    ) -> ClinicResult<Appointment> {
        for attempt in 1..=self.max_attempts {
            let current = self.appointment(id)?;

            if current.status == target {
                tracing::debug!("appointment {} already {}", id, target);
                return Ok(current);
            }

            if !transition_allowed(current.status, target) {
                tracing::warn!(
                    "rejected transition for appointment {}: {} -> {}",
                    id,
                    current.status,
                    target
                );
                return Err(ClinicError::InvalidTransition {
                    from: current.status,
                    to: target,
                });
            }

            match self.store.swap_status(id, current.status, target)? {
                StatusSwap::Swapped(updated) => {
                    tracing::info!(
                        "appointment {} moved {} -> {}",
                        id,
                        current.status,
                        updated.status
                    );
                    return Ok(updated);
                }
                StatusSwap::Missing => return Err(ClinicError::appointment_not_found(id)),
                StatusSwap::Conflict(found) => {
                    tracing::debug!(
                        "appointment {} changed to {} during update (attempt {}/{})",
                        id,
                        found,
                        attempt,
                        self.max_attempts
                    );
                }
            }
        }

        tracing::warn!(
            "giving up on appointment {} after {} attempts",
            id,
            self.max_attempts
        );
        Err(ClinicError::ConcurrentModification {
            id: id.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// The appointment's status and what may be done with it now.
    pub fn permitted_actions(&self, id: &AppointmentId) -> ClinicResult<PermittedActions> {
        let appointment = self.appointment(id)?;
        Ok(PermittedActions {
            transitions: next_statuses(appointment.status),
            can_file_records: appointment.status == AppointmentStatus::Accepted,
            status: appointment.status,
            appointment_id: appointment.id,
        })
    }

    pub fn appointment(&self, id: &AppointmentId) -> ClinicResult<Appointment> {
        self.store
            .appointment(id)?
            .ok_or_else(|| ClinicError::appointment_not_found(id))
    }

    /// A doctor's appointments for one day, ordered by time.
    pub fn appointments_for_doctor(
        &self,
        doctor_id: &DoctorId,
        date: NaiveDate,
    ) -> ClinicResult<Vec<Appointment>> {
        let appointments = self.store.appointments_for_doctor_on(doctor_id, date)?;
        tracing::debug!(
            "doctor {} has {} appointment(s) on {}",
            doctor_id,
            appointments.len(),
            date
        );
        Ok(appointments)
    }

    /// Records a booking made elsewhere. The appointment must be in `Waiting`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Validation`] if the status is not `Waiting` or the id is taken.
    pub fn register_booking(&self, appointment: Appointment) -> ClinicResult<Appointment> {
        if appointment.status != AppointmentStatus::Waiting {
            return Err(ClinicError::Validation(format!(
                "new appointments start in Waiting, not {}",
                appointment.status
            )));
        }
        if !self.store.insert_appointment(&appointment)? {
            return Err(ClinicError::Validation(format!(
                "appointment {} already exists",
                appointment.id
            )));
        }
        tracing::info!(
            "booked appointment {} for pet {} with doctor {}",
            appointment.id,
            appointment.pet_id,
            appointment.doctor_id
        );
        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::IdGenerator;
    use crate::error::StoreResult;
    use crate::model::{
        ClientId, MedicalRecord, PetId, VaccineAttachment, VaccineCatalogEntry, VaccineId,
    };
    use crate::store::{GuardedWrite, MedicalRecordDraft, MemoryStore, VaccinationDraft};
    use chrono::NaiveTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::model::AppointmentStatus::*;

    fn booked(id: &str) -> Appointment {
        Appointment::booked(
            AppointmentId::new(id).unwrap(),
            ClientId::new("C1").unwrap(),
            PetId::new("P1").unwrap(),
            DoctorId::new("D1").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        )
    }

    fn lifecycle_with(status: AppointmentStatus) -> (AppointmentLifecycle, AppointmentId) {
        let mut appointment = booked("A1");
        appointment.status = status;
        let id = appointment.id.clone();
        let store = Arc::new(MemoryStore::new().with_appointment(appointment));
        (AppointmentLifecycle::new(store, 8), id)
    }

    #[test]
    fn test_transition_table() {
        let allowed = [
            (Waiting, Accepted),
            (Waiting, Rejected),
            (Accepted, Finished),
            (Accepted, Waiting),
        ];
        for from in AppointmentStatus::ALL {
            for to in AppointmentStatus::ALL {
                let expected = from == to || allowed.contains(&(from, to));
                assert_eq!(
                    transition_allowed(from, to),
                    expected,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_statuses_reject_every_other_target() {
        for terminal in [Rejected, Finished] {
            for target in AppointmentStatus::ALL.into_iter().filter(|s| *s != terminal) {
                let (lifecycle, id) = lifecycle_with(terminal);
                match lifecycle.change_status(&id, target) {
                    Err(ClinicError::InvalidTransition { from, to }) => {
                        assert_eq!(from, terminal);
                        assert_eq!(to, target);
                    }
                    other => panic!("expected InvalidTransition, got {other:?}"),
                }
                assert_eq!(lifecycle.appointment(&id).unwrap().status, terminal);
            }
        }
    }

    #[test]
    fn test_same_status_is_a_noop_for_every_status() {
        for status in AppointmentStatus::ALL {
            let (lifecycle, id) = lifecycle_with(status);
            let before = lifecycle.appointment(&id).unwrap();
            let after = lifecycle.change_status(&id, status).unwrap();
            assert_eq!(after, before);
            assert_eq!(lifecycle.appointment(&id).unwrap(), before);
        }
    }

    #[test]
    fn test_accept_then_revert_then_reject() {
        let (lifecycle, id) = lifecycle_with(Waiting);

        let accepted = lifecycle.change_status(&id, Accepted).unwrap();
        assert_eq!(accepted.status, Accepted);
        assert_eq!(accepted.pet_id.as_str(), "P1");

        assert_eq!(lifecycle.change_status(&id, Waiting).unwrap().status, Waiting);
        assert_eq!(lifecycle.change_status(&id, Rejected).unwrap().status, Rejected);
    }

    #[test]
    fn test_waiting_cannot_jump_to_finished() {
        let (lifecycle, id) = lifecycle_with(Waiting);
        assert!(matches!(
            lifecycle.change_status(&id, Finished),
            Err(ClinicError::InvalidTransition {
                from: Waiting,
                to: Finished
            })
        ));
    }

    #[test]
    fn test_missing_appointment_is_not_found() {
        let lifecycle = AppointmentLifecycle::new(Arc::new(MemoryStore::new()), 8);
        let missing = AppointmentId::new("missing-id").unwrap();
        match lifecycle.change_status(&missing, Accepted) {
            Err(ClinicError::NotFound { kind, id }) => {
                assert_eq!(kind, "appointment");
                assert_eq!(id, "missing-id");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_store_outage_is_propagated() {
        let store = Arc::new(MemoryStore::new().with_appointment(booked("A1")));
        store.set_unavailable(true);
        let lifecycle = AppointmentLifecycle::new(store, 8);

        assert!(matches!(
            lifecycle.change_status(&AppointmentId::new("A1").unwrap(), Accepted),
            Err(ClinicError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_permitted_actions() {
        let (lifecycle, id) = lifecycle_with(Waiting);
        let actions = lifecycle.permitted_actions(&id).unwrap();
        assert_eq!(actions.status, Waiting);
        assert_eq!(actions.transitions, vec![Accepted, Rejected]);
        assert!(!actions.can_file_records);

        lifecycle.change_status(&id, Accepted).unwrap();
        let actions = lifecycle.permitted_actions(&id).unwrap();
        assert_eq!(actions.transitions, vec![Waiting, Finished]);
        assert!(actions.can_file_records);

        lifecycle.change_status(&id, Finished).unwrap();
        let actions = lifecycle.permitted_actions(&id).unwrap();
        assert!(actions.transitions.is_empty());
        assert!(!actions.can_file_records);
    }

    #[test]
    fn test_register_booking() {
        let lifecycle = AppointmentLifecycle::new(Arc::new(MemoryStore::new()), 8);
        lifecycle.register_booking(booked("A1")).unwrap();

        assert!(matches!(
            lifecycle.register_booking(booked("A1")),
            Err(ClinicError::Validation(_))
        ));

        let mut accepted = booked("A2");
        accepted.status = Accepted;
        assert!(matches!(
            lifecycle.register_booking(accepted),
            Err(ClinicError::Validation(_))
        ));

        let listed = lifecycle
            .appointments_for_doctor(
                &DoctorId::new("D1").unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            )
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    /// Reports a conflicting status on every swap, as if another writer always won.
    struct ContendedStore {
        inner: MemoryStore,
        swaps: AtomicUsize,
    }

    impl Store for ContendedStore {
        fn appointment(&self, id: &AppointmentId) -> StoreResult<Option<Appointment>> {
            self.inner.appointment(id)
        }
        fn appointments_for_doctor_on(
            &self,
            doctor_id: &DoctorId,
            date: NaiveDate,
        ) -> StoreResult<Vec<Appointment>> {
            self.inner.appointments_for_doctor_on(doctor_id, date)
        }
        fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<bool> {
            self.inner.insert_appointment(appointment)
        }
        fn swap_status(
            &self,
            _id: &AppointmentId,
            _expected: AppointmentStatus,
            _target: AppointmentStatus,
        ) -> StoreResult<StatusSwap> {
            self.swaps.fetch_add(1, Ordering::SeqCst);
            Ok(StatusSwap::Conflict(Accepted))
        }
        fn append_medical_record(
            &self,
            appointment_id: &AppointmentId,
            required: AppointmentStatus,
            draft: MedicalRecordDraft,
            ids: &dyn IdGenerator,
        ) -> StoreResult<GuardedWrite<MedicalRecord>> {
            self.inner
                .append_medical_record(appointment_id, required, draft, ids)
        }
        fn append_vaccination(
            &self,
            appointment_id: &AppointmentId,
            required: AppointmentStatus,
            draft: VaccinationDraft,
            ids: &dyn IdGenerator,
        ) -> StoreResult<GuardedWrite<VaccineAttachment>> {
            self.inner
                .append_vaccination(appointment_id, required, draft, ids)
        }
        fn medical_records_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<MedicalRecord>> {
            self.inner.medical_records_for_pet(pet_id)
        }
        fn vaccinations_for_pet(&self, pet_id: &PetId) -> StoreResult<Vec<VaccineAttachment>> {
            self.inner.vaccinations_for_pet(pet_id)
        }
        fn vaccine(&self, id: &VaccineId) -> StoreResult<Option<VaccineCatalogEntry>> {
            self.inner.vaccine(id)
        }
        fn vaccine_catalog(&self) -> StoreResult<Vec<VaccineCatalogEntry>> {
            self.inner.vaccine_catalog()
        }
        fn upsert_vaccine(&self, entry: &VaccineCatalogEntry) -> StoreResult<()> {
            self.inner.upsert_vaccine(entry)
        }
    }

    #[test]
    fn test_gives_up_after_bounded_conflicts() {
        let store = Arc::new(ContendedStore {
            inner: MemoryStore::new().with_appointment(booked("A1")),
            swaps: AtomicUsize::new(0),
        });
        let lifecycle = AppointmentLifecycle::new(store.clone(), 3);

        match lifecycle.change_status(&AppointmentId::new("A1").unwrap(), Accepted) {
            Err(ClinicError::ConcurrentModification { id, attempts }) => {
                assert_eq!(id, "A1");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected ConcurrentModification, got {other:?}"),
        }
        assert_eq!(store.swaps.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_concurrent_changes_are_serialised() {
        let store = Arc::new(MemoryStore::new().with_appointment(booked("A1")));
        let lifecycle = AppointmentLifecycle::new(store, 8);
        let id = AppointmentId::new("A1").unwrap();

        let handles: Vec<_> = [Accepted, Rejected]
            .into_iter()
            .map(|target| {
                let lifecycle = lifecycle.clone();
                let id = id.clone();
                std::thread::spawn(move || lifecycle.change_status(&id, target))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let final_status = lifecycle.appointment(&id).unwrap().status;
        // Either Waiting->Rejected won (Accepted then fails) or Waiting->Accepted won (Rejected
        // then fails, since Accepted->Rejected is not an edge).
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(matches!(final_status, Accepted | Rejected));
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, ClinicError::InvalidTransition { .. }))
        );
    }
}
