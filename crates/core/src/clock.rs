//! Time and identifier sources.
//!
//! Both are injected into the
//! [`ClinicalRecordCoordinator`](crate::coordinator::ClinicalRecordCoordinator) so tests and
//! demos can pin them.

use crate::error::{StoreError, StoreResult};
use crate::model::RecordId;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use vethere_uuid::TimestampIdGenerator;

/// Supplies the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Supplies unique identifiers for newly created records.
///
/// Stores call this inside their guarded appends, after the status check has passed.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> StoreResult<RecordId>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Timestamp-prefixed identifiers (`YYYYMMDDTHHMMSS.mmmZ-<uuid>`), strictly increasing.
///
/// Sorting record ids therefore sorts records by creation.
pub struct TimestampIds {
    clock: Arc<dyn Clock>,
    generator: TimestampIdGenerator,
}

impl TimestampIds {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            generator: TimestampIdGenerator::new(),
        }
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&self) -> StoreResult<RecordId> {
        let id = self.generator.next_at(self.clock.now());
        RecordId::new(id.to_string()).map_err(|e| StoreError::IdAllocation(e.to_string()))
    }
}

/// Predictable identifiers: `<prefix>-0001`, `<prefix>-0002`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> StoreResult<RecordId> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        RecordId::new(format!("{}-{:04}", self.prefix, n))
            .map_err(|e| StoreError::IdAllocation(e.to_string()))
    }
}
