//! Canonical UUIDs and timestamp-prefixed identifiers.

use crate::{UuidError, UuidResult};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::sync::Mutex;
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
use ::uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3f";

/// A UUID held in canonical form (32 lowercase hex characters, no hyphens).
///
/// # Construction
/// - [`CanonicalUuid::new`] generates a fresh v4 UUID.
/// - [`CanonicalUuid::parse`] validates an externally supplied identifier. Hyphenated or
///   uppercase forms are rejected rather than normalised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalUuid(Uuid);

impl Default for CanonicalUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalUuid {
    /// Generates a new random (v4) UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not 32 lowercase hex characters.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }

        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid UUID '{}': {}", input, e)))
    }

    /// Purely syntactic check: exactly 32 bytes of `0-9a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for CanonicalUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for CanonicalUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalUuid::parse(s)
    }
}

/// A time-prefixed identifier.
///
/// Format: `YYYYMMDDTHHMMSS.mmmZ-<canonical_uuid>`
///
/// Example: `20260111T143522.045Z-550e8400e29b41d4a716446655440000`
///
/// The timestamp has millisecond precision, so the string form round-trips exactly and sorts
/// chronologically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimestampId {
    timestamp: DateTime<Utc>,
    uuid: CanonicalUuid,
}

impl TimestampId {
    /// Builds an identifier for `now`, bumped to at least 1 ms after `last` when given.
    pub fn generate_at(now: DateTime<Utc>, last: Option<&TimestampId>) -> Self {
        let now = now.trunc_subsecs(3);

        let timestamp = match last {
            Some(prev) if now <= prev.timestamp => prev.timestamp + Duration::milliseconds(1),
            _ => now,
        };

        Self {
            timestamp,
            uuid: CanonicalUuid::new(),
        }
    }
}

impl FromStr for TimestampId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts_str, uuid_str) = s.split_once('-').ok_or_else(|| {
            UuidError::InvalidInput(format!("Invalid timestamp id format: '{}'", s))
        })?;

        let ts_no_z = ts_str.strip_suffix('Z').ok_or_else(|| {
            UuidError::InvalidInput(format!("Timestamp must end with 'Z': '{}'", ts_str))
        })?;

        let naive = chrono::NaiveDateTime::parse_from_str(ts_no_z, TIMESTAMP_FORMAT).map_err(
            |e| UuidError::InvalidInput(format!("Invalid timestamp format '{}': {}", ts_str, e)),
        )?;

        Ok(Self {
            timestamp: DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
            uuid: CanonicalUuid::parse(uuid_str)?,
        })
    }
}

impl fmt::Display for TimestampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Z-{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.uuid
        )
    }
}

/// Hands out strictly increasing [`TimestampId`]s, safe to share between threads.
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: Mutex<Option<TimestampId>>,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the next identifier for the supplied instant.
    pub fn next_at(&self, now: DateTime<Utc>) -> TimestampId {
        // The last id stays a valid lower bound even if the lock was poisoned.
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        let id = TimestampId::generate_at(now, last.as_ref());
        *last = Some(id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_generates_canonical_uuid() {
        let canonical = CanonicalUuid::new().to_string();
        assert_eq!(canonical.len(), 32);
        assert!(CanonicalUuid::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_uuid() {
        let canonical = "550e8400e29b41d4a716446655440000";
        assert_eq!(CanonicalUuid::parse(canonical).unwrap().to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_hyphenated_uuid() {
        match CanonicalUuid::parse("550e8400-e29b-41d4-a716-446655440000") {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_is_canonical_invalid() {
        assert!(!CanonicalUuid::is_canonical(
            "550E8400E29B41D4A716446655440000"
        ));
        assert!(!CanonicalUuid::is_canonical(
            "550e8400e29b41d4a71644665544000"
        ));
        assert!(!CanonicalUuid::is_canonical(
            "550e8400e29b41d4a716446655440zzz"
        ));
        assert!(!CanonicalUuid::is_canonical(""));
    }

    #[test]
    fn test_timestamp_id_display_format() {
        let now = Utc.with_ymd_and_hms(2026, 1, 11, 14, 35, 22).unwrap()
            + Duration::milliseconds(45);
        let id = TimestampId::generate_at(now, None);
        let displayed = id.to_string();

        assert!(displayed.starts_with("20260111T143522.045Z-"));
        let (_, uuid) = displayed.split_once('-').unwrap();
        assert!(CanonicalUuid::is_canonical(uuid));
    }

    #[test]
    fn test_timestamp_id_truncates_to_millis() {
        let now = Utc.with_ymd_and_hms(2026, 1, 11, 14, 35, 22).unwrap()
            + Duration::microseconds(45_678);
        let id = TimestampId::generate_at(now, None);
        let parsed: TimestampId = id.to_string().parse().unwrap();

        assert_eq!(parsed, id);
        assert_eq!(id.timestamp.timestamp_subsec_millis(), 45);
    }

    #[test]
    fn test_timestamp_id_generate_monotonic_same_instant() {
        let now = Utc::now();
        let first = TimestampId::generate_at(now, None);
        let second = TimestampId::generate_at(now, Some(&first));

        assert!(second.timestamp > first.timestamp);
    }

    #[test]
    fn test_timestamp_id_clock_going_backwards() {
        let now = Utc::now();
        let first = TimestampId::generate_at(now, None);
        let second = TimestampId::generate_at(now - Duration::seconds(5), Some(&first));

        assert_eq!(second.timestamp, first.timestamp + Duration::milliseconds(1));
    }

    #[test]
    fn test_timestamp_id_parse_errors() {
        let missing_hyphen = "20260111T143522.045Z550e8400e29b41d4a716446655440000";
        match TimestampId::from_str(missing_hyphen) {
            Err(UuidError::InvalidInput(msg)) => assert!(msg.contains("Invalid timestamp id")),
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }

        let missing_z = "20260111T143522.045-550e8400e29b41d4a716446655440000";
        match TimestampId::from_str(missing_z) {
            Err(UuidError::InvalidInput(msg)) => assert!(msg.contains("must end with 'Z'")),
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }

        let bad_date = "20260199T143522.045Z-550e8400e29b41d4a716446655440000";
        assert!(TimestampId::from_str(bad_date).is_err());

        let bad_uuid = "20260111T143522.045Z-not-a-valid-uuid";
        assert!(TimestampId::from_str(bad_uuid).is_err());
    }

    #[test]
    fn test_timestamp_id_round_trip() {
        let original = "20260111T143522.045Z-550e8400e29b41d4a716446655440000";
        let parsed = TimestampId::from_str(original).unwrap();
        assert_eq!(parsed.to_string(), original);
    }

    #[test]
    fn test_generator_orders_lexically() {
        let generator = TimestampIdGenerator::new();
        let now = Utc::now();
        let ids: Vec<String> = (0..5).map(|_| generator.next_at(now).to_string()).collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_generator_is_shareable_between_threads() {
        let generator = std::sync::Arc::new(TimestampIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| generator.next_at(Utc::now()).to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }
}
