//! Identifier utilities.
//!
//! VetHere generates identifiers for the records it creates (medical records and vaccine
//! attachments). Appointment, pet and vaccine identifiers come from elsewhere and are opaque.
//!
//! This crate provides:
//! - [`CanonicalUuid`], a UUID that is always rendered as **32 lowercase hexadecimal
//!   characters** (no hyphens), so it can be used verbatim as a file name.
//! - [`TimestampId`], a time-prefixed identifier (`YYYYMMDDTHHMMSS.mmmZ-<canonical uuid>`) whose
//!   lexical order is its creation order.
//! - [`TimestampIdGenerator`], a thread-safe generator that never hands out a timestamp
//!   earlier than or equal to the previous one.
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`

mod service;

pub use service::{CanonicalUuid, TimestampId, TimestampIdGenerator};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
