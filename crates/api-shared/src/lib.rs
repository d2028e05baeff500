//! # API Shared
//!
//! Shared utilities and definitions for the VetHere API.
//!
//! Contains:
//! - Wire types (`dto` module) and the `{ meta, data }` response envelope
//! - Shared services like `HealthService`
//! - Bearer-token validation
//!
//! Used by `api-rest`; kept free of any HTTP framework.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{validate_bearer, AuthError};
pub use dto::*;
pub use health::HealthService;
