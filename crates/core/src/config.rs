//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! nothing reads process-wide environment variables during request handling.

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_MAX_STATUS_ATTEMPTS};
use crate::error::{ClinicError, ClinicResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which [`Store`](crate::store::Store) implementation backs the services.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreBackend {
    /// Process-local; contents vanish on exit.
    Memory,
    /// YAML files under [`CoreConfig::data_dir`].
    #[default]
    File,
}

impl FromStr for StoreBackend {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            other => Err(ClinicError::Config(format!(
                "unknown store backend '{}' (expected 'memory' or 'file')",
                other
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::File => f.write_str("file"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    store_backend: StoreBackend,
    max_status_attempts: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Config`] if `max_status_attempts` is zero.
    pub fn new(
        data_dir: PathBuf,
        store_backend: StoreBackend,
        max_status_attempts: usize,
    ) -> ClinicResult<Self> {
        if max_status_attempts == 0 {
            return Err(ClinicError::Config(
                "max_status_attempts must be at least 1".into(),
            ));
        }

        Ok(Self {
            data_dir,
            store_backend,
            max_status_attempts,
        })
    }

    /// In-memory configuration with defaults, for tests and demos.
    pub fn in_memory() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            store_backend: StoreBackend::Memory,
            max_status_attempts: DEFAULT_MAX_STATUS_ATTEMPTS,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store_backend(&self) -> StoreBackend {
        self.store_backend
    }

    pub fn max_status_attempts(&self) -> usize {
        self.max_status_attempts
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data directory from an optional value, falling back to [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the store backend from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`StoreBackend::File`].
pub fn store_backend_from_env_value(value: Option<String>) -> ClinicResult<StoreBackend> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<StoreBackend>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse the status-change attempt bound from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_STATUS_ATTEMPTS`].
pub fn max_status_attempts_from_env_value(value: Option<String>) -> ClinicResult<usize> {
    match non_blank(value) {
        None => Ok(DEFAULT_MAX_STATUS_ATTEMPTS),
        Some(v) => match v.parse::<usize>() {
            Ok(0) | Err(_) => Err(ClinicError::Config(format!(
                "max status attempts must be a positive integer, got '{}'",
                v
            ))),
            Ok(n) => Ok(n),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_attempts() {
        let err = CoreConfig::new(PathBuf::from("x"), StoreBackend::File, 0).unwrap_err();
        assert!(matches!(err, ClinicError::Config(_)));
    }

    #[test]
    fn store_backend_defaults_to_file() {
        assert_eq!(store_backend_from_env_value(None).unwrap(), StoreBackend::File);
        assert_eq!(
            store_backend_from_env_value(Some("   ".into())).unwrap(),
            StoreBackend::File
        );
    }

    #[test]
    fn store_backend_parses_known_values() {
        assert_eq!(
            store_backend_from_env_value(Some("Memory".into())).unwrap(),
            StoreBackend::Memory
        );
        assert!(store_backend_from_env_value(Some("postgres".into())).is_err());
    }

    #[test]
    fn max_attempts_parsing() {
        assert_eq!(
            max_status_attempts_from_env_value(None).unwrap(),
            DEFAULT_MAX_STATUS_ATTEMPTS
        );
        assert_eq!(max_status_attempts_from_env_value(Some("3".into())).unwrap(), 3);
        assert!(max_status_attempts_from_env_value(Some("0".into())).is_err());
        assert!(max_status_attempts_from_env_value(Some("many".into())).is_err());
    }

    #[test]
    fn data_dir_falls_back_to_default() {
        assert_eq!(data_dir_from_env_value(None), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            data_dir_from_env_value(Some("/srv/vet".into())),
            PathBuf::from("/srv/vet")
        );
    }
}
