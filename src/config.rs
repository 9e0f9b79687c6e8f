//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::store::keys;

/// What to do when writing the draft snapshot fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistFailurePolicy {
    /// Log a warning and keep going; the in-memory draft stays authoritative.
    #[default]
    Log,
    /// Return the storage error to the caller after applying the change in memory.
    Report,
}

impl std::str::FromStr for PersistFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "ignore" => Ok(Self::Log),
            "report" | "strict" => Ok(Self::Report),
            other => Err(ConfigError::InvalidValue {
                key: "NEWBRIDGE_PERSIST_FAILURES".into(),
                message: format!("expected 'log' or 'report', got '{other}'"),
            }),
        }
    }
}

/// Form store options.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// User id the snapshot is stored under.
    pub user_id: String,
    /// Fixed storage name of the snapshot.
    pub storage_key: String,
    pub persist_failures: PersistFailurePolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            user_id: keys::DEFAULT_USER.to_string(),
            storage_key: keys::ONBOARDING_STORAGE.to_string(),
            persist_failures: PersistFailurePolicy::Log,
        }
    }
}

/// Service configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub store: StoreOptions,
    /// Simulated latency of the mock address book.
    pub lookup_latency: Duration,
    /// Simulated processing time of the stub application intake.
    pub intake_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: PathBuf::from("./data/newbridge.db"),
            store: StoreOptions::default(),
            lookup_latency: Duration::from_millis(300),
            intake_delay: Duration::from_millis(1000),
        }
    }
}

impl AppConfig {
    /// Build config from `NEWBRIDGE_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_or(&get, "NEWBRIDGE_PORT", defaults.port)?;
        let db_path = get("NEWBRIDGE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let persist_failures = match get("NEWBRIDGE_PERSIST_FAILURES") {
            Some(v) => v.parse()?,
            None => defaults.store.persist_failures,
        };
        let store = StoreOptions {
            user_id: get("NEWBRIDGE_USER_ID").unwrap_or(defaults.store.user_id),
            storage_key: get("NEWBRIDGE_STORAGE_KEY").unwrap_or(defaults.store.storage_key),
            persist_failures,
        };

        let millis = |key: &str, default: Duration| -> Result<Duration, ConfigError> {
            parse_or(&get, key, default.as_millis() as u64).map(Duration::from_millis)
        };

        Ok(Self {
            port,
            db_path,
            store,
            lookup_latency: millis("NEWBRIDGE_LOOKUP_LATENCY_MS", defaults.lookup_latency)?,
            intake_delay: millis("NEWBRIDGE_INTAKE_DELAY_MS", defaults.intake_delay)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.store.storage_key, "newbridge-onboarding-storage");
        assert_eq!(config.store.persist_failures, PersistFailurePolicy::Log);
        assert_eq!(config.lookup_latency, Duration::from_millis(300));
        assert_eq!(config.intake_delay, Duration::from_secs(1));
    }

    #[test]
    fn overrides_from_env() {
        let config = config_from(&[
            ("NEWBRIDGE_PORT", "9090"),
            ("NEWBRIDGE_DB_PATH", "/tmp/x.db"),
            ("NEWBRIDGE_PERSIST_FAILURES", "report"),
            ("NEWBRIDGE_LOOKUP_LATENCY_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.store.persist_failures, PersistFailurePolicy::Report);
        assert_eq!(config.lookup_latency, Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("NEWBRIDGE_PORT", "eighty")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(config_from(&[("NEWBRIDGE_PERSIST_FAILURES", "sometimes")]).is_err());
    }
}
