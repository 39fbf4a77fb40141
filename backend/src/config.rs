//! Database configuration loaded via OrthoConfig.
//!
//! Values layer from defaults, configuration files, `CONDUIT_DB_*`
//! environment variables, and command-line flags.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

/// Errors raised while turning settings into a usable configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// No database URL was configured.
    #[error("database url is not configured; set CONDUIT_DB_URL or pass --url")]
    MissingUrl,
    /// The pool cannot hold any connections.
    #[error("max_connections must be at least 1")]
    EmptyPool,
}

/// Connection settings for the PostgreSQL repository.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CONDUIT_DB")]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL.
    pub url: Option<String>,
    /// Upper bound on pooled connections.
    #[ortho_config(default = 10)]
    pub max_connections: u32,
    /// Idle connections kept warm; defaults to the pool's own floor.
    pub min_idle: Option<u32>,
    /// Seconds a checkout may wait for a free connection.
    #[ortho_config(default = 30)]
    pub connection_timeout_secs: u64,
}

impl DatabaseSettings {
    /// The configured URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingUrl`] when no URL was supplied.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingUrl)
    }

    /// Pool configuration derived from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the URL is missing or the pool size is
    /// zero.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        if self.max_connections == 0 {
            return Err(SettingsError::EmptyPool);
        }
        let min_idle = self
            .min_idle
            .unwrap_or(PoolConfig::DEFAULT_MIN_IDLE)
            .min(self.max_connections);
        Ok(PoolConfig::new(self.database_url()?)
            .with_max_size(self.max_connections)
            .with_min_idle(Some(min_idle))
            .with_connection_timeout(Duration::from_secs(self.connection_timeout_secs)))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for database configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 4] = [
        "CONDUIT_DB_URL",
        "CONDUIT_DB_MAX_CONNECTIONS",
        "CONDUIT_DB_MIN_IDLE",
        "CONDUIT_DB_CONNECTION_TIMEOUT_SECS",
    ];

    fn load_from_empty_args() -> DatabaseSettings {
        DatabaseSettings::load_from_iter([OsString::from("conduit-migrate")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert!(settings.url.is_none());
        assert_eq!(settings.max_connections, 10);
        assert!(settings.min_idle.is_none());
        assert_eq!(settings.connection_timeout_secs, 30);
        assert_eq!(settings.pool_config(), Err(SettingsError::MissingUrl));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("CONDUIT_DB_URL", Some("postgres://conduit@db/conduit".to_owned())),
            ("CONDUIT_DB_MAX_CONNECTIONS", Some("4".to_owned())),
            ("CONDUIT_DB_MIN_IDLE", Some("1".to_owned())),
            ("CONDUIT_DB_CONNECTION_TIMEOUT_SECS", Some("5".to_owned())),
        ]);

        let settings = load_from_empty_args();
        let pool = settings.pool_config().expect("complete settings");
        assert_eq!(pool.database_url(), "postgres://conduit@db/conduit");
        assert_eq!(pool.max_size(), 4);
        assert_eq!(pool.min_idle(), Some(1));
        assert_eq!(pool.connection_timeout(), Duration::from_secs(5));
    }

    #[rstest]
    fn idle_floor_never_exceeds_the_pool_size() {
        let _guard = lock_env([
            ("CONDUIT_DB_URL", Some("postgres://localhost/conduit".to_owned())),
            ("CONDUIT_DB_MAX_CONNECTIONS", Some("1".to_owned())),
            ("CONDUIT_DB_MIN_IDLE", None),
            ("CONDUIT_DB_CONNECTION_TIMEOUT_SECS", None),
        ]);

        let pool = load_from_empty_args()
            .pool_config()
            .expect("complete settings");
        assert_eq!(pool.min_idle(), Some(1));
    }

    #[rstest]
    fn zero_sized_pools_are_rejected() {
        let _guard = lock_env([
            ("CONDUIT_DB_URL", Some("postgres://localhost/conduit".to_owned())),
            ("CONDUIT_DB_MAX_CONNECTIONS", Some("0".to_owned())),
            ("CONDUIT_DB_MIN_IDLE", None),
            ("CONDUIT_DB_CONNECTION_TIMEOUT_SECS", None),
        ]);

        assert_eq!(
            load_from_empty_args().pool_config(),
            Err(SettingsError::EmptyPool)
        );
    }
}
