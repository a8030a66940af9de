//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bc_core::{Mode, Namespace, NormalizeRules, StatsConfig, TenantId, ValidationError};
use bc_db::{DEFAULT_TTL, StoreConfig, TrackerConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Whose ledger to use.
    pub tenant: String,
    /// Production or sandbox namespace.
    pub mode: Mode,
    /// Recorded on every new event.
    #[serde(default)]
    pub author: Option<String>,
    /// Lifetime of the shared connection pool before it is rebuilt.
    pub connection_ttl_secs: u64,
    /// Bound on waiting for a connection or a database lock.
    pub store_timeout_secs: u64,
    pub pool_size: u32,
    /// Identity window for delete/move/rename.
    pub tolerance_ms: i64,
    /// How far before an interrupting event the automatic wake is placed.
    pub auto_wake_offset_ms: i64,
    /// How far back stats look for the sleep that opened a session.
    pub lookback_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("babylog.db"),
            tenant: "default".to_string(),
            mode: Mode::default(),
            author: None,
            connection_ttl_secs: DEFAULT_TTL.as_secs(),
            store_timeout_secs: 30,
            pool_size: 10,
            tolerance_ms: 100,
            auto_wake_offset_ms: 1_000,
            lookback_days: 7,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // BC_TENANT, BC_MODE, BC_DATABASE_PATH, ...
        figment = figment.merge(Env::prefixed("BC_"));

        figment.extract()
    }

    pub fn namespace(&self) -> Result<Namespace, ValidationError> {
        Ok(Namespace::new(TenantId::new(self.tenant.clone())?, self.mode))
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            tolerance_ms: self.tolerance_ms,
            rules: NormalizeRules {
                auto_wake_offset_ms: self.auto_wake_offset_ms,
            },
            stats: StatsConfig {
                lookback_ms: self.lookback_days.saturating_mul(DAY_MS),
            },
            author: self.author.clone(),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            pool_size: self.pool_size,
            timeout: Duration::from_secs(self.store_timeout_secs),
            ..StoreConfig::default()
        }
    }

    pub const fn connection_ttl(&self) -> Duration {
        Duration::from_secs(self.connection_ttl_secs)
    }
}

/// Returns the platform-specific config directory.
///
/// On Linux: `~/.config/babylog`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("babylog"))
}

/// Returns the platform-specific data directory.
///
/// On Linux: `~/.local/share/babylog`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("babylog"))
}
