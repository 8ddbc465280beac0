//! Monitor configuration module
//!
//! Provides the configuration for a sync monitor instance: how long a fully
//! synced connection lingers before eviction, how deep the per-topic bus
//! channels are, and whether lifecycle events trigger a snapshot re-fetch.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Grace period for ad-hoc sync views
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Grace period for longer-lived operation displays
pub const OPERATION_DISPLAY_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Default broadcast capacity per bus topic
pub const DEFAULT_BUS_CAPACITY: usize = 256;

const GRACE_ENV: &str = "INFORMER_SYNC_GRACE_MS";
const CAPACITY_ENV: &str = "INFORMER_SYNC_BUS_CAPACITY";

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Delay between a tracker becoming done and its eviction
    pub grace_period: Duration,
    /// Broadcast channel capacity per topic
    ///
    /// Read by [`EventBus::from_config`](crate::realtime::EventBus::from_config)
    /// when the host builds its bus. A monitor attaches to whatever bus it is
    /// given and ignores this field.
    pub bus_capacity: usize,
    /// Re-fetch the connection snapshot on every lifecycle event
    pub refetch_on_lifecycle: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            bus_capacity: DEFAULT_BUS_CAPACITY,
            refetch_on_lifecycle: true,
        }
    }
}

impl MonitorConfig {
    /// Create a new MonitorConfigBuilder
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Preset for operation displays that keep finished syncs visible longer
    pub fn operation_display() -> Self {
        Self {
            grace_period: OPERATION_DISPLAY_GRACE_PERIOD,
            ..Self::default()
        }
    }

    /// Build from `INFORMER_SYNC_GRACE_MS` and `INFORMER_SYNC_BUS_CAPACITY`,
    /// falling back to defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Ok(raw) = std::env::var(GRACE_ENV) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid(GRACE_ENV, e.to_string()))?;
            builder = builder.grace_period(Duration::from_millis(millis));
        }
        if let Ok(raw) = std::env::var(CAPACITY_ENV) {
            let capacity = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::invalid(CAPACITY_ENV, e.to_string()))?;
            builder = builder.bus_capacity(capacity);
        }
        builder.build()
    }

    /// Parse a TOML document, e.g.
    ///
    /// ```toml
    /// grace_period_ms = 30000
    /// bus_capacity = 512
    /// refetch_on_lifecycle = true
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(source)?;
        let mut builder = Self::builder();
        if let Some(millis) = raw.grace_period_ms {
            builder = builder.grace_period(Duration::from_millis(millis));
        }
        if let Some(capacity) = raw.bus_capacity {
            builder = builder.bus_capacity(capacity);
        }
        if let Some(refetch) = raw.refetch_on_lifecycle {
            builder = builder.refetch_on_lifecycle(refetch);
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grace_period.is_zero() {
            return Err(ConfigError::invalid("grace_period", "must be non-zero"));
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::invalid("bus_capacity", "must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    grace_period_ms: Option<u64>,
    bus_capacity: Option<usize>,
    refetch_on_lifecycle: Option<bool>,
}

/// Builder for MonitorConfig
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    grace_period: Option<Duration>,
    bus_capacity: Option<usize>,
    refetch_on_lifecycle: Option<bool>,
}

impl MonitorConfigBuilder {
    /// Set the eviction grace period
    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = Some(grace_period);
        self
    }

    /// Set the per-topic broadcast capacity
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = Some(capacity);
        self
    }

    pub fn refetch_on_lifecycle(mut self, refetch: bool) -> Self {
        self.refetch_on_lifecycle = Some(refetch);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<MonitorConfig, ConfigError> {
        let defaults = MonitorConfig::default();
        let config = MonitorConfig {
            grace_period: self.grace_period.unwrap_or(defaults.grace_period),
            bus_capacity: self.bus_capacity.unwrap_or(defaults.bus_capacity),
            refetch_on_lifecycle: self
                .refetch_on_lifecycle
                .unwrap_or(defaults.refetch_on_lifecycle),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}
