//! Router configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Complete router configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub channels: ChannelConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    /// Consumed by whatever initialises the tracing subscriber.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Submit channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Bounded capacity of each lane
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    #[serde(default)]
    pub ordering: OrderingMode,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ordering: OrderingMode::default(),
        }
    }
}

/// How envelope kinds map onto channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    /// One channel per lane. FIFO within a lane only; a message may be
    /// dispatched before a route change submitted earlier on another lane.
    #[default]
    PerLane,

    /// A single channel shared by all lanes: one global submission order.
    Total,
}

/// Routing-table behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,

    /// Remove a component's routes (as source and as destination) when it
    /// unregisters. Off by default: stale destinations keep receiving until a
    /// route removal cleans them out.
    #[serde(default)]
    pub scrub_on_unregister: bool,

    /// Run destination sends concurrently instead of one after another.
    #[serde(default = "default_true")]
    pub concurrent_fanout: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            duplicates: DuplicatePolicy::default(),
            scrub_on_unregister: false,
            concurrent_fanout: true,
        }
    }
}

/// What adding an already-present route does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Append again; the destination then receives each payload once per copy.
    #[default]
    Allow,

    /// Leave the table unchanged and report success.
    Unique,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON formatted output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RouterConfig {
    /// Load configuration: defaults, then an optional file, then `RELAY_`
    /// environment variables (`RELAY_CHANNELS__CAPACITY=64`).
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, "RELAY")
    }

    pub(crate) fn load_with_prefix(
        path: Option<&str>,
        prefix: &str,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&RouterConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: RouterConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.capacity == 0 {
            return Err(ConfigError::Invalid(
                "channels.capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Single-channel ordering with the given capacity.
    pub fn totally_ordered(capacity: usize) -> Self {
        Self {
            channels: ChannelConfig {
                capacity,
                ordering: OrderingMode::Total,
            },
            ..Default::default()
        }
    }
}
