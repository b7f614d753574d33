//! Configuration management.
//!
//! Settings are loaded from TOML through the `config` crate and validated
//! before use. Every field has a default matching the device-server
//! conventions (buffer of 512 records per attribute, a single-worker event
//! pool with a queue of 1000), so an empty file is a valid configuration.

use crate::error::{AttrLogError, AttrLogResult};
use config::Config;
use event_pool::{EventPool, SHARED_POOL_NAME, SHARED_POOL_QUEUE};
use log::Level;
use serde::Deserialize;

/// Default bound for the per-attribute record buffers.
pub const DEFAULT_MSG_BUFFER_SIZE: usize = 512;

/// Top-level settings for the log bridge.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Log bridging settings.
    pub log: LogSettings,
    /// Event pool settings.
    pub pool: PoolSettings,
}

/// Settings for the attribute log handlers.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogSettings {
    /// Maximum records kept per attribute buffer (`0` = unbounded).
    pub max_buffer_size: usize,
    /// Levels to expose as log attributes, one handler each.
    pub levels: Vec<Level>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            max_buffer_size: DEFAULT_MSG_BUFFER_SIZE,
            levels: vec![Level::Error, Level::Warn, Level::Info, Level::Debug],
        }
    }
}

/// Settings for the change-event worker pool.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PoolSettings {
    /// Pool name, used in worker thread names.
    pub name: String,
    /// Worker thread count; must be at least 1.
    pub workers: usize,
    /// Bound on queued jobs (`0` = unbounded).
    pub queue_bound: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            name: SHARED_POOL_NAME.to_owned(),
            workers: 1,
            queue_bound: SHARED_POOL_QUEUE,
        }
    }
}

impl PoolSettings {
    /// Spawn a pool sized by these settings.
    pub fn build(&self) -> AttrLogResult<EventPool> {
        Ok(EventPool::new(&self.name, self.workers, self.queue_bound)?)
    }
}

impl Settings {
    /// Load the layered configuration and validate it.
    ///
    /// `config/default.toml` is read first (missing is fine, every field has
    /// a default); `config_name` selects an override file `config/{name}`
    /// whose values win over the defaults. The override must exist.
    pub fn new(config_name: Option<&str>) -> AttrLogResult<Self> {
        let mut builder = Config::builder()
            .add_source(config::File::with_name("config/default").required(false));
        if let Some(name) = config_name {
            let config_path = format!("config/{name}");
            builder = builder.add_source(config::File::with_name(&config_path));
        }
        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the single TOML file at `path` and validate them.
    pub fn from_file(path: &str) -> AttrLogResult<Self> {
        let settings: Self = Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that parse but cannot work.
    pub fn validate(&self) -> AttrLogResult<()> {
        if self.pool.workers == 0 {
            return Err(AttrLogError::Configuration(
                "pool.workers must be at least 1".to_owned(),
            ));
        }
        if self.log.levels.is_empty() {
            return Err(AttrLogError::Configuration(
                "log.levels must name at least one level".to_owned(),
            ));
        }
        Ok(())
    }
}
