//! Custom error types for the log bridge.
//!
//! [`AttrLogError`] consolidates the fallible setup paths of the crate:
//! parsing and validation of configuration, and pool construction. With
//! `#[from]` conversions, call sites propagate with `?`. Change-event push
//! failures stay typed as [`EventPushError`] because they surface on the
//! emit path, whose caller decides the policy (see
//! [`crate::handler::AttributeLogHandler::process`]).

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type AttrLogResult<T> = std::result::Result<T, AttrLogError>;

/// Primary error type for the log bridge.
#[derive(Error, Debug)]
pub enum AttrLogError {
    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration parsed but carries an invalid value.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Worker pool could not be built.
    #[error("Pool error: {0}")]
    Pool(#[from] event_pool::PoolError),
}

/// Failure reported by an attribute-event sink.
///
/// The bridge never retries a rejected push; the error surfaces to whoever
/// drove the emit (see [`crate::handler::AttributeLogHandler::process`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("change event for '{attribute}' rejected: {reason}")]
pub struct EventPushError {
    /// Attribute the event was destined for.
    pub attribute: String,
    /// Sink-specific description of the failure.
    pub reason: String,
}

impl EventPushError {
    /// Build a push error for `attribute`.
    pub fn new(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }
}
