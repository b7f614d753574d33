//! # attrlog
//!
//! Device-attribute log bridging for control-system device servers. A device
//! server exposes its log stream as readable attributes (one per severity)
//! that clients subscribe to; this crate provides the plumbing between a
//! standard logging dispatch mechanism and those attributes.
//!
//! ## Crate structure
//!
//! - **`buffer`**: [`RecordBuffer`], the bounded evict-oldest record buffer
//!   backing each log attribute.
//! - **`handler`**: [`AttributeLogHandler`], a `log::Log` implementation that
//!   formats records into the buffer and announces updates through an
//!   [`AttributeEventSink`].
//! - **`dispatch`**: [`LogDispatcher`], the per-severity handler table,
//!   installable as the process logger.
//! - **`config`**: [`Settings`] loaded and validated from TOML files.
//! - **`error`**: the [`AttrLogError`] enum for centralized error handling.
//!
//! The change-event worker pool lives in the `event-pool` crate and is
//! re-exported here.
//!
//! ## Example
//!
//! ```
//! use attrlog::{AttributeLogHandler, LevelMatch, LogDispatcher, Settings};
//! use attrlog::{AttributeEventSink, EventPushError};
//! use std::sync::Arc;
//!
//! struct StdoutSink;
//!
//! impl AttributeEventSink for StdoutSink {
//!     fn push_change_event(
//!         &self,
//!         attribute: &str,
//!         lines: &[String],
//!     ) -> Result<(), EventPushError> {
//!         println!("{attribute}: {lines:?}");
//!         Ok(())
//!     }
//! }
//!
//! let dispatcher = LogDispatcher::from_settings(&Settings::default(), Arc::new(StdoutSink));
//! let output = dispatcher.handler("info").unwrap();
//! assert!(output.read().is_empty());
//! ```

pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;

pub use buffer::RecordBuffer;
pub use config::{LogSettings, PoolSettings, Settings};
pub use dispatch::LogDispatcher;
pub use error::{AttrLogError, AttrLogResult, EventPushError};
pub use handler::{AttributeEventSink, AttributeLogHandler, LevelMatch};

pub use event_pool::{shared_pool, EventPool, PoolError};
