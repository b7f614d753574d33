//! Routing of log records to per-attribute handlers.
//!
//! A device server exposes one log attribute per severity (error, warning,
//! output, debug, ...), each fed by its own [`AttributeLogHandler`]. The
//! [`LogDispatcher`] owns that handler table and fans every record out to the
//! handlers whose filter accepts it. It implements [`log::Log`], so it can be
//! driven directly by the hosting framework or installed as the process
//! logger.

use crate::config::Settings;
use crate::handler::{AttributeEventSink, AttributeLogHandler, LevelMatch};
use log::{Level, Log, Metadata, Record};
use parking_lot::RwLock;
use std::sync::Arc;

/// Fan-out dispatcher over a set of attribute log handlers.
#[derive(Default)]
pub struct LogDispatcher {
    handlers: RwLock<Vec<Arc<AttributeLogHandler>>>,
}

impl LogDispatcher {
    /// Empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one exact-level handler per configured level.
    ///
    /// The attribute name is the lowercase level name, the way a device
    /// server names its per-severity log attributes.
    pub fn from_settings(settings: &Settings, sink: Arc<dyn AttributeEventSink>) -> Self {
        let dispatcher = Self::new();
        for level in &settings.log.levels {
            dispatcher.attach(Arc::new(AttributeLogHandler::new(
                level.as_str().to_lowercase(),
                LevelMatch::Exact(*level),
                settings.log.max_buffer_size,
                Arc::clone(&sink),
            )));
        }
        dispatcher
    }

    /// Add a handler to the table.
    pub fn attach(&self, handler: Arc<AttributeLogHandler>) {
        self.handlers.write().push(handler);
    }

    /// Remove and return the handler feeding `attribute`.
    pub fn detach(&self, attribute: &str) -> Option<Arc<AttributeLogHandler>> {
        let mut handlers = self.handlers.write();
        let idx = handlers.iter().position(|h| h.attribute() == attribute)?;
        Some(handlers.remove(idx))
    }

    /// The handler feeding `attribute`, if attached.
    pub fn handler(&self, attribute: &str) -> Option<Arc<AttributeLogHandler>> {
        self.handlers
            .read()
            .iter()
            .find(|h| h.attribute() == attribute)
            .cloned()
    }

    /// Number of attached handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// `true` when no handlers are attached.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Install this dispatcher as the process logger.
    ///
    /// The global max level is set to the most verbose level any attached
    /// handler accepts. Fails if a logger is already installed.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let most_verbose = self
            .handlers
            .read()
            .iter()
            .map(|h| match h.filter() {
                LevelMatch::Exact(level) | LevelMatch::AtMost(level) => level,
            })
            .max()
            .unwrap_or(Level::Error);
        log::set_max_level(most_verbose.to_level_filter());
        log::set_boxed_logger(Box::new(self))
    }
}

impl Log for LogDispatcher {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.handlers.read().iter().any(|h| h.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        for handler in self.handlers.read().iter() {
            handler.log(record);
        }
    }

    fn flush(&self) {}
}

impl std::fmt::Debug for LogDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let attributes: Vec<String> = self
            .handlers
            .read()
            .iter()
            .map(|h| h.attribute().to_owned())
            .collect();
        f.debug_struct("LogDispatcher")
            .field("attributes", &attributes)
            .finish()
    }
}
