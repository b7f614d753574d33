//! Log handler bridging records into an attribute-readable buffer.
//!
//! An [`AttributeLogHandler`] sits between a logging dispatch mechanism and
//! the control-system attribute it mirrors: every accepted record is
//! formatted, split into lines, appended to a [`RecordBuffer`], and announced
//! to subscribers through an [`AttributeEventSink`]. The device server reads
//! the buffer back out of [`AttributeLogHandler::read`] when a client asks
//! for the attribute's value.
//!
//! The handler never holds the owning device; it carries only the attribute
//! *name* and leaves resolution to the sink.

use crate::buffer::RecordBuffer;
use crate::error::EventPushError;
use log::{Level, Log, Metadata, Record};
use std::sync::Arc;

/// Seam over the external attribute/event API.
///
/// `attribute` is a lookup key, not an ownership handle. Implementations
/// decide how (and whether) to resolve it to a live device.
pub trait AttributeEventSink: Send + Sync {
    /// Announce `lines` as the newest content of `attribute`.
    fn push_change_event(&self, attribute: &str, lines: &[String]) -> Result<(), EventPushError>;
}

/// Which record levels a handler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelMatch {
    /// Only records at exactly this level. Device servers expose one
    /// attribute per level, each fed by its own handler.
    Exact(Level),
    /// Records at this level or more severe.
    AtMost(Level),
}

impl LevelMatch {
    /// `true` when a record at `level` passes the filter.
    pub fn accepts(&self, level: Level) -> bool {
        match self {
            LevelMatch::Exact(wanted) => level == *wanted,
            LevelMatch::AtMost(floor) => level <= *floor,
        }
    }
}

/// Buffering log handler for a single device attribute.
pub struct AttributeLogHandler {
    attribute: String,
    filter: LevelMatch,
    buffer: RecordBuffer,
    sink: Arc<dyn AttributeEventSink>,
}

impl AttributeLogHandler {
    /// Build a handler feeding `attribute` through `sink`.
    ///
    /// `max_buffer_size` bounds the record buffer (`0` = unbounded).
    pub fn new(
        attribute: impl Into<String>,
        filter: LevelMatch,
        max_buffer_size: usize,
        sink: Arc<dyn AttributeEventSink>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            filter,
            buffer: RecordBuffer::new(max_buffer_size),
            sink,
        }
    }

    /// Format `record`, append its lines to the buffer, and push one change
    /// event carrying exactly those lines.
    ///
    /// A record with embedded newlines becomes one buffer entry per line; a
    /// plain value becomes a single entry. A rejected push is returned as-is,
    /// never retried, and does not roll back the append. Level filtering is
    /// the dispatch path's job ([`Log::enabled`]); direct callers bypass it.
    pub fn process(&self, record: &Record) -> Result<(), EventPushError> {
        let text = record.args().to_string();
        let lines: Vec<String> = text.lines().map(str::to_owned).collect();
        self.buffer.extend(lines.iter().cloned());
        self.sink.push_change_event(&self.attribute, &lines)
    }

    /// Snapshot of the buffer for attribute read callbacks.
    pub fn read(&self) -> Vec<String> {
        self.buffer.snapshot()
    }

    /// Empty the underlying buffer.
    pub fn clear_buffer(&self) {
        self.buffer.clear();
    }

    /// The attribute this handler feeds.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Level filter this handler was built with.
    pub fn filter(&self) -> LevelMatch {
        self.filter
    }

    /// The underlying record buffer.
    pub fn buffer(&self) -> &RecordBuffer {
        &self.buffer
    }
}

impl Log for AttributeLogHandler {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.accepts(metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // The Log contract is infallible; a rejected push is reported the
        // way logging handlers conventionally report, then dropped.
        if let Err(err) = self.process(record) {
            eprintln!("attrlog: {err}");
        }
    }

    fn flush(&self) {}
}

impl std::fmt::Debug for AttributeLogHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeLogHandler")
            .field("attribute", &self.attribute)
            .field("filter", &self.filter)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
