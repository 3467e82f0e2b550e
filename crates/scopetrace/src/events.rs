//! Trace event types.

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::registry::{Counter, CounterHandle};

/// Name of the metadata event that labels a thread.
pub const THREAD_NAME_EVENT: &str = "thread_name";

/// Chrome trace event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Start of a duration region.
    #[serde(rename = "B")]
    Begin,
    /// End of a duration region.
    #[serde(rename = "E")]
    End,
    /// Process/thread metadata.
    #[serde(rename = "M")]
    Metadata,
}

impl Phase {
    /// Single-letter phase code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Begin => "B",
            Self::End => "E",
            Self::Metadata => "M",
        }
    }
}

/// Event arguments. Only thread names are carried today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceArgs {
    /// Display name, usually of a thread.
    pub name: String,
}

/// An exported trace event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// Event name as displayed in the trace viewer.
    pub name: String,
    /// Comma separated list of categories.
    pub cat: String,
    /// Microseconds since the session epoch.
    pub ts: Timestamp,
    /// Process id.
    pub pid: u32,
    /// Hashed native thread id.
    pub tid: u64,
    /// Event type.
    pub ph: Phase,
    /// Optional arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<TraceArgs>,
}

/// What a buffered event records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Region entered.
    Begin(CounterHandle),
    /// Region exited.
    End(CounterHandle),
    /// Thread display name.
    ThreadName(String),
}

/// A buffered event.
///
/// Region events keep the counter handle instead of the strings; names are
/// resolved against the registry when the event leaves the tracer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Event payload.
    pub kind: EventKind,
    /// Microseconds since the session epoch.
    pub ts: Timestamp,
    /// Emitting thread.
    pub tid: u64,
}

impl Event {
    /// Phase this event exports as.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self.kind {
            EventKind::Begin(_) => Phase::Begin,
            EventKind::End(_) => Phase::End,
            EventKind::ThreadName(_) => Phase::Metadata,
        }
    }

    /// Resolve names against `counters` into the exported form.
    ///
    /// Returns `None` for a handle missing from `counters`, which cannot
    /// happen for events buffered by the tracer owning the table.
    #[must_use]
    pub fn resolve(&self, counters: &[Counter], pid: u32) -> Option<Trace> {
        let (name, cat, args) = match &self.kind {
            EventKind::Begin(handle) | EventKind::End(handle) => {
                let counter = counters.get(handle.index())?;
                (counter.name().to_owned(), counter.category().to_owned(), None)
            }
            EventKind::ThreadName(thread) => (
                THREAD_NAME_EVENT.to_owned(),
                String::new(),
                Some(TraceArgs {
                    name: thread.clone(),
                }),
            ),
        };
        Some(Trace {
            name,
            cat,
            ts: self.ts,
            pid,
            tid: self.tid,
            ph: self.phase(),
            args,
        })
    }
}
