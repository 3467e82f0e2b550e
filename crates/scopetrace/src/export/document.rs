//! Exportable trace document.

use serde::{Deserialize, Serialize};

use crate::events::{Event, Trace};
use crate::registry::Counter;

/// Display unit written into every document.
pub const DISPLAY_TIME_UNIT: &str = "ms";

/// Chrome trace document in JSON object format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceDocument {
    /// Unit the viewer uses to display timestamps.
    #[serde(rename = "displayTimeUnit")]
    pub display_time_unit: String,
    /// Events in emission order.
    #[serde(rename = "traceEvents")]
    pub trace_events: Vec<Trace>,
}

impl Default for TraceDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TraceDocument {
    /// Wrap already resolved events.
    #[must_use]
    pub fn new(trace_events: Vec<Trace>) -> Self {
        Self {
            display_time_unit: DISPLAY_TIME_UNIT.to_owned(),
            trace_events,
        }
    }

    /// Resolve buffered events against a counter table.
    ///
    /// Events whose handle is missing from `counters` are skipped.
    #[must_use]
    pub(crate) fn from_events(events: &[Event], counters: &[Counter], pid: u32) -> Self {
        let trace_events = events
            .iter()
            .filter_map(|event| event.resolve(counters, pid))
            .collect();
        Self::new(trace_events)
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trace_events.len()
    }

    /// Check if the document has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trace_events.is_empty()
    }
}
