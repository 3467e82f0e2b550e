//! Tracer configuration.

/// Tracer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerConfig {
    /// Process id written into every event.
    pub pid: u32,
    /// Put events back into the buffer when an export fails.
    pub restore_on_failure: bool,
    /// Indent the JSON written by `export_and_save`.
    pub pretty: bool,
    /// Events to reserve room for up front.
    pub initial_capacity: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            pid: 0,
            restore_on_failure: true,
            pretty: false,
            initial_capacity: 1024,
        }
    }
}

impl TracerConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the process id.
    #[must_use]
    pub const fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// Enable or disable restoring events after a failed export.
    #[must_use]
    pub const fn with_restore_on_failure(mut self, restore: bool) -> Self {
        self.restore_on_failure = restore;
        self
    }

    /// Enable or disable indented JSON.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the initial buffer capacity.
    #[must_use]
    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}
