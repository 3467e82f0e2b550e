//! Process-wide tracer.

use std::sync::OnceLock;

use crate::config::TracerConfig;
use crate::tracer::Tracer;

/// Global tracer, created on first use.
static TRACER: OnceLock<Tracer> = OnceLock::new();

/// Initialize the global tracer with a configuration.
///
/// Call this once at application startup, before any instrumented code runs.
/// Returns `false` if the tracer already existed, in which case `config` is
/// ignored.
pub fn init(config: TracerConfig) -> bool {
    let mut created = false;
    TRACER.get_or_init(|| {
        created = true;
        Tracer::with_config(config)
    });
    if !created {
        tracing::warn!("Global tracer already initialized, configuration ignored");
    }
    created
}

/// The global tracer, created with the default configuration if needed.
#[inline]
pub fn global() -> &'static Tracer {
    TRACER.get_or_init(Tracer::new)
}

/// Check if the global tracer exists.
#[must_use]
pub fn is_initialized() -> bool {
    TRACER.get().is_some()
}
