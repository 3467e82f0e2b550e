//! In-process scoped event tracer with Chrome trace export.
//!
//! Records begin/end events for named code regions across threads, buffers
//! them in memory, and exports them in the Chrome Trace Event Format for
//! viewers such as `chrome://tracing` or Perfetto.
//!
//! # Feature Flags
//!
//! - `profiling` (default): Enable instrumentation macros. When disabled,
//!   `trace_scope!` and `trace_thread!` expand to nothing.
//!
//! # Usage
//!
//! Register regions once, start a session, and guard scopes:
//!
//! ```ignore
//! use scopetrace::Tracer;
//!
//! let tracer = Tracer::new();
//! let load = tracer.register("load", "io");
//! tracer.on_thread_started("MainThread");
//! tracer.start()?;
//! {
//!     let _scope = tracer.scope(load)?;
//!     // ... traced work
//! }
//! tracer.stop()?;
//! tracer.export_and_save("traces.json")?;
//! ```
//!
//! Or let the macros cache handles per call site:
//!
//! ```ignore
//! fn step(tracer: &scopetrace::Tracer) {
//!     scopetrace::trace_scope!(tracer; "step", "sim");
//! }
//! ```

mod buffer;
mod clock;
mod config;
mod context;
mod error;
mod events;
pub mod export;
mod frame;
mod guard;
mod macros;
mod registry;
mod summary;
mod tracer;

// Re-export public API
pub use clock::{current_thread_id, Timestamp};
pub use config::TracerConfig;
pub use context::{global, init, is_initialized};
pub use error::{Result, TraceError};
pub use events::{Phase, Trace, TraceArgs, THREAD_NAME_EVENT};
pub use export::{
    FsStorage, JsonCodec, MemoryStorage, TraceCodec, TraceDocument, TraceStorage,
    DISPLAY_TIME_UNIT,
};
pub use frame::FrameStats;
pub use guard::ScopeGuard;
pub use registry::{CallSite, Counter, CounterHandle};
pub use summary::{RegionStats, TraceSummary};
pub use tracer::Tracer;
