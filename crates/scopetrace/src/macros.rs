//! Instrumentation macros.

/// Trace the rest of the enclosing scope as a named region.
///
/// Each invocation declares a static [`CallSite`](crate::CallSite), so the
/// region is registered once per tracer rather than on every pass. Without a
/// tracer argument the [global](crate::global) tracer is used.
///
/// When the `profiling` feature is disabled, this macro expands to nothing.
///
/// # Examples
///
/// ```ignore
/// use scopetrace::{trace_scope, Tracer};
///
/// fn load(tracer: &Tracer) {
///     trace_scope!(tracer; "load", "io");
///     // ... region ends at the closing brace
/// }
///
/// fn step() {
///     trace_scope!("step");
/// }
/// ```
#[cfg(feature = "profiling")]
#[macro_export]
macro_rules! trace_scope {
    ($tracer:expr; $name:expr) => {
        $crate::trace_scope!($tracer; $name, "")
    };
    ($tracer:expr; $name:expr, $category:expr) => {
        let _scopetrace_guard = {
            static SITE: $crate::CallSite = $crate::CallSite::new($name, $category);
            $crate::ScopeGuard::at_site($tracer, &SITE)
        };
    };
    ($name:expr) => {
        $crate::trace_scope!($crate::global(); $name, "")
    };
    ($name:expr, $category:expr) => {
        $crate::trace_scope!($crate::global(); $name, $category)
    };
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! trace_scope {
    ($tracer:expr; $name:expr) => {};
    ($tracer:expr; $name:expr, $category:expr) => {};
    ($name:expr) => {};
    ($name:expr, $category:expr) => {};
}

/// Label the calling thread in the exported trace.
///
/// When the `profiling` feature is disabled, this macro expands to nothing.
#[cfg(feature = "profiling")]
#[macro_export]
macro_rules! trace_thread {
    ($tracer:expr; $name:expr) => {
        $tracer.on_thread_started($name)
    };
    ($name:expr) => {
        $crate::global().on_thread_started($name)
    };
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! trace_thread {
    ($tracer:expr; $name:expr) => {
        ()
    };
    ($name:expr) => {
        ()
    };
}
