//! RAII region guard.

use std::marker::PhantomData;

use crate::error::Result;
use crate::events::EventKind;
use crate::registry::{CallSite, CounterHandle};
use crate::tracer::Tracer;

/// Emits a Begin event on creation and the matching End event on drop.
///
/// The End event is only emitted if the Begin event was recorded and the
/// session that recorded it is still running. A guard entered while tracing
/// was stopped stays silent, and so does one that outlives a `stop`/`start`
/// cycle. Not `Send`: the End event must come from the thread that emitted
/// the Begin event.
#[must_use = "the region ends when the guard is dropped"]
pub struct ScopeGuard<'a> {
    tracer: &'a Tracer,
    handle: CounterHandle,
    session: Option<u32>,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ScopeGuard<'a> {
    /// Enter the region `handle`.
    pub fn enter(tracer: &'a Tracer, handle: CounterHandle) -> Result<Self> {
        let session = tracer.emit_region(handle, EventKind::Begin, None)?;
        Ok(Self {
            tracer,
            handle,
            session,
            _not_send: PhantomData,
        })
    }

    /// Enter the region declared by a static call site.
    #[inline]
    pub fn at_site(tracer: &'a Tracer, site: &'static CallSite) -> Self {
        let handle = tracer.handle_for_site(site);
        // The handle was just issued by `tracer`, so validation cannot fail.
        let session = tracer
            .emit_region(handle, EventKind::Begin, None)
            .ok()
            .flatten();
        Self {
            tracer,
            handle,
            session,
            _not_send: PhantomData,
        }
    }

    /// Handle of the region.
    #[must_use]
    pub const fn handle(&self) -> CounterHandle {
        self.handle
    }

    /// Whether the Begin event was recorded.
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for ScopeGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        let Some(session) = self.session else {
            return;
        };
        if let Err(err) = self
            .tracer
            .emit_region(self.handle, EventKind::End, Some(session))
        {
            tracing::warn!("Failed to close trace region: {}", err);
        }
    }
}
