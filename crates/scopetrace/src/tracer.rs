//! Tracer instance: session control, event emission and export.

use std::cell::RefCell;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::ReentrantMutex;

use crate::buffer::TraceBuffer;
use crate::clock::{current_thread_id, SessionClock};
use crate::config::TracerConfig;
use crate::error::{Result, TraceError};
use crate::events::{Event, EventKind, Trace};
use crate::export::{FsStorage, JsonCodec, TraceCodec, TraceDocument, TraceStorage};
use crate::frame::{FrameStats, FrameTimer};
use crate::guard::ScopeGuard;
use crate::registry::{CallSite, Counter, CounterHandle, CounterRegistry};

/// Source of per-instance ids for the call-site cache.
static NEXT_TRACER_ID: AtomicU32 = AtomicU32::new(1);

/// Mutable tracer state, guarded by the tracer lock.
struct TracerState {
    registry: CounterRegistry,
    buffer: TraceBuffer,
    clock: SessionClock,
    started: bool,
    /// Bumped by every `start`, so guards can tell sessions apart.
    session: u32,
    frames: FrameTimer,
}

/// Records begin/end events for registered regions across threads.
///
/// All state sits behind one re-entrant lock. Every operation is a short
/// critical section; exporting holds the lock only to swap the buffer out.
pub struct Tracer {
    id: u32,
    config: TracerConfig,
    state: ReentrantMutex<RefCell<TracerState>>,
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Tracer {
    /// Create a stopped tracer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TracerConfig::default())
    }

    /// Create a stopped tracer.
    #[must_use]
    pub fn with_config(config: TracerConfig) -> Self {
        let state = TracerState {
            registry: CounterRegistry::new(),
            buffer: TraceBuffer::with_capacity(config.initial_capacity),
            clock: SessionClock::new(),
            started: false,
            session: 0,
            frames: FrameTimer::new(),
        };
        Self {
            id: NEXT_TRACER_ID.fetch_add(1, Ordering::Relaxed),
            config,
            state: ReentrantMutex::new(RefCell::new(state)),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &TracerConfig {
        &self.config
    }

    // Counters

    /// Register a region and return its handle.
    ///
    /// Every call appends a new counter; cache the handle at the call site.
    pub fn register(&self, name: &str, category: &str) -> CounterHandle {
        let guard = self.state.lock();
        let handle = guard.borrow_mut().registry.register(name, category);
        handle
    }

    /// Handle for a static call site, registered on first use by this tracer.
    pub fn handle_for_site(&self, site: &'static CallSite) -> CounterHandle {
        if let Some(handle) = site.cached(self.id) {
            return handle;
        }
        let guard = self.state.lock();
        let handle = guard.borrow_mut().registry.register_site(site);
        site.store(self.id, handle);
        handle
    }

    /// Look up a registered counter.
    #[must_use]
    pub fn counter(&self, handle: CounterHandle) -> Option<Counter> {
        let guard = self.state.lock();
        let counter = guard.borrow().registry.get(handle).cloned();
        counter
    }

    /// Number of registered counters.
    #[must_use]
    pub fn counter_count(&self) -> usize {
        let guard = self.state.lock();
        let count = guard.borrow().registry.len();
        count
    }

    // Session

    /// Start a tracing session, resetting the timestamp epoch.
    pub fn start(&self) -> Result<()> {
        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            if state.started {
                return Err(TraceError::AlreadyStarted);
            }
            state.clock.reset();
            state.started = true;
            state.session = state.session.wrapping_add(1);
        }
        tracing::debug!("Tracing session started");
        Ok(())
    }

    /// Stop the current session. Later region events are dropped.
    pub fn stop(&self) -> Result<()> {
        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            if !state.started {
                return Err(TraceError::NotStarted);
            }
            state.started = false;
        }
        tracing::debug!("Tracing session stopped");
        Ok(())
    }

    /// Check if a session is running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        let guard = self.state.lock();
        let started = guard.borrow().started;
        started
    }

    // Emission

    /// Record the start of a region.
    ///
    /// Does nothing while stopped. Fails for handles from another tracer.
    /// Nothing checks that a matching [`end`](Self::end) follows; prefer
    /// [`scope`](Self::scope) for balanced pairs.
    pub fn begin(&self, handle: CounterHandle) -> Result<()> {
        self.emit_region(handle, EventKind::Begin, None).map(drop)
    }

    /// Record the end of a region.
    pub fn end(&self, handle: CounterHandle) -> Result<()> {
        self.emit_region(handle, EventKind::End, None).map(drop)
    }

    /// Enter a region for the rest of the current scope.
    pub fn scope(&self, handle: CounterHandle) -> Result<ScopeGuard<'_>> {
        ScopeGuard::enter(self, handle)
    }

    /// Append a region event.
    ///
    /// With `session` set, the event is only recorded if that session is
    /// still running. Returns the session it was recorded in, if any.
    pub(crate) fn emit_region(
        &self,
        handle: CounterHandle,
        kind: fn(CounterHandle) -> EventKind,
        session: Option<u32>,
    ) -> Result<Option<u32>> {
        let guard = self.state.lock();
        let mut cell = guard.borrow_mut();
        let state = &mut *cell;
        if !state.started || session.is_some_and(|id| id != state.session) {
            return Ok(None);
        }
        state.registry.validate(handle)?;
        state.buffer.push(Event {
            kind: kind(handle),
            ts: state.clock.now(),
            tid: current_thread_id(),
        });
        Ok(Some(state.session))
    }

    /// Label the calling thread in the exported trace.
    ///
    /// Recorded whether or not a session is running. Every call appends a new
    /// metadata event.
    pub fn on_thread_started(&self, name: &str) {
        let guard = self.state.lock();
        let mut cell = guard.borrow_mut();
        let state = &mut *cell;
        state.buffer.push(Event {
            kind: EventKind::ThreadName(name.to_owned()),
            ts: state.clock.now(),
            tid: current_thread_id(),
        });
    }

    /// Number of buffered events.
    #[must_use]
    pub fn traces_count(&self) -> usize {
        let guard = self.state.lock();
        let count = guard.borrow().buffer.len();
        count
    }

    /// Buffered event at `index`, resolved to its exported form.
    #[must_use]
    pub fn trace(&self, index: usize) -> Option<Trace> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state
            .buffer
            .get(index)
            .and_then(|event| event.resolve(state.registry.counters(), self.config.pid))
    }

    // Frames

    /// Mark the start of a frame.
    pub fn begin_frame(&self) {
        let guard = self.state.lock();
        guard.borrow_mut().frames.begin();
    }

    /// Close the current frame and return its timing.
    pub fn end_frame(&self) -> FrameStats {
        let guard = self.state.lock();
        let stats = guard.borrow_mut().frames.end();
        stats
    }

    // Export

    /// Move all buffered events out and resolve them into a document.
    ///
    /// The buffer is empty afterwards.
    pub fn take_document(&self) -> TraceDocument {
        let (events, counters) = self.swap_out();
        TraceDocument::from_events(&events, &counters, self.config.pid)
    }

    /// Export buffered events as JSON to a file.
    ///
    /// Returns the number of exported events.
    pub fn export_and_save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let codec = if self.config.pretty {
            JsonCodec::pretty()
        } else {
            JsonCodec::new()
        };
        self.export_with(&codec, &FsStorage, path.as_ref())
    }

    /// Export buffered events through the given codec and storage.
    ///
    /// The buffer is swapped out under the lock; encoding and writing happen
    /// after it is released. On failure the events go back to the front of
    /// the buffer if [`TracerConfig::restore_on_failure`] is set.
    pub fn export_with<C, S>(&self, codec: &C, storage: &S, path: &Path) -> Result<usize>
    where
        C: TraceCodec + ?Sized,
        S: TraceStorage + ?Sized,
    {
        let (events, counters) = self.swap_out();
        let count = events.len();
        let document = TraceDocument::from_events(&events, &counters, self.config.pid);

        match codec
            .encode(&document)
            .and_then(|bytes| storage.write(path, &bytes))
        {
            Ok(()) => {
                tracing::info!("Exported {} trace events to {}", count, path.display());
                Ok(count)
            }
            Err(err) => {
                if self.config.restore_on_failure {
                    self.restore(events);
                    tracing::warn!("Trace export failed, {} events restored: {}", count, err);
                } else {
                    tracing::warn!("Trace export failed, {} events dropped: {}", count, err);
                }
                Err(err)
            }
        }
    }

    fn swap_out(&self) -> (Vec<Event>, Vec<Counter>) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let events = state.buffer.take();
        (events, state.registry.snapshot())
    }

    fn restore(&self, events: Vec<Event>) {
        let guard = self.state.lock();
        guard.borrow_mut().buffer.restore(events);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::events::{Phase, THREAD_NAME_EVENT};
    use crate::export::MemoryStorage;

    struct FailingStorage;

    impl TraceStorage for FailingStorage {
        fn write(&self, path: &Path, _bytes: &[u8]) -> Result<()> {
            Err(TraceError::Storage {
                path: path.to_path_buf(),
                source: std::io::ErrorKind::PermissionDenied.into(),
            })
        }

        fn read(&self, path: &Path) -> Result<Vec<u8>> {
            self.write(path, &[]).map(|()| Vec::new())
        }
    }

    struct FailingCodec;

    impl TraceCodec for FailingCodec {
        fn encode(&self, _document: &TraceDocument) -> Result<Vec<u8>> {
            Err(TraceError::Serialization("encoder rejected document".into()))
        }

        fn decode(&self, _bytes: &[u8]) -> Result<TraceDocument> {
            Ok(TraceDocument::default())
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scopetrace-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn new_tracer_is_idle() {
        let tracer = Tracer::new();
        assert!(!tracer.is_started());
        assert_eq!(tracer.traces_count(), 0);
        assert!(tracer.trace(0).is_none());
    }

    #[test]
    fn start_then_stop() {
        let tracer = Tracer::new();
        tracer.start().unwrap();
        assert!(tracer.is_started());
        tracer.stop().unwrap();
        assert!(!tracer.is_started());
    }

    #[test]
    fn session_protocol_misuse() {
        let tracer = Tracer::new();
        assert!(matches!(tracer.stop(), Err(TraceError::NotStarted)));

        tracer.start().unwrap();
        assert!(matches!(tracer.start(), Err(TraceError::AlreadyStarted)));
        assert!(tracer.is_started());
    }

    #[test]
    fn thread_name_recorded_while_stopped() {
        let tracer = Tracer::new();
        tracer.on_thread_started("MainThread");

        assert_eq!(tracer.traces_count(), 1);
        let trace = tracer.trace(0).unwrap();
        assert_eq!(trace.name, THREAD_NAME_EVENT);
        assert_eq!(trace.ph, Phase::Metadata);
        assert_ne!(trace.ts, 0);
        assert_eq!(trace.tid, current_thread_id());
        assert_eq!(trace.args.unwrap().name, "MainThread");
    }

    #[test]
    fn thread_name_recorded_while_started() {
        let tracer = Tracer::new();
        tracer.start().unwrap();
        tracer.on_thread_started("Worker");

        assert_eq!(tracer.traces_count(), 1);
        let trace = tracer.trace(0).unwrap();
        assert_eq!(trace.name, THREAD_NAME_EVENT);
        assert_eq!(trace.ph, Phase::Metadata);
        assert_ne!(trace.ts, 0);
        assert_eq!(trace.tid, current_thread_id());
        assert_eq!(trace.args.unwrap().name, "Worker");
    }

    #[test]
    fn thread_name_not_deduplicated() {
        let tracer = Tracer::new();
        tracer.on_thread_started("io");
        tracer.on_thread_started("io");
        assert_eq!(tracer.traces_count(), 2);
    }

    #[test]
    fn no_events_while_stopped() {
        let tracer = Tracer::new();
        let handle = tracer.register("idle", "");
        {
            let _scope = tracer.scope(handle).unwrap();
        }
        tracer.begin(handle).unwrap();
        tracer.end(handle).unwrap();

        assert_eq!(tracer.traces_count(), 0);
    }

    #[test]
    fn open_scope_records_begin() {
        let tracer = Tracer::new();
        let handle = tracer.register("open_scope_records_begin", "");
        tracer.start().unwrap();

        let _scope = tracer.scope(handle).unwrap();

        assert_eq!(tracer.traces_count(), 1);
        let trace = tracer.trace(0).unwrap();
        assert_eq!(trace.name, "open_scope_records_begin");
        assert_eq!(trace.ph, Phase::Begin);
        assert_ne!(trace.ts, 0);
    }

    #[test]
    fn closed_scope_records_begin_and_end() {
        let tracer = Tracer::new();
        let handle = tracer.register("load_level", "io");
        tracer.start().unwrap();
        {
            let _scope = tracer.scope(handle).unwrap();
        }

        assert_eq!(tracer.traces_count(), 2);
        let begin = tracer.trace(0).unwrap();
        let end = tracer.trace(1).unwrap();
        assert_eq!((begin.ph, end.ph), (Phase::Begin, Phase::End));
        assert_eq!(begin.name, "load_level");
        assert_eq!(end.name, "load_level");
        assert_eq!(end.cat, "io");
        assert_ne!(begin.ts, 0);
        assert!(begin.ts <= end.ts);
    }

    #[test]
    fn scope_closes_on_early_return() {
        fn fallible(tracer: &Tracer, handle: CounterHandle) -> Result<()> {
            let _scope = tracer.scope(handle)?;
            tracer.begin(CounterHandle::from_index(usize::MAX))?;
            Ok(())
        }

        let tracer = Tracer::new();
        let handle = tracer.register("fallible", "");
        tracer.start().unwrap();

        assert!(fallible(&tracer, handle).is_err());
        assert_eq!(tracer.traces_count(), 2);
        assert_eq!(tracer.trace(1).unwrap().ph, Phase::End);
    }

    #[test]
    fn nested_scopes_balance() {
        fn nest(tracer: &Tracer, handles: &[CounterHandle]) {
            if let Some((&first, rest)) = handles.split_first() {
                let _scope = tracer.scope(first).unwrap();
                nest(tracer, rest);
            }
        }

        let tracer = Tracer::new();
        let handles: Vec<CounterHandle> = (0..5)
            .map(|depth| tracer.register(&format!("level{depth}"), "nest"))
            .collect();
        tracer.start().unwrap();
        nest(&tracer, &handles);

        assert_eq!(tracer.traces_count(), 10);
        let mut open: Vec<String> = Vec::new();
        for index in 0..tracer.traces_count() {
            let trace = tracer.trace(index).unwrap();
            match trace.ph {
                Phase::Begin => open.push(trace.name),
                Phase::End => assert_eq!(open.pop(), Some(trace.name)),
                Phase::Metadata => unreachable!(),
            }
        }
        assert!(open.is_empty());
    }

    #[test]
    fn foreign_handle_is_rejected_while_started() {
        let other = Tracer::new();
        other.register("a", "");
        let foreign = other.register("b", "");

        let tracer = Tracer::new();
        tracer.begin(foreign).unwrap();

        tracer.start().unwrap();
        let err = tracer.begin(foreign).unwrap_err();
        assert!(matches!(
            err,
            TraceError::InvalidHandle {
                handle: 1,
                registered: 0
            }
        ));
        assert!(tracer.scope(foreign).is_err());
        assert_eq!(tracer.traces_count(), 0);
    }

    #[test]
    fn stopped_guard_skips_end() {
        let tracer = Tracer::new();
        let handle = tracer.register("late", "");
        {
            let scope = tracer.scope(handle).unwrap();
            assert!(!scope.is_recording());
            tracer.start().unwrap();
        }
        assert_eq!(tracer.traces_count(), 0);
    }

    #[test]
    fn handle_for_site_per_tracer() {
        static SITE: CallSite = CallSite::new("shared_site", "");

        let first = Tracer::new();
        first.register("padding", "");
        let a = first.handle_for_site(&SITE);

        let second = Tracer::new();
        let b = second.handle_for_site(&SITE);

        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 0);
        assert_eq!(first.handle_for_site(&SITE), a);
        assert_eq!(first.counter_count(), 2);
        assert_eq!(second.counter(b).unwrap().name(), "shared_site");
    }

    #[test]
    fn export_clears_buffer() {
        let tracer = Tracer::new();
        let handle = tracer.register("work", "");
        tracer.on_thread_started("main");
        tracer.start().unwrap();
        {
            let _scope = tracer.scope(handle).unwrap();
        }

        let storage = MemoryStorage::new();
        let path = Path::new("mem/trace.json");
        let count = tracer.export_with(&JsonCodec::new(), &storage, path).unwrap();

        assert_eq!(count, 3);
        assert_eq!(tracer.traces_count(), 0);

        let doc = JsonCodec::new().decode(&storage.read(path).unwrap()).unwrap();
        let phases: Vec<Phase> = doc.trace_events.iter().map(|t| t.ph).collect();
        assert_eq!(phases, vec![Phase::Metadata, Phase::Begin, Phase::End]);
        assert!(doc.trace_events.iter().all(|t| t.pid == 0));
    }

    #[test]
    fn export_roundtrip_matches_buffer() {
        let tracer = Tracer::with_config(TracerConfig::new().with_pid(7));
        let parse = tracer.register("parse", "frontend");
        let emit = tracer.register("emit", "backend");
        tracer.start().unwrap();
        {
            let _outer = tracer.scope(parse).unwrap();
            let _inner = tracer.scope(emit).unwrap();
        }

        let expected: Vec<Trace> = (0..tracer.traces_count())
            .filter_map(|index| tracer.trace(index))
            .collect();
        let doc = tracer.take_document();
        let codec = JsonCodec::new();
        let decoded = codec.decode(&codec.encode(&doc).unwrap()).unwrap();

        assert_eq!(decoded.trace_events, expected);
        assert!(decoded.trace_events.iter().all(|t| t.pid == 7));
        assert_eq!(tracer.traces_count(), 0);
    }

    #[test]
    fn failed_export_restores_events() {
        let tracer = Tracer::new();
        tracer.on_thread_started("first");
        tracer.on_thread_started("second");

        let err = tracer
            .export_with(&JsonCodec::new(), &FailingStorage, Path::new("denied.json"))
            .unwrap_err();

        assert!(matches!(err, TraceError::Storage { .. }));
        assert_eq!(tracer.traces_count(), 2);
        assert_eq!(tracer.trace(0).unwrap().args.unwrap().name, "first");
    }

    #[test]
    fn failed_encode_restores_events() {
        let tracer = Tracer::new();
        let handle = tracer.register("encode", "");
        tracer.on_thread_started("main");
        tracer.start().unwrap();
        {
            let _scope = tracer.scope(handle).unwrap();
        }
        let before: Vec<Trace> = (0..tracer.traces_count())
            .filter_map(|index| tracer.trace(index))
            .collect();

        let storage = MemoryStorage::new();
        let err = tracer
            .export_with(&FailingCodec, &storage, Path::new("mem/trace.json"))
            .unwrap_err();

        assert!(matches!(err, TraceError::Serialization(_)));
        assert!(storage.is_empty());
        let after: Vec<Trace> = (0..tracer.traces_count())
            .filter_map(|index| tracer.trace(index))
            .collect();
        assert_eq!(after, before);
    }

    #[test]
    fn failed_export_drops_events_when_configured() {
        let tracer = Tracer::with_config(TracerConfig::new().with_restore_on_failure(false));
        tracer.on_thread_started("lost");

        assert!(tracer
            .export_with(&JsonCodec::new(), &FailingStorage, Path::new("denied.json"))
            .is_err());
        assert_eq!(tracer.traces_count(), 0);
    }

    #[test]
    fn export_and_save_writes_file() {
        let tracer = Tracer::with_config(TracerConfig::new().with_pretty(true));
        let handle = tracer.register("export_and_save_writes_file", "");
        tracer.start().unwrap();
        {
            let _scope = tracer.scope(handle).unwrap();
        }

        let path = temp_path("export");
        assert_eq!(tracer.export_and_save(&path).unwrap(), 2);

        let doc = JsonCodec::new()
            .decode(&FsStorage.read(&path).unwrap())
            .unwrap();
        assert_eq!(doc.display_time_unit, "ms");
        assert_eq!(doc.len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn concurrent_emission_loses_nothing() {
        const THREADS: usize = 8;
        const REGIONS: usize = 200;

        let tracer = Tracer::new();
        let handle = tracer.register("job", "pool");
        tracer.start().unwrap();

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..REGIONS {
                        let _region = tracer.scope(handle).unwrap();
                    }
                });
            }
        });

        assert_eq!(tracer.traces_count(), 2 * THREADS * REGIONS);

        let doc = tracer.take_document();
        let mut per_thread: std::collections::HashMap<u64, Vec<Phase>> =
            std::collections::HashMap::new();
        for trace in &doc.trace_events {
            per_thread.entry(trace.tid).or_default().push(trace.ph);
        }
        assert_eq!(per_thread.len(), THREADS);
        for phases in per_thread.values() {
            assert_eq!(phases.len(), 2 * REGIONS);
            assert!(phases
                .chunks(2)
                .all(|pair| pair == [Phase::Begin, Phase::End]));
        }
    }

    #[test]
    fn frame_timing() {
        let tracer = Tracer::new();
        tracer.begin_frame();
        let first = tracer.end_frame();
        tracer.begin_frame();
        let second = tracer.end_frame();

        assert_eq!(first.frame_number, 0);
        assert_eq!(second.frame_number, 1);
        assert_eq!(tracer.traces_count(), 0);
    }
}
