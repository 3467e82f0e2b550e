//! Session clock and thread identity.

use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread::ThreadId;
use std::time::{Duration, Instant};

/// Event timestamp in microseconds since the session epoch.
pub type Timestamp = u32;

/// Thread ids are folded to 53 bits so they survive a trip through an f64.
const THREAD_ID_MASK: u64 = (1 << 53) - 1;

thread_local! {
    static THREAD_ID: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Monotonic clock anchored at the session epoch.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    epoch: Instant,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    /// Create a clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Move the epoch to now.
    pub fn reset(&mut self) {
        self.epoch = Instant::now();
    }

    /// The instant all timestamps are relative to.
    #[must_use]
    pub const fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Current timestamp relative to the epoch.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Timestamp {
        to_timestamp(self.epoch.elapsed())
    }
}

/// Convert an elapsed duration into a timestamp.
///
/// Rounds up to the next microsecond and never returns 0, which is reserved
/// for the epoch itself. Saturates at `u32::MAX` (about 71 minutes).
#[must_use]
pub fn to_timestamp(elapsed: Duration) -> Timestamp {
    let micros = elapsed.as_nanos().div_ceil(1_000).max(1);
    Timestamp::try_from(micros).unwrap_or(Timestamp::MAX)
}

/// Stable id of the calling thread.
///
/// Hashes the native [`ThreadId`] once per thread and caches the result.
#[inline]
#[must_use]
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|cached| {
        if let Some(id) = cached.get() {
            return id;
        }
        let id = hash_thread_id(std::thread::current().id());
        cached.set(Some(id));
        id
    })
}

fn hash_thread_id(id: ThreadId) -> u64 {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish() & THREAD_ID_MASK
}
