//! Clock Module
//!
//! Time sources for the cache plus the reentrant snapshot timer that gives a
//! compound operation one consistent "now".

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

// == Clock Trait ==
/// A source of timestamps, measured from the clock's own epoch.
///
/// Implementations must never go backwards.
pub trait Clock {
    /// Returns the current timestamp.
    fn now(&self) -> Duration;
}

impl<F> Clock for F
where
    F: Fn() -> Duration,
{
    fn now(&self) -> Duration {
        self()
    }
}

// == System Clock ==
/// Wall clock: time elapsed since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

// == Monotonic Clock ==
/// Monotonic clock: time elapsed since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

// == Manual Clock ==
/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// hand another to the cache.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock reading `start`.
    pub fn starting_at(start: Duration) -> Self {
        let clock = Self::new();
        clock.set(start);
        clock
    }

    /// Moves the clock to `time`.
    pub fn set(&self, time: Duration) {
        self.nanos.store(duration_to_nanos(time), Ordering::SeqCst);
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.nanos
            .fetch_add(duration_to_nanos(delta), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

// == Snapshot Timer ==
/// Reentrant "now" provider wrapping a [`Clock`].
///
/// The outermost [`Timer::enter`] samples the clock; nested scopes opened
/// before it is dropped reuse that sample. Outside of any scope,
/// [`Timer::now`] reads the clock directly.
#[derive(Debug)]
pub struct Timer<C> {
    clock: C,
    nesting: Cell<usize>,
    snapshot: Cell<Duration>,
}

impl<C: Clock> Timer<C> {
    // == Constructor ==
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            nesting: Cell::new(0),
            snapshot: Cell::new(Duration::ZERO),
        }
    }

    // == Now ==
    /// Returns the scope's snapshot if one is open, else the live clock.
    pub fn now(&self) -> Duration {
        if self.nesting.get() == 0 {
            self.clock.now()
        } else {
            self.snapshot.get()
        }
    }

    // == Enter ==
    /// Opens a snapshot scope, closed when the returned guard is dropped.
    pub fn enter(&self) -> Snapshot<'_, C> {
        let depth = self.nesting.get();
        if depth == 0 {
            self.snapshot.set(self.clock.now());
        }
        self.nesting.set(depth + 1);
        Snapshot {
            timer: self,
            time: self.snapshot.get(),
        }
    }

    /// Number of currently open scopes.
    pub fn depth(&self) -> usize {
        self.nesting.get()
    }

    /// The wrapped clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

// == Snapshot Guard ==
/// An open snapshot scope.
#[derive(Debug)]
pub struct Snapshot<'a, C> {
    timer: &'a Timer<C>,
    time: Duration,
}

impl<C> Snapshot<'_, C> {
    /// The timestamp shared by every operation inside this scope.
    pub fn time(&self) -> Duration {
        self.time
    }
}

impl<C> Drop for Snapshot<'_, C> {
    fn drop(&mut self) {
        let depth = self.timer.nesting.get();
        self.timer.nesting.set(depth.saturating_sub(1));
    }
}
