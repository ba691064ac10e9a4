use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
/// Native unit of the rate-limiting clock.
pub type Tick = u64;
/// Monotonic time source used by the update scheduler.
pub trait Clock: Send {
    fn now(&self) -> Tick;
    fn ticks_per_second(&self) -> Tick;
    fn seconds_to_ticks(&self, seconds: f64) -> Tick {
        (seconds * self.ticks_per_second() as f64).round() as Tick
    }
}
/// Nanosecond ticks counted from the moment the clock was created.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}
impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
impl Clock for MonotonicClock {
    fn now(&self) -> Tick {
        // Wraps after ~584 years.
        self.epoch.elapsed().as_nanos() as Tick
    }
    fn ticks_per_second(&self) -> Tick {
        1_000_000_000
    }
}
/// Hand-driven clock for deterministic playback and tests. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
    ticks_per_second: Tick,
}
impl ManualClock {
    pub fn new(ticks_per_second: Tick) -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(0)),
            ticks_per_second: ticks_per_second.max(1),
        }
    }
    pub fn set(&self, ticks: Tick) {
        self.ticks.store(ticks, Ordering::SeqCst);
    }
    pub fn advance(&self, ticks: Tick) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }
}
impl Clock for ManualClock {
    fn now(&self) -> Tick {
        self.ticks.load(Ordering::SeqCst)
    }
    fn ticks_per_second(&self) -> Tick {
        self.ticks_per_second.max(1)
    }
}
