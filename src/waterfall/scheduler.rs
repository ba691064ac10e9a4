use log::debug;
use crate::waterfall::clock::{Clock, Tick};
use crate::waterfall::WaterfallError;
/// Refresh rate used until a caller asks for something else (10 triggers per second).
pub const DEFAULT_UPDATE_TIME_SECS: f64 = 0.1;
/// Rate limiter deciding when averaged data is materialised for the display.
pub struct UpdateScheduler<C: Clock> {
    clock: C,
    update_interval: Tick,
    last_trigger: Option<Tick>,
}
impl<C: Clock> UpdateScheduler<C> {
    pub fn new(clock: C) -> Self {
        let update_interval = clock.seconds_to_ticks(DEFAULT_UPDATE_TIME_SECS);
        Self {
            clock,
            update_interval,
            last_trigger: None,
        }
    }
    pub fn with_update_time(clock: C, seconds: f64) -> Result<Self, WaterfallError> {
        let mut scheduler = Self::new(clock);
        scheduler.set_update_time(seconds)?;
        Ok(scheduler)
    }
    /// Changes the gating interval. The next opportunity always triggers.
    pub fn set_update_time(&mut self, seconds: f64) -> Result<(), WaterfallError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(WaterfallError::InvalidUpdateTime(seconds));
        }
        self.update_interval = self.clock.seconds_to_ticks(seconds);
        self.last_trigger = None;
        debug!(
            "update interval set to {} ticks ({seconds} s)",
            self.update_interval
        );
        Ok(())
    }
    pub fn update_interval(&self) -> Tick {
        self.update_interval
    }
    pub fn last_trigger(&self) -> Option<Tick> {
        self.last_trigger
    }
    /// Whether more than one interval has elapsed since the last trigger.
    pub fn is_due(&self, now: Tick) -> bool {
        match self.last_trigger {
            None => true,
            Some(last) => now.saturating_sub(last) > self.update_interval,
        }
    }
    /// Claims the current opportunity. Returns the trigger timestamp when one is due.
    pub fn poll(&mut self) -> Option<Tick> {
        let now = self.clock.now();
        if !self.is_due(now) {
            return None;
        }
        self.last_trigger = Some(now);
        Some(now)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::waterfall::clock::ManualClock;
    #[test]
    fn first_opportunity_triggers_then_gates() {
        let clock = ManualClock::new(1_000);
        let mut scheduler = UpdateScheduler::new(clock.clone());
        assert_eq!(scheduler.update_interval(), 100);
        assert_eq!(scheduler.poll(), Some(0));
        assert_eq!(scheduler.poll(), None);
        clock.advance(100);
        // Exactly one interval is not enough; the gate is strict.
        assert_eq!(scheduler.poll(), None);
        clock.advance(1);
        assert_eq!(scheduler.poll(), Some(101));
    }
    #[test]
    fn fast_input_yields_at_most_one_trigger_per_interval() {
        let clock = ManualClock::new(1_000_000);
        let mut scheduler = UpdateScheduler::with_update_time(clock.clone(), 0.1).unwrap();
        let mut triggers = Vec::new();
        // One opportunity every 1 ms for two seconds.
        for _ in 0..2_000 {
            if let Some(t) = scheduler.poll() {
                triggers.push(t);
            }
            clock.advance(1_000);
        }
        assert!(triggers.len() <= 20, "{} triggers", triggers.len());
        assert!(triggers.len() >= 19);
        for pair in triggers.windows(2) {
            assert!(pair[1] - pair[0] > scheduler.update_interval());
        }
    }
    #[test]
    fn changing_update_time_rearms_immediately() {
        let clock = ManualClock::new(1_000);
        let mut scheduler = UpdateScheduler::new(clock.clone());
        assert!(scheduler.poll().is_some());
        scheduler.set_update_time(1.0).unwrap();
        assert!(scheduler.last_trigger().is_none());
        assert!(scheduler.poll().is_some());
        assert!(scheduler.set_update_time(f64::NAN).is_err());
        assert!(scheduler.set_update_time(-1.0).is_err());
    }
}
