//! Scheduler - start/stop state machine for the tick cadence
//!
//! The scheduler owns no clock. It arms a [`TimerSource`] and is told by the
//! event loop when an armed interval elapsed via [`Scheduler::fire`]. Tick
//! callbacks are passed per call, which lets the caller borrow its own state
//! inside the callback and lets tests drive ticks by hand.
//!
//! Every `start` arms the timer with a fresh generation number. Expirations
//! carrying an older generation are dropped, so ticks from a cancelled
//! cadence can never leak into the next one.

use std::time::Duration;

/// Source of periodic expirations, e.g. [`super::timer::TokioTimer`].
pub trait TimerSource {
    /// Start reporting an expiration every `interval`, tagged with `generation`.
    /// Replaces any previously armed cadence.
    fn arm(&mut self, interval: Duration, generation: u64);

    /// Stop reporting expirations.
    fn disarm(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running { interval_ms: u64, generation: u64 },
}

/// One scheduled firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Ticks since the last start; the immediate tick is 0
    pub sequence: u64,
}

pub struct Scheduler<T> {
    timer: T,
    state: SchedulerState,
    next_generation: u64,
    ticks_since_start: u64,
}

impl<T: TimerSource> Scheduler<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            state: SchedulerState::Stopped,
            next_generation: 0,
            ticks_since_start: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// Interval of the armed cadence, if running.
    pub fn interval_ms(&self) -> Option<u64> {
        match self.state {
            SchedulerState::Running { interval_ms, .. } => Some(interval_ms),
            SchedulerState::Stopped => None,
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Begin ticking: `on_tick` runs once right away, then the timer is armed.
    ///
    /// Returns `false` without doing anything if already running; restarting
    /// with a new interval requires an explicit `stop` first.
    pub fn start(&mut self, interval_ms: u64, mut on_tick: impl FnMut(Tick)) -> bool {
        if self.is_running() {
            log::debug!("[Scheduler] start ignored, already running");
            return false;
        }

        let interval_ms = interval_ms.max(1);
        let generation = self.next_generation;
        self.next_generation += 1;
        self.ticks_since_start = 0;
        self.state = SchedulerState::Running {
            interval_ms,
            generation,
        };

        self.emit(&mut on_tick);
        self.timer
            .arm(Duration::from_millis(interval_ms), generation);

        log::debug!(
            "[Scheduler] Running every {} ms (generation {})",
            interval_ms,
            generation
        );
        true
    }

    /// Cancel the cadence. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.timer.disarm();
        self.state = SchedulerState::Stopped;
        log::debug!(
            "[Scheduler] Stopped after {} tick(s)",
            self.ticks_since_start
        );
        true
    }

    /// Report that the timer armed with `generation` elapsed.
    ///
    /// Runs `on_tick` and returns `true` only if that cadence is still the
    /// active one.
    pub fn fire(&mut self, generation: u64, mut on_tick: impl FnMut(Tick)) -> bool {
        match self.state {
            SchedulerState::Running {
                generation: active, ..
            } if active == generation => {
                self.emit(&mut on_tick);
                true
            }
            _ => {
                log::trace!("[Scheduler] Ignoring stale expiration (generation {})", generation);
                false
            }
        }
    }

    fn emit(&mut self, on_tick: &mut impl FnMut(Tick)) {
        let tick = Tick {
            sequence: self.ticks_since_start,
        };
        self.ticks_since_start += 1;
        on_tick(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualTimer;

    fn collect(ticks: &mut Vec<u64>) -> impl FnMut(Tick) + '_ {
        move |tick| ticks.push(tick.sequence)
    }

    #[test]
    fn test_start_ticks_immediately_and_arms() {
        let timer = ManualTimer::new();
        let mut scheduler = Scheduler::new(timer.clone());
        let mut ticks = Vec::new();

        assert!(scheduler.start(500, collect(&mut ticks)));
        assert_eq!(ticks, vec![0]);
        assert!(scheduler.is_running());
        assert_eq!(timer.armed(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_start_then_stop_yields_exactly_one_tick() {
        let timer = ManualTimer::new();
        let mut scheduler = Scheduler::new(timer.clone());
        let mut ticks = Vec::new();

        scheduler.start(500, collect(&mut ticks));
        let generation = timer.generation().unwrap();
        assert!(scheduler.stop());

        assert_eq!(timer.armed(), None);
        assert!(!scheduler.fire(generation, collect(&mut ticks)));
        assert_eq!(ticks, vec![0]);
    }

    #[test]
    fn test_fire_emits_sequential_ticks() {
        let timer = ManualTimer::new();
        let mut scheduler = Scheduler::new(timer.clone());
        let mut ticks = Vec::new();

        scheduler.start(250, collect(&mut ticks));
        let generation = timer.generation().unwrap();
        for _ in 0..3 {
            assert!(scheduler.fire(generation, collect(&mut ticks)));
        }
        assert_eq!(ticks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let timer = ManualTimer::new();
        let mut scheduler = Scheduler::new(timer.clone());
        let mut ticks = Vec::new();

        scheduler.start(500, collect(&mut ticks));
        assert!(!scheduler.start(300, collect(&mut ticks)));

        assert_eq!(ticks, vec![0]);
        assert_eq!(scheduler.interval_ms(), Some(500));
        assert_eq!(timer.arm_count(), 1);
    }

    #[test]
    fn test_stop_while_stopped_is_noop() {
        let timer = ManualTimer::new();
        let mut scheduler = Scheduler::new(timer.clone());
        assert!(!scheduler.stop());
        assert_eq!(timer.disarm_count(), 0);
    }

    #[test]
    fn test_stale_generation_ignored_after_restart() {
        let timer = ManualTimer::new();
        let mut scheduler = Scheduler::new(timer.clone());
        let mut ticks = Vec::new();

        scheduler.start(500, collect(&mut ticks));
        let old_generation = timer.generation().unwrap();
        scheduler.stop();
        scheduler.start(400, collect(&mut ticks));
        let new_generation = timer.generation().unwrap();

        assert_ne!(old_generation, new_generation);
        assert!(!scheduler.fire(old_generation, collect(&mut ticks)));
        assert!(scheduler.fire(new_generation, collect(&mut ticks)));
        assert_eq!(ticks, vec![0, 0, 1]);
        assert_eq!(timer.armed(), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_zero_interval_is_raised_to_one_ms() {
        let timer = ManualTimer::new();
        let mut scheduler = Scheduler::new(timer.clone());
        scheduler.start(0, |_| {});
        assert_eq!(timer.armed(), Some(Duration::from_millis(1)));
    }
}
