//! Wall-clock scheduling for a frontend.
//!
//! The emulator itself has no notion of time. A frontend measures how much time
//! passed since its last iteration and hands it to a [`Scheduler`], which tells
//! it how many instructions to execute, how many timer ticks to apply and
//! whether the screen should be redrawn.

use std::time::Duration;

use crate::emulator::Emulator;

/// Instruction clock frequency range, in Hz.
pub const CLOCK_FREQ_MIN: f64 = 1.0;
pub const CLOCK_FREQ_DEFAULT: f64 = 600.0;
pub const CLOCK_FREQ_MAX: f64 = 1000.0;

/// Delay and sound timer frequency, in Hz.
pub const TIMER_FREQ: f64 = 60.0;

/// Screen refresh frequency, in Hz.
pub const REFRESH_FREQ: f64 = 60.0;

/// The period of `freq`, at least one nanosecond. A clock that isn't
/// running (zero, negative or NaN frequency) never ticks.
fn period(freq: f64) -> Duration {
    if !(freq > 0.0) {
        return Duration::from_nanos(u64::MAX);
    }
    // Float to int casts saturate
    Duration::from_nanos((1_000_000_000.0 / freq).max(1.0) as u64)
}

/// A fixed-period clock. Time is accumulated and discharged in whole periods,
/// so no time is lost when an iteration runs long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    period: Duration,
    accumulated: Duration,
}

impl Clock {
    pub fn with_frequency(freq: f64) -> Clock {
        Clock {
            period: period(freq),
            accumulated: Duration::from_nanos(0),
        }
    }

    pub fn set_frequency(&mut self, freq: f64) {
        self.period = period(freq);
    }

    /// Add `delta` to the clock and return how many periods have elapsed.
    pub fn advance(&mut self, delta: Duration) -> u32 {
        let accumulated = (self.accumulated + delta).as_nanos();
        let period = self.period.as_nanos();
        self.accumulated = Duration::from_nanos((accumulated % period) as u64);
        (accumulated / period).min(u32::MAX as u128) as u32
    }
}

/// What a frontend should do after an iteration of its main loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub cycles: u32,
    pub timers: u32,
    pub refresh: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scheduler {
    frequency: f64,
    cycles: Clock,
    timers: Clock,
    refresh_period: Duration,
    refresh_accumulated: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler::with_frequency(CLOCK_FREQ_DEFAULT)
    }

    /// A scheduler running instructions at `frequency` Hz, clamped to the supported range.
    pub fn with_frequency(frequency: f64) -> Scheduler {
        let mut scheduler = Scheduler {
            frequency: CLOCK_FREQ_DEFAULT,
            cycles: Clock::with_frequency(CLOCK_FREQ_DEFAULT),
            timers: Clock::with_frequency(TIMER_FREQ),
            refresh_period: period(REFRESH_FREQ),
            refresh_accumulated: Duration::from_nanos(0),
        };
        scheduler.set_frequency(frequency);
        scheduler
    }

    /// The instruction clock frequency, in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        let clamped = if frequency.is_nan() {
            CLOCK_FREQ_DEFAULT
        } else {
            frequency.max(CLOCK_FREQ_MIN).min(CLOCK_FREQ_MAX)
        };
        if clamped != frequency {
            log::debug!("Clamping clock frequency {} Hz to {} Hz", frequency, clamped);
        }
        self.frequency = clamped;
        self.cycles.set_frequency(clamped);
    }

    pub fn add_frequency(&mut self, delta: f64) {
        self.set_frequency(self.frequency + delta);
    }

    pub fn reset_frequency(&mut self) {
        self.set_frequency(CLOCK_FREQ_DEFAULT);
    }

    /// Account for `delta` of elapsed time. While paused, only the refresh
    /// clock runs, so the emulator picks up where it left off on resume.
    pub fn advance(&mut self, delta: Duration, paused: bool) -> Tick {
        let mut tick = Tick::default();

        if !paused {
            tick.timers = self.timers.advance(delta);
            tick.cycles = self.cycles.advance(delta);
        }

        // Redrawing the same state twice is pointless, so missed refreshes are dropped
        self.refresh_accumulated += delta;
        if self.refresh_accumulated >= self.refresh_period {
            self.refresh_accumulated = Duration::from_nanos(0);
            tick.refresh = true;
        }

        tick
    }

    /// Advance the clocks and run the emulator accordingly.
    /// Timers are updated before instructions execute.
    pub fn update(&mut self, emulator: &mut Emulator, delta: Duration, paused: bool) -> Tick {
        let tick = self.advance(delta, paused);
        for _ in 0..tick.timers {
            emulator.tick_timers();
        }
        for _ in 0..tick.cycles {
            emulator.step();
        }
        tick
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use test_case::test_case;

    #[test]
    fn clock_discharges_whole_periods() {
        let mut clock = Clock::with_frequency(1000.0);
        assert_eq!(clock.advance(Duration::from_micros(2500)), 2);
        assert_eq!(clock.advance(Duration::from_micros(400)), 0);
        assert_eq!(clock.advance(Duration::from_micros(100)), 1);
    }

    #[test]
    fn extreme_clock_frequencies_terminate() {
        let mut clock = Clock::with_frequency(f64::INFINITY);
        assert_eq!(clock.advance(Duration::from_micros(1)), 1000);

        let mut clock = Clock::with_frequency(0.0);
        assert_eq!(clock.advance(Duration::from_secs(1)), 0);

        let mut clock = Clock::with_frequency(f64::NAN);
        assert_eq!(clock.advance(Duration::from_secs(1)), 0);
    }

    #[test_case(600.0 => 600.0 ; "in range")]
    #[test_case(0.5 => CLOCK_FREQ_MIN ; "below minimum")]
    #[test_case(5000.0 => CLOCK_FREQ_MAX ; "above maximum")]
    #[test_case(f64::NAN => CLOCK_FREQ_DEFAULT ; "not a number")]
    fn frequency_is_clamped(frequency: f64) -> f64 {
        Scheduler::with_frequency(frequency).frequency()
    }

    #[test]
    fn frequency_adjustments() {
        let mut scheduler = Scheduler::new();
        scheduler.add_frequency(10.0);
        assert_eq!(scheduler.frequency(), 610.0);
        scheduler.add_frequency(1000.0);
        assert_eq!(scheduler.frequency(), CLOCK_FREQ_MAX);
        scheduler.reset_frequency();
        assert_eq!(scheduler.frequency(), CLOCK_FREQ_DEFAULT);
    }

    #[test]
    fn one_second_at_default_rates() {
        let mut scheduler = Scheduler::new();
        let mut total = Tick::default();
        let mut refreshes = 0;
        for _ in 0..1000 {
            let tick = scheduler.advance(Duration::from_millis(1), false);
            total.cycles += tick.cycles;
            total.timers += tick.timers;
            refreshes += tick.refresh as u32;
        }
        assert!((599..=600).contains(&total.cycles));
        assert!((59..=60).contains(&total.timers));
        assert!((55..=60).contains(&refreshes));
    }

    #[test]
    fn paused_scheduler_only_refreshes() {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.advance(Duration::from_millis(100), true);
        assert_eq!(tick, Tick { cycles: 0, timers: 0, refresh: true });
    }

    #[test]
    fn missed_refreshes_are_dropped() {
        let mut scheduler = Scheduler::new();
        assert!(scheduler.advance(Duration::from_millis(100), false).refresh);
        assert!(!scheduler.advance(Duration::from_millis(1), false).refresh);
    }

    #[test]
    fn update_drives_emulator() {
        let mut emulator = Emulator::with_seed(0).unwrap();
        // V0 = 1; V0 += 1; jump to the add
        emulator.load(&[0x60, 0x01, 0x70, 0x01, 0x12, 0x02]);

        let mut scheduler = Scheduler::with_frequency(CLOCK_FREQ_MAX);
        let tick = scheduler.update(&mut emulator, Duration::from_millis(5), false);
        assert_eq!(tick.cycles, 5);
        assert_eq!(tick.timers, 0);
        assert_eq!(emulator.registers()[0], 3);
        assert_eq!(emulator.program_counter(), 0x202);
    }
}
