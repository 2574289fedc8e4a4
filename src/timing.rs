//! # Timing
//!
//! Converts tempo parameters into the duration of one automaton step and the
//! tick/second position of each step boundary.
//!
//! ## Parameters
//! - `bpm` - quarter notes per minute
//! - `ppq` - MIDI ticks per quarter note
//! - `ticks_per_step` (q) - ticks spanned by one automaton step
//!
//! One step lasts `60 / bpm * q / ppq` seconds. Step `t` starts at tick `t * q`.
//!
//! ## Example
//! ```rust
//! use eca_midi::TimingMapper;
//!
//! let timing = TimingMapper::new(120.0, 480, 240)?;
//! assert_eq!(timing.step_seconds(), 0.25);
//! assert_eq!(timing.steps_for_duration(8.0), 32);
//! assert_eq!(timing.tick_at(3), 720);
//! # Ok::<(), eca_midi::EcaError>(())
//! ```

use crate::error::EcaError;

/// Slack added before flooring so exact ratios survive float rounding.
const STEP_EPSILON: f64 = 1e-9;

/// Fraction of a step a staccato note sounds for, in (0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct GateFraction(f64);

impl GateFraction {
    pub fn new(fraction: f64) -> Result<Self, EcaError> {
        if fraction.is_finite() && fraction > 0.0 && fraction <= 1.0 {
            Ok(Self(fraction))
        } else {
            Err(EcaError::config(
                "gate",
                format!("must be in (0, 1], got {}", fraction),
            ))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingMapper {
    bpm: f64,
    ppq: u32,
    ticks_per_step: u32,
    step_seconds: f64,
}

impl TimingMapper {
    pub fn new(bpm: f64, ppq: u32, ticks_per_step: u32) -> Result<Self, EcaError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(EcaError::config("bpm", format!("must be positive, got {}", bpm)));
        }
        if ppq == 0 {
            return Err(EcaError::config("ppq", "must be positive"));
        }
        if ticks_per_step == 0 {
            return Err(EcaError::config("ticks-per-step", "must be positive"));
        }

        let step_seconds = 60.0 / bpm * (ticks_per_step as f64 / ppq as f64);
        Ok(Self {
            bpm,
            ppq,
            ticks_per_step,
            step_seconds,
        })
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn ppq(&self) -> u32 {
        self.ppq
    }

    pub fn ticks_per_step(&self) -> u32 {
        self.ticks_per_step
    }

    /// Duration of one automaton step in seconds.
    pub fn step_seconds(&self) -> f64 {
        self.step_seconds
    }

    /// Whole steps that fit in `seconds`. Non-positive durations yield 0.
    pub fn steps_for_duration(&self, seconds: f64) -> usize {
        if seconds.is_nan() || seconds <= 0.0 {
            return 0;
        }
        (seconds / self.step_seconds + STEP_EPSILON).floor() as usize
    }

    /// Tick at which step `step` begins.
    pub fn tick_at(&self, step: usize) -> u64 {
        step as u64 * u64::from(self.ticks_per_step)
    }

    /// Seconds at which step `step` begins.
    pub fn time_at(&self, step: usize) -> f64 {
        step as f64 * self.step_seconds
    }

    /// Like [`tick_at`](Self::tick_at), but `None` if the tick overflows a `u64`.
    pub fn checked_tick_at(&self, step: usize) -> Option<u64> {
        u64::try_from(step)
            .ok()?
            .checked_mul(u64::from(self.ticks_per_step))
    }

    /// Tick where a gated note struck at the start of step `step` is cut.
    ///
    /// The offset `floor(gate * q)` is clamped to `1..=q-1`, so the cut lands
    /// after the strike and before the next boundary. With `q == 1` there is
    /// no such tick and the cut falls on the next boundary, where it still
    /// sorts ahead of any new strike.
    pub fn gate_tick(&self, step: usize, gate: GateFraction) -> u64 {
        let q = u64::from(self.ticks_per_step);
        let offset = ((gate.get() * q as f64).floor() as u64)
            .max(1)
            .min((q - 1).max(1));
        self.tick_at(step) + offset
    }

    /// Absolute time of a tick position in seconds.
    pub fn ticks_to_seconds(&self, tick: u64) -> f64 {
        tick as f64 / self.ppq as f64 * 60.0 / self.bpm
    }

    /// Tempo as the MIDI set-tempo value (microseconds per quarter note).
    pub fn micros_per_quarter(&self) -> u32 {
        (60_000_000.0 / self.bpm).round() as u32
    }
}
