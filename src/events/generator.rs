//! Event generation
//!
//! Drives an [`AutomatonEngine`] for a fixed number of steps, diffs each pair
//! of consecutive rows, and turns the differences into timed note events.

use tracing::{debug, info, trace};

use super::types::{EventType, NoteEvent, SeedPolicy, SustainMode, VelocityCurve};
use crate::automaton::AutomatonEngine;
use crate::error::EcaError;
use crate::pitch::PitchMapper;
use crate::timing::{GateFraction, TimingMapper};

/// Rendering policy for an [`EventGenerator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorOptions {
    pub mode: SustainMode,
    /// Required by the staccato and retrigger modes, ignored by sustain.
    pub gate: Option<GateFraction>,
    pub velocity: VelocityCurve,
    pub seed: SeedPolicy,
    /// Close every note still sounding once the last step has played.
    pub release_at_end: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            mode: SustainMode::Sustain,
            gate: None,
            velocity: VelocityCurve::default(),
            seed: SeedPolicy::Silent,
            release_at_end: true,
        }
    }
}

/// Turns automaton evolution into an ordered stream of note events.
///
/// # Transitions
/// For step `t` (row `t` becomes row `t + 1`), per column `i`:
/// - Birth `0 -> 1`: NoteOn at `tick_at(t + 1)` with the velocity for age 0
/// - Death `1 -> 0`: NoteOff at `tick_at(t + 1)`
/// - Survival `1 -> 1`: nothing in sustain mode; in staccato a NoteOff at
///   `gate_tick(t)`; in retrigger that NoteOff plus a new NoteOn at
///   `tick_at(t + 1)` with the velocity for the cell's new age
///
/// # Ordering
/// Events are sorted by tick. At equal ticks every NoteOff comes before every
/// NoteOn, and events of the same kind keep column order.
#[derive(Debug, Clone)]
pub struct EventGenerator {
    engine: AutomatonEngine,
    timing: TimingMapper,
    pitches: PitchMapper,
    options: GeneratorOptions,
    steps: usize,
}

impl EventGenerator {
    pub fn new(
        engine: AutomatonEngine,
        timing: TimingMapper,
        pitches: PitchMapper,
        options: GeneratorOptions,
        steps: usize,
    ) -> Result<Self, EcaError> {
        if pitches.len() != engine.width() {
            return Err(EcaError::config(
                "pitches",
                format!(
                    "has {} entries but width is {}",
                    pitches.len(),
                    engine.width()
                ),
            ));
        }
        if options.mode.is_gated() && options.gate.is_none() {
            return Err(EcaError::config(
                "gate",
                format!("is required in {:?} mode", options.mode),
            ));
        }
        // Nothing is emitted past the tick one step after the last boundary.
        if steps.checked_add(1).and_then(|s| timing.checked_tick_at(s)).is_none() {
            return Err(EcaError::config(
                "steps",
                format!(
                    "{} steps at {} ticks per step overflow the tick counter",
                    steps,
                    timing.ticks_per_step()
                ),
            ));
        }

        Ok(Self {
            engine,
            timing,
            pitches,
            options,
            steps,
        })
    }

    pub fn engine(&self) -> &AutomatonEngine {
        &self.engine
    }

    pub fn timing(&self) -> &TimingMapper {
        &self.timing
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Number of automaton steps the run will take.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Tick after which the run emits nothing.
    pub fn end_tick(&self) -> u64 {
        match (self.options.mode.is_gated(), self.options.gate) {
            (true, Some(gate)) if self.options.release_at_end => {
                self.timing.gate_tick(self.steps, gate)
            }
            _ if self.options.release_at_end => self.timing.tick_at(self.steps + 1),
            _ => self.timing.tick_at(self.steps),
        }
    }

    /// Run every step and return the sorted event stream.
    ///
    /// Consumes the generator: a second run needs a fresh engine.
    pub fn run(mut self) -> Vec<NoteEvent> {
        let width = self.engine.width();
        debug!(
            rule = self.engine.rule().number(),
            width,
            steps = self.steps,
            step_seconds = self.timing.step_seconds(),
            mode = ?self.options.mode,
            "starting event generation"
        );

        let mut events = Vec::new();
        // Whether the current alive run of each column has been struck.
        let mut struck = vec![false; width];

        if self.options.seed == SeedPolicy::Sound {
            for i in 0..width {
                if self.engine.row()[i] == 1 {
                    events.push(self.note_on(i, 0));
                    struck[i] = true;
                }
            }
        }

        let mut previous = self.engine.row().to_vec();
        for t in 0..self.steps {
            self.engine.step();
            let boundary = self.timing.tick_at(t + 1);
            let mut births = 0usize;
            let mut deaths = 0usize;

            for (i, &was) in previous.iter().enumerate() {
                match (was, self.engine.row()[i]) {
                    (0, 1) => {
                        births += 1;
                        events.push(self.note_on(i, boundary));
                        struck[i] = true;
                    }
                    (1, 0) => {
                        deaths += 1;
                        events.push(self.note_off(i, boundary));
                        struck[i] = false;
                    }
                    (1, 1) => {
                        self.continuation(i, t, boundary, &mut events);
                        struck[i] |= self.options.mode == SustainMode::Retrigger;
                    }
                    _ => {}
                }
            }

            trace!(step = t + 1, births, deaths, alive = self.engine.alive_count(), "step");
            previous.copy_from_slice(self.engine.row());
        }

        if self.options.release_at_end {
            self.release(&struck, &mut events);
        }

        events.sort_by_key(|e| (e.tick, e.kind));

        info!(
            events = events.len(),
            end_tick = self.end_tick(),
            "event generation finished"
        );
        events
    }

    fn continuation(&self, i: usize, t: usize, boundary: u64, events: &mut Vec<NoteEvent>) {
        let Some(gate) = self.options.gate else {
            return;
        };
        match self.options.mode {
            SustainMode::Sustain => {}
            SustainMode::Staccato => {
                events.push(self.note_off(i, self.timing.gate_tick(t, gate)));
            }
            SustainMode::Retrigger => {
                events.push(self.note_off(i, self.timing.gate_tick(t, gate)));
                events.push(self.note_on(i, boundary));
            }
        }
    }

    /// Close the notes of every cell alive in the final row whose run was struck.
    ///
    /// A seed cell left silent by [`SeedPolicy::Silent`] that survives the
    /// whole run never sounded, so it gets no release.
    fn release(&self, struck: &[bool], events: &mut Vec<NoteEvent>) {
        let tick = self.end_tick();
        for (i, &cell) in self.engine.row().iter().enumerate() {
            if cell == 1 && struck[i] {
                events.push(self.note_off(i, tick));
            }
        }
    }

    fn note_on(&self, column: usize, tick: u64) -> NoteEvent {
        NoteEvent {
            kind: EventType::NoteOn,
            pitch: self.pitches.pitch(column),
            velocity: Some(self.options.velocity.velocity(self.engine.age(column))),
            tick,
            time: self.timing.ticks_to_seconds(tick),
            column,
        }
    }

    fn note_off(&self, column: usize, tick: u64) -> NoteEvent {
        NoteEvent {
            kind: EventType::NoteOff,
            pitch: self.pitches.pitch(column),
            velocity: None,
            tick,
            time: self.timing.ticks_to_seconds(tick),
            column,
        }
    }
}
