//! # Events Module
//!
//! Derive a timed note-on/note-off stream from the evolution of an
//! elementary cellular automaton.
//!
//! ## Sub-modules
//! - `types` - NoteEvent, EventType, SustainMode, SeedPolicy, VelocityCurve
//! - `generator` - Row diffing and event scheduling
//!
//! ## Entry Point
//! [`EventGenerator::run()`] - Step the automaton and return the sorted events
//!
//! ## Example
//! ```rust
//! use eca_midi::{AutomatonEngine, PitchMapper, RuleTable, TimingMapper};
//! use eca_midi::events::{EventGenerator, EventType, GeneratorOptions};
//!
//! let row = AutomatonEngine::single_seed_row(5);
//! let engine = AutomatonEngine::new(5, RuleTable::new(190)?, row)?;
//! let timing = TimingMapper::new(120.0, 480, 240)?;
//! let pitches = PitchMapper::new(&[60u8, 62, 64, 65, 67], 5)?;
//!
//! let options = GeneratorOptions { release_at_end: false, ..Default::default() };
//! let events = EventGenerator::new(engine, timing, pitches, options, 1)?.run();
//!
//! // Columns 1 and 3 are born at the end of the first step.
//! assert_eq!(events.len(), 2);
//! assert!(events.iter().all(|e| e.kind == EventType::NoteOn && e.tick == 240));
//! assert_eq!(events[0].pitch, 62);
//! assert_eq!(events[0].velocity, Some(30));
//! # Ok::<(), eca_midi::EcaError>(())
//! ```
//!
//! ## Cell Lifecycle
//!
//! The generator only sees whole rows, so it infers each cell's lifecycle
//! from consecutive snapshots:
//!
//! `Dead -> (birth) -> Alive(age 0) -> (survival) -> Alive(age n) -> (death) -> Dead`
//!
//! ## Initial Row
//!
//! Cells alive before the first step are a starting state, not births.
//! [`SeedPolicy::Silent`] emits nothing for them; [`SeedPolicy::Sound`]
//! strikes them at tick 0.
//!
//! ## End of Run
//!
//! With `release_at_end`, notes alive in the final row are closed: in sustain
//! mode one step after the last boundary (the final row plays for a full
//! step), in gated modes at the final row's gate tick. Only runs that were
//! struck are released; a silent seed that never dies emits nothing. A silent
//! seed that dies still gets its death NoteOff.
//!
//! ## Gate Cuts
//!
//! A gated cut lands strictly after the strike at the start of the step and
//! before the next boundary. With one tick per step there is no room for it,
//! so the cut moves to the next boundary, ahead of any strike there.

mod generator;
mod types;

#[cfg(test)]
mod tests;

pub use generator::{EventGenerator, GeneratorOptions};
pub use types::{EventType, NoteEvent, SeedPolicy, SustainMode, VelocityCurve};
