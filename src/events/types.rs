//! Event stream type definitions
//!
//! This module defines the note events emitted by the generator and the
//! policies that shape them.

use serde::{Deserialize, Serialize};

use crate::error::EcaError;

/// How a continuously alive cell is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SustainMode {
    /// Hold the note from birth until death
    #[default]
    Sustain,
    /// Cut the note at the gate fraction of every step the cell survives
    Staccato,
    /// Like staccato, but strike the note again at every step it survives
    Retrigger,
}

impl SustainMode {
    /// Whether this mode needs a gate fraction.
    pub fn is_gated(self) -> bool {
        !matches!(self, SustainMode::Sustain)
    }
}

/// What to do with cells already alive in the initial row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedPolicy {
    /// The initial row is a starting state, not a transition: no events
    #[default]
    Silent,
    /// Treat every cell alive at t=0 as born at tick 0
    Sound,
}

/// Velocity as a function of cell age: `min(cap, floor + step * age)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VelocityCurve {
    floor: u8,
    step: u8,
    cap: u8,
}

impl Default for VelocityCurve {
    fn default() -> Self {
        Self {
            floor: 30,
            step: 10,
            cap: 110,
        }
    }
}

impl VelocityCurve {
    pub fn new(floor: i64, step: i64, cap: i64) -> Result<Self, EcaError> {
        let floor = midi_value("velocity-floor", floor)?;
        let step = midi_value("velocity-step", step)?;
        let cap = midi_value("velocity-cap", cap)?;
        if floor > cap {
            return Err(EcaError::config(
                "velocity-floor",
                format!("{} is above velocity-cap {}", floor, cap),
            ));
        }
        Ok(Self { floor, step, cap })
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn cap(&self) -> u8 {
        self.cap
    }

    /// Velocity of a note whose cell has been alive for `age` steps.
    pub fn velocity(&self, age: u32) -> u8 {
        let raw = u64::from(self.floor) + u64::from(self.step) * u64::from(age);
        raw.min(u64::from(self.cap)) as u8
    }
}

fn midi_value(parameter: &'static str, value: i64) -> Result<u8, EcaError> {
    match u8::try_from(value) {
        Ok(v) if v <= 127 => Ok(v),
        _ => Err(EcaError::config(
            parameter,
            format!("must be in 0..=127, got {}", value),
        )),
    }
}

/// Note on or off
///
/// Ordered so that at equal ticks a NoteOff sorts before a NoteOn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    NoteOff,
    NoteOn,
}

/// A single timed note event
///
/// # Fields
/// - `kind`: NoteOn or NoteOff
/// - `pitch`: MIDI note number of the column
/// - `velocity`: Strike velocity (NoteOn only)
/// - `tick`: Absolute position in MIDI ticks
/// - `time`: Absolute position in seconds (derived from `tick`)
/// - `column`: Automaton cell the note belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub pitch: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
    pub tick: u64,
    pub time: f64,
    pub column: usize,
}

impl NoteEvent {
    pub fn is_note_on(&self) -> bool {
        self.kind == EventType::NoteOn
    }

    pub fn is_note_off(&self) -> bool {
        self.kind == EventType::NoteOff
    }
}
