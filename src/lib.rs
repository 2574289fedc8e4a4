pub mod api;
pub mod automaton;
pub mod config;
pub mod error;
pub mod events;
pub mod midi;
pub mod pitch;
pub mod reference;
pub mod rule;
pub mod timing;

pub use api::{generate, generate_from_yaml, render_midi, Performance};
pub use automaton::{render_row, AutomatonEngine, Boundary};
pub use config::{Config, PitchSource, RunLength};
pub use error::*;
pub use events::{EventGenerator, EventType, GeneratorOptions, NoteEvent, SeedPolicy, SustainMode, VelocityCurve};
pub use pitch::{build_scale_across_width, PitchMapper, Scale};
pub use rule::RuleTable;
pub use timing::{GateFraction, TimingMapper};
