//! # Configuration
//!
//! A run is described by a [`Config`], either built in code or parsed from a
//! YAML document. [`Config::build()`] validates every value and assembles the
//! rule table, automaton, timing, pitch map and generator; nothing is stepped
//! until the returned [`EventGenerator`] runs.
//!
//! ## YAML Keys
//! | key              | default        | meaning                                    |
//! |------------------|----------------|--------------------------------------------|
//! | `rule`           | required       | Wolfram rule number, 0-255                 |
//! | `width`          | required       | cells per row                              |
//! | `initial-row`    | one center cell| `"00100"` or `[0, 0, 1, 0, 0]`             |
//! | `boundary`       | `toroidal`     | `toroidal` or `fixed-zero`                 |
//! | `bpm`            | 120            | quarter notes per minute                   |
//! | `ppq`            | 480            | ticks per quarter note                     |
//! | `ticks-per-step` | 240            | ticks per automaton step                   |
//! | `duration`       | 8 seconds      | run length in seconds (or use `steps`)     |
//! | `steps`          |                | run length in steps (or use `duration`)    |
//! | `pitches`        |                | explicit pitch per column                  |
//! | `scale`          | natural minor  | `{ root: 60, mode: dorian }`               |
//! | `mode`           | `sustain`      | `sustain`, `staccato` or `retrigger`       |
//! | `gate`           |                | fraction of a step, required when gated    |
//! | `velocity-floor` | 30             |                                            |
//! | `velocity-step`  | 10             |                                            |
//! | `velocity-cap`   | 110            |                                            |
//! | `seed-notes`     | `silent`       | `silent` or `sound`                        |
//! | `release-at-end` | true           |                                            |
//! | `channel`        | 0              | MIDI channel for file output               |
//!
//! ## Example
//! ```rust
//! use eca_midi::Config;
//!
//! let config = Config::from_yaml(r#"
//! rule: 190
//! width: 32
//! steps: 16
//! mode: staccato
//! gate: 0.5
//! "#)?;
//!
//! let events = config.build()?.run();
//! assert!(!events.is_empty());
//! # Ok::<(), eca_midi::EcaError>(())
//! ```

use serde::Deserialize;
use tracing::debug;

use crate::automaton::{AutomatonEngine, Boundary};
use crate::error::EcaError;
use crate::events::{EventGenerator, GeneratorOptions, SeedPolicy, SustainMode, VelocityCurve};
use crate::pitch::{build_scale_across_width, PitchMapper, Scale};
use crate::rule::RuleTable;
use crate::timing::{GateFraction, TimingMapper};

/// Run length used when neither `duration` nor `steps` is given.
pub const DEFAULT_DURATION_SECONDS: f64 = 8.0;

/// How long the automaton runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunLength {
    /// As many whole steps as fit in this many seconds
    Duration(f64),
    Steps(usize),
}

impl RunLength {
    pub fn resolve(self, timing: &TimingMapper) -> usize {
        match self {
            RunLength::Duration(seconds) => timing.steps_for_duration(seconds),
            RunLength::Steps(steps) => steps,
        }
    }
}

/// Where column pitches come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PitchSource {
    Explicit(Vec<i64>),
    Scale { root: u8, scale: Scale },
}

impl Default for PitchSource {
    fn default() -> Self {
        PitchSource::Scale {
            root: 60,
            scale: Scale::NaturalMinor,
        }
    }
}

impl PitchSource {
    fn resolve(&self, width: usize) -> Result<PitchMapper, EcaError> {
        match self {
            PitchSource::Explicit(pitches) => PitchMapper::new(pitches.as_slice(), width),
            PitchSource::Scale { root, scale } => {
                let pitches = build_scale_across_width(width, *root, scale.steps())?;
                PitchMapper::new(pitches.as_slice(), width)
            }
        }
    }
}

/// Everything needed to build one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub rule: i64,
    pub width: usize,
    /// `None` means a single live cell at `width / 2`.
    pub initial_row: Option<Vec<u8>>,
    pub boundary: Boundary,
    pub bpm: f64,
    pub ppq: u32,
    pub ticks_per_step: u32,
    pub run_length: RunLength,
    pub pitches: PitchSource,
    pub mode: SustainMode,
    pub gate: Option<f64>,
    pub velocity_floor: i64,
    pub velocity_step: i64,
    pub velocity_cap: i64,
    pub seed_notes: SeedPolicy,
    pub release_at_end: bool,
    pub channel: u8,
}

impl Config {
    /// Defaults for everything except the rule and width.
    pub fn new(rule: i64, width: usize) -> Self {
        Self {
            rule,
            width,
            initial_row: None,
            boundary: Boundary::Toroidal,
            bpm: 120.0,
            ppq: 480,
            ticks_per_step: 240,
            run_length: RunLength::Duration(DEFAULT_DURATION_SECONDS),
            pitches: PitchSource::default(),
            mode: SustainMode::Sustain,
            gate: None,
            velocity_floor: 30,
            velocity_step: 10,
            velocity_cap: 110,
            seed_notes: SeedPolicy::Silent,
            release_at_end: true,
            channel: 0,
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self, EcaError> {
        let raw: RawConfig =
            serde_yaml::from_str(source).map_err(|e| EcaError::ConfigFileError(e.to_string()))?;
        Config::try_from(raw)
    }

    pub fn timing(&self) -> Result<TimingMapper, EcaError> {
        TimingMapper::new(self.bpm, self.ppq, self.ticks_per_step)
    }

    /// Rendering options, without touching the automaton parameters.
    pub fn generator_options(&self) -> Result<GeneratorOptions, EcaError> {
        let gate = match (self.mode.is_gated(), self.gate) {
            (true, Some(g)) => Some(GateFraction::new(g)?),
            (true, None) => {
                return Err(EcaError::config(
                    "gate",
                    format!("is required in {:?} mode", self.mode),
                ))
            }
            (false, _) => None,
        };

        Ok(GeneratorOptions {
            mode: self.mode,
            gate,
            velocity: VelocityCurve::new(self.velocity_floor, self.velocity_step, self.velocity_cap)?,
            seed: self.seed_notes,
            release_at_end: self.release_at_end,
        })
    }

    /// An engine in its initial state.
    pub fn engine(&self) -> Result<AutomatonEngine, EcaError> {
        let rule = RuleTable::new(self.rule)?;
        let row = self
            .initial_row
            .clone()
            .unwrap_or_else(|| AutomatonEngine::single_seed_row(self.width));
        AutomatonEngine::with_boundary(self.width, rule, row, self.boundary)
    }

    /// Validate everything and return a generator ready to run.
    pub fn build(&self) -> Result<EventGenerator, EcaError> {
        let engine = self.engine()?;
        let timing = self.timing()?;
        let pitches = self.pitches.resolve(self.width)?;
        let options = self.generator_options()?;
        if self.channel > 15 {
            return Err(EcaError::config(
                "channel",
                format!("must be in 0..=15, got {}", self.channel),
            ));
        }
        if let RunLength::Duration(seconds) = self.run_length {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(EcaError::config(
                    "duration",
                    format!("must be a non-negative number of seconds, got {}", seconds),
                ));
            }
        }
        let steps = self.run_length.resolve(&timing);
        if steps.checked_add(1).and_then(|s| timing.checked_tick_at(s)).is_none() {
            let parameter = match self.run_length {
                RunLength::Duration(_) => "duration",
                RunLength::Steps(_) => "steps",
            };
            return Err(EcaError::config(
                parameter,
                format!("{} steps do not fit in the tick counter", steps),
            ));
        }

        debug!(
            rule = self.rule,
            width = self.width,
            steps,
            quiescent = engine.rule().is_quiescent(),
            "configuration validated"
        );
        EventGenerator::new(engine, timing, pitches, options, steps)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRow {
    Bits(String),
    Cells(Vec<i64>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScale {
    #[serde(default = "default_root")]
    root: i64,
    #[serde(default)]
    mode: Scale,
}

fn default_root() -> i64 {
    60
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    rule: i64,
    width: i64,
    initial_row: Option<RawRow>,
    #[serde(default)]
    boundary: Boundary,
    bpm: Option<f64>,
    ppq: Option<i64>,
    ticks_per_step: Option<i64>,
    duration: Option<f64>,
    steps: Option<i64>,
    pitches: Option<Vec<i64>>,
    scale: Option<RawScale>,
    #[serde(default)]
    mode: SustainMode,
    gate: Option<f64>,
    velocity_floor: Option<i64>,
    velocity_step: Option<i64>,
    velocity_cap: Option<i64>,
    #[serde(default)]
    seed_notes: SeedPolicy,
    release_at_end: Option<bool>,
    channel: Option<i64>,
}

fn positive<T: TryFrom<i64>>(parameter: &'static str, value: i64) -> Result<T, EcaError> {
    if value <= 0 {
        return Err(EcaError::config(
            parameter,
            format!("must be positive, got {}", value),
        ));
    }
    T::try_from(value).map_err(|_| EcaError::config(parameter, format!("{} is too large", value)))
}

fn parse_row(raw: RawRow) -> Result<Vec<u8>, EcaError> {
    match raw {
        RawRow::Bits(bits) => bits
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '0' | '.' => Ok(0),
                '1' | '#' => Ok(1),
                other => Err(EcaError::config(
                    "initial-row",
                    format!("unexpected character '{}'", other),
                )),
            })
            .collect(),
        RawRow::Cells(cells) => cells
            .into_iter()
            .map(|c| match c {
                0 | 1 => Ok(c as u8),
                other => Err(EcaError::config(
                    "initial-row",
                    format!("cell value {} is not 0 or 1", other),
                )),
            })
            .collect(),
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = EcaError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let width: usize = positive("width", raw.width)?;
        let mut config = Config::new(raw.rule, width);

        config.initial_row = raw.initial_row.map(parse_row).transpose()?;
        config.boundary = raw.boundary;
        if let Some(bpm) = raw.bpm {
            config.bpm = bpm;
        }
        if let Some(ppq) = raw.ppq {
            config.ppq = positive("ppq", ppq)?;
        }
        if let Some(q) = raw.ticks_per_step {
            config.ticks_per_step = positive("ticks-per-step", q)?;
        }

        config.run_length = match (raw.duration, raw.steps) {
            (Some(_), Some(_)) => {
                return Err(EcaError::config(
                    "steps",
                    "give either `duration` or `steps`, not both",
                ))
            }
            (Some(seconds), None) => RunLength::Duration(seconds),
            (None, Some(steps)) => RunLength::Steps(usize::try_from(steps).map_err(|_| {
                EcaError::config("steps", format!("must not be negative, got {}", steps))
            })?),
            (None, None) => RunLength::Duration(DEFAULT_DURATION_SECONDS),
        };

        config.pitches = match (raw.pitches, raw.scale) {
            (Some(_), Some(_)) => {
                return Err(EcaError::config(
                    "pitches",
                    "give either `pitches` or `scale`, not both",
                ))
            }
            (Some(pitches), None) => PitchSource::Explicit(pitches),
            (None, Some(scale)) => PitchSource::Scale {
                root: u8::try_from(scale.root)
                    .ok()
                    .filter(|&r| r <= 127)
                    .ok_or_else(|| {
                        EcaError::config("scale", format!("root {} is not a MIDI note", scale.root))
                    })?,
                scale: scale.mode,
            },
            (None, None) => PitchSource::default(),
        };

        config.mode = raw.mode;
        config.gate = raw.gate;
        config.velocity_floor = raw.velocity_floor.unwrap_or(config.velocity_floor);
        config.velocity_step = raw.velocity_step.unwrap_or(config.velocity_step);
        config.velocity_cap = raw.velocity_cap.unwrap_or(config.velocity_cap);
        config.seed_notes = raw.seed_notes;
        config.release_at_end = raw.release_at_end.unwrap_or(true);
        if let Some(channel) = raw.channel {
            config.channel = u8::try_from(channel)
                .ok()
                .filter(|&c| c <= 15)
                .ok_or_else(|| {
                    EcaError::config("channel", format!("must be in 0..=15, got {}", channel))
                })?;
        }

        Ok(config)
    }
}
