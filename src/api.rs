//! # Public API
//!
//! Entry points that run a whole configuration in one call.
//!
//! - [`generate()`] - Build and run a [`Config`]
//! - [`generate_from_yaml()`] - Parse a YAML document, then build and run it
//! - [`render_midi()`] - YAML document straight to Standard MIDI File bytes
//!
//! ## Typical Usage
//!
//! ```rust
//! use eca_midi::generate_from_yaml;
//!
//! let performance = generate_from_yaml(r#"
//! rule: 190
//! width: 32
//! duration: 8
//! "#)?;
//!
//! assert_eq!(performance.steps, 32);
//! let bytes = performance.to_midi_bytes()?;
//! assert!(bytes.starts_with(b"MThd"));
//! # Ok::<(), eca_midi::EcaError>(())
//! ```

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::EcaError;
use crate::events::NoteEvent;
use crate::midi;
use crate::timing::TimingMapper;

/// The result of one run: the event stream plus what is needed to place it in time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub events: Vec<NoteEvent>,
    pub steps: usize,
    pub end_tick: u64,
    #[serde(skip)]
    pub timing: TimingMapper,
    pub channel: u8,
}

impl Performance {
    pub fn duration_seconds(&self) -> f64 {
        self.timing.ticks_to_seconds(self.end_tick)
    }

    pub fn to_midi_bytes(&self) -> Result<Vec<u8>, EcaError> {
        midi::to_bytes(&self.events, &self.timing, self.channel, self.end_tick)
    }

    pub fn write_midi(&self, path: &Path) -> Result<(), EcaError> {
        midi::write_midi(&self.events, &self.timing, self.channel, self.end_tick, path)
    }
}

/// Validate and run a configuration.
///
/// # Errors
/// Returns [`EcaError::ConfigError`] naming the first invalid parameter.
pub fn generate(config: &Config) -> Result<Performance, EcaError> {
    let generator = config.build()?;
    let timing = *generator.timing();
    let steps = generator.steps();
    let end_tick = generator.end_tick();
    let events = generator.run();

    info!(
        rule = config.rule,
        steps,
        events = events.len(),
        seconds = timing.ticks_to_seconds(end_tick),
        "performance generated"
    );

    Ok(Performance {
        events,
        steps,
        end_tick,
        timing,
        channel: config.channel,
    })
}

/// Parse a YAML configuration and run it.
pub fn generate_from_yaml(source: &str) -> Result<Performance, EcaError> {
    let config = Config::from_yaml(source)?;
    generate(&config)
}

/// Parse a YAML configuration, run it and encode the result as SMF bytes.
pub fn render_midi(source: &str) -> Result<Vec<u8>, EcaError> {
    generate_from_yaml(source)?.to_midi_bytes()
}
