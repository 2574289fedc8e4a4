//! # Error Types
//!
//! This module defines all error types for the automaton sequencer.
//!
//! Validation happens when a run is built, before the first automaton step.
//! Once a generator exists, stepping and event derivation cannot fail.
//!
//! ## Error Types
//! - `ConfigError` - A configuration value is out of range, with the key that caused it
//! - `ConfigFileError` - The YAML configuration document could not be parsed
//! - `MidiError` - The event stream does not fit the Standard MIDI File encoding
//! - `Io` - Writing an output file failed
//!
//! ## Usage
//! ```rust
//! use eca_midi::{Config, EcaError};
//!
//! let mut config = Config::new(300, 16);
//!
//! match config.build() {
//!     Ok(generator) => println!("{} events", generator.run().len()),
//!     Err(EcaError::ConfigError { parameter, message }) => {
//!         eprintln!("bad `{}`: {}", parameter, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcaError {
    /// Configuration value rejected at construction time.
    ///
    /// `parameter` uses the config-file spelling of the key.
    ///
    /// # Example
    /// ```
    /// # use eca_midi::EcaError;
    /// let err = EcaError::ConfigError {
    ///     parameter: "rule",
    ///     message: "must be in 0..=255, got 256".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Invalid configuration for `rule`: must be in 0..=255, got 256");
    /// ```
    #[error("Invalid configuration for `{parameter}`: {message}")]
    ConfigError {
        parameter: &'static str,
        message: String,
    },

    /// The YAML document is malformed or has unknown keys.
    ///
    /// # Example
    /// ```
    /// # use eca_midi::EcaError;
    /// let err = EcaError::ConfigFileError("missing field `rule`".to_string());
    /// assert_eq!(err.to_string(), "Invalid config file: missing field `rule`");
    /// ```
    #[error("Invalid config file: {0}")]
    ConfigFileError(String),

    /// The event stream cannot be encoded as a Standard MIDI File.
    #[error("MIDI encoding error: {0}")]
    MidiError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EcaError {
    pub(crate) fn config(parameter: &'static str, message: impl Into<String>) -> Self {
        EcaError::ConfigError {
            parameter,
            message: message.into(),
        }
    }

    /// The offending configuration key, if this is a validation failure.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            EcaError::ConfigError { parameter, .. } => Some(*parameter),
            _ => None,
        }
    }
}
