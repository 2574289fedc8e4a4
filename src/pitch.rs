//! # Pitch Mapping
//!
//! Each automaton column plays one fixed MIDI pitch for the whole run.
//! [`PitchMapper`] validates a precomputed pitch array; [`Scale`] and
//! [`build_scale_across_width`] build such an array by stacking a scale's
//! degrees upward, octave after octave, until every column has a pitch.
//!
//! ## Example
//! ```rust
//! use eca_midi::{build_scale_across_width, PitchMapper, Scale};
//!
//! let pitches = build_scale_across_width(9, 60, Scale::NaturalMinor.steps())?;
//! assert_eq!(pitches, vec![60, 62, 63, 65, 67, 68, 70, 72, 74]);
//!
//! let mapper = PitchMapper::new(&pitches, 9)?;
//! assert_eq!(mapper.pitch(3), 65);
//! # Ok::<(), eca_midi::EcaError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EcaError;

/// Highest MIDI note number.
pub const MAX_PITCH: i64 = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchMapper {
    pitches: Vec<u8>,
}

impl PitchMapper {
    /// `pitches` must hold exactly `width` values in 0..=127.
    pub fn new<P>(pitches: &[P], width: usize) -> Result<Self, EcaError>
    where
        P: Copy + Into<i64>,
    {
        if pitches.len() != width {
            return Err(EcaError::config(
                "pitches",
                format!("has {} entries but width is {}", pitches.len(), width),
            ));
        }

        let pitches = pitches
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let p: i64 = p.into();
                u8::try_from(p)
                    .ok()
                    .filter(|&p| i64::from(p) <= MAX_PITCH)
                    .ok_or_else(|| {
                        EcaError::config(
                            "pitches",
                            format!("entry {} is {}, expected 0..=127", i, p),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pitches })
    }

    /// Pitch of column `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn pitch(&self, i: usize) -> u8 {
        self.pitches[i]
    }

    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }
}

/// Scale modes as semitone offsets from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scale {
    #[default]
    NaturalMinor,
    Major,
    Dorian,
    MajorPentatonic,
    MinorPentatonic,
    Chromatic,
}

impl Scale {
    pub fn steps(self) -> &'static [u8] {
        match self {
            Scale::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::MajorPentatonic => &[0, 2, 4, 7, 9],
            Scale::MinorPentatonic => &[0, 3, 5, 7, 10],
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }
}

/// Stack `steps` above `root` one octave at a time until `width` pitches exist.
pub fn build_scale_across_width(width: usize, root: u8, steps: &[u8]) -> Result<Vec<u8>, EcaError> {
    if steps.is_empty() {
        return Err(EcaError::config("scale", "needs at least one scale degree"));
    }

    let mut pool = Vec::with_capacity(width);
    let mut octave: i64 = 0;
    while pool.len() < width {
        for &degree in steps {
            if pool.len() == width {
                break;
            }
            let pitch = i64::from(root) + 12 * octave + i64::from(degree);
            if pitch > MAX_PITCH {
                return Err(EcaError::config(
                    "scale",
                    format!(
                        "{} columns from root {} run past MIDI note 127",
                        width, root
                    ),
                ));
            }
            pool.push(pitch as u8);
        }
        octave += 1;
    }
    Ok(pool)
}
