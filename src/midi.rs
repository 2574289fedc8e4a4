// MIDI output from event streams.
//
// Encodes a sorted NoteEvent stream as a Standard MIDI File (SMF format 0,
// one track). The track opens with a set-tempo meta event, carries every
// note on the configured channel as delta-timed messages, and ends with an
// end-of-track marker at the run's end tick.
//
// Uses the `midly` crate for MIDI writing.

use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use std::path::Path;
use tracing::debug;

use crate::error::EcaError;
use crate::events::{EventType, NoteEvent};
use crate::timing::TimingMapper;

/// Largest delta time an SMF event can carry.
const MAX_DELTA: u64 = (1 << 28) - 1;

/// Largest tempo value a set-tempo meta event can carry.
const MAX_TEMPO: u32 = (1 << 24) - 1;

/// Largest metrical PPQ an SMF header can carry.
const MAX_PPQ: u32 = (1 << 15) - 1;

/// Encode `events` and write them to `path`.
pub fn write_midi(
    events: &[NoteEvent],
    timing: &TimingMapper,
    channel: u8,
    end_tick: u64,
    path: &Path,
) -> Result<(), EcaError> {
    let bytes = to_bytes(events, timing, channel, end_tick)?;
    std::fs::write(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote MIDI file");
    Ok(())
}

/// Encode `events` as SMF bytes.
pub fn to_bytes(
    events: &[NoteEvent],
    timing: &TimingMapper,
    channel: u8,
    end_tick: u64,
) -> Result<Vec<u8>, EcaError> {
    let smf = to_smf(events, timing, channel, end_tick)?;
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| EcaError::MidiError(e.to_string()))?;
    Ok(buf)
}

/// Convert an event stream to an in-memory SMF.
///
/// `events` must already be sorted by tick, as [`EventGenerator::run`]
/// returns them.
///
/// [`EventGenerator::run`]: crate::events::EventGenerator::run
pub fn to_smf(
    events: &[NoteEvent],
    timing: &TimingMapper,
    channel: u8,
    end_tick: u64,
) -> Result<Smf<'static>, EcaError> {
    if timing.ppq() > MAX_PPQ {
        return Err(EcaError::MidiError(format!(
            "ppq {} exceeds the SMF limit of {}",
            timing.ppq(),
            MAX_PPQ
        )));
    }
    if channel > 15 {
        return Err(EcaError::MidiError(format!("channel {} is not 0-15", channel)));
    }

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(timing.ppq() as u16)),
    ));

    let mut track: Track<'static> = Vec::with_capacity(events.len() + 2);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(
            timing.micros_per_quarter().min(MAX_TEMPO),
        ))),
    });

    let channel = u4::new(channel);
    let mut last_tick: u64 = 0;
    for event in events {
        let message = match event.kind {
            EventType::NoteOn => MidiMessage::NoteOn {
                key: u7::new(event.pitch),
                vel: u7::new(event.velocity.unwrap_or(0)),
            },
            EventType::NoteOff => MidiMessage::NoteOff {
                key: u7::new(event.pitch),
                vel: u7::new(0),
            },
        };
        track.push(TrackEvent {
            delta: delta(last_tick, event.tick)?,
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = event.tick;
    }

    track.push(TrackEvent {
        delta: delta(last_tick, end_tick.max(last_tick))?,
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    Ok(smf)
}

fn delta(from: u64, to: u64) -> Result<u28, EcaError> {
    let delta = to.checked_sub(from).ok_or_else(|| {
        EcaError::MidiError(format!("event at tick {} comes after tick {}", to, from))
    })?;
    if delta > MAX_DELTA {
        return Err(EcaError::MidiError(format!(
            "gap of {} ticks exceeds the SMF delta limit",
            delta
        )));
    }
    Ok(u28::new(delta as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(kind: EventType, pitch: u8, tick: u64) -> NoteEvent {
        NoteEvent {
            kind,
            pitch,
            velocity: (kind == EventType::NoteOn).then_some(64),
            tick,
            time: 0.0,
            column: 0,
        }
    }

    #[test]
    fn test_to_smf_deltas() {
        let timing = TimingMapper::new(120.0, 480, 240).unwrap();
        let events = [
            note(EventType::NoteOn, 60, 240),
            note(EventType::NoteOff, 60, 480),
            note(EventType::NoteOn, 62, 480),
        ];
        let smf = to_smf(&events, &timing, 0, 720).unwrap();
        assert_eq!(smf.tracks.len(), 1);

        let track = &smf.tracks[0];
        // tempo + 3 notes + end of track
        assert_eq!(track.len(), 5);
        let deltas: Vec<u32> = track.iter().map(|e| e.delta.as_int()).collect();
        assert_eq!(deltas, vec![0, 240, 240, 0, 240]);
        assert_eq!(
            track[0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(500_000)))
        );
        assert_eq!(
            track[1].kind,
            TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(64) },
            }
        );
    }

    #[test]
    fn test_bytes_parse_back() {
        let timing = TimingMapper::new(100.0, 96, 24).unwrap();
        let events = [note(EventType::NoteOn, 70, 24), note(EventType::NoteOff, 70, 48)];
        let bytes = to_bytes(&events, &timing, 3, 48).unwrap();
        assert_eq!(&bytes[..4], b"MThd");

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(96)));
        assert_eq!(smf.tracks[0].len(), 4);
    }

    #[test]
    fn test_unsorted_events_rejected() {
        let timing = TimingMapper::new(120.0, 480, 240).unwrap();
        let events = [note(EventType::NoteOn, 60, 480), note(EventType::NoteOff, 60, 240)];
        assert!(matches!(
            to_smf(&events, &timing, 0, 480),
            Err(EcaError::MidiError(_))
        ));
    }

    #[test]
    fn test_ppq_limit() {
        let timing = TimingMapper::new(120.0, 40_000, 240).unwrap();
        assert!(matches!(to_smf(&[], &timing, 0, 0), Err(EcaError::MidiError(_))));
    }
}
