use super::*;
use crate::automaton::AutomatonEngine;
use crate::pitch::PitchMapper;
use crate::rule::RuleTable;
use crate::timing::{GateFraction, TimingMapper};

const Q: u64 = 240;

fn generator(rule: u8, row: Vec<u8>, options: GeneratorOptions, steps: usize) -> EventGenerator {
    generator_with_q(rule, row, options, steps, Q as u32)
}

fn generator_with_q(
    rule: u8,
    row: Vec<u8>,
    options: GeneratorOptions,
    steps: usize,
    ticks_per_step: u32,
) -> EventGenerator {
    let width = row.len();
    let engine = AutomatonEngine::new(width, RuleTable::from(rule), row).unwrap();
    let timing = TimingMapper::new(120.0, 480, ticks_per_step).unwrap();
    let pitches: Vec<u8> = (0..width).map(|i| 40 + i as u8).collect();
    let pitches = PitchMapper::new(&pitches, width).unwrap();
    EventGenerator::new(engine, timing, pitches, options, steps).unwrap()
}

fn gated(mode: SustainMode, gate: f64) -> GeneratorOptions {
    GeneratorOptions {
        mode,
        gate: Some(GateFraction::new(gate).unwrap()),
        ..Default::default()
    }
}

/// A width-16 row with a few irregular live cells.
fn scattered_row() -> Vec<u8> {
    vec![0, 1, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1, 0, 1, 1, 0]
}

fn summary(events: &[NoteEvent]) -> Vec<(EventType, usize, u64)> {
    events.iter().map(|e| (e.kind, e.column, e.tick)).collect()
}

#[test]
fn test_sustain_rule_190_single_seed() {
    let events = generator(190, AutomatonEngine::single_seed_row(9), GeneratorOptions::default(), 2).run();

    use EventType::{NoteOff, NoteOn};
    assert_eq!(
        summary(&events),
        vec![
            // row 1: ...111...
            (NoteOn, 3, Q),
            (NoteOn, 5, Q),
            // row 2: ..111.1..
            (NoteOff, 5, 2 * Q),
            (NoteOn, 2, 2 * Q),
            (NoteOn, 6, 2 * Q),
            // release after the final row has played one step;
            // the silent seed in column 4 was never struck
            (NoteOff, 2, 3 * Q),
            (NoteOff, 3, 3 * Q),
            (NoteOff, 6, 3 * Q),
        ]
    );
    assert_eq!(events[0].pitch, 43);
    assert_eq!(events[0].velocity, Some(30));
    assert_eq!(events[2].velocity, None);
}

#[test]
fn test_initial_row_is_silent_by_default() {
    let options = GeneratorOptions {
        release_at_end: false,
        ..Default::default()
    };
    let events = generator(204, vec![0, 1, 0], options, 5).run();
    assert!(events.is_empty());
}

#[test]
fn test_seed_policy_sound_strikes_initial_cells() {
    let options = GeneratorOptions {
        seed: SeedPolicy::Sound,
        release_at_end: false,
        ..Default::default()
    };
    let events = generator(204, vec![1, 0, 1], options, 3).run();
    assert_eq!(events.len(), 2);
    for (event, column) in events.iter().zip([0, 2]) {
        assert!(event.is_note_on());
        assert_eq!(event.tick, 0);
        assert_eq!(event.column, column);
        assert_eq!(event.velocity, Some(30));
    }
}

#[test]
fn test_note_off_precedes_note_on_at_equal_ticks() {
    for mode in [SustainMode::Sustain, SustainMode::Staccato, SustainMode::Retrigger] {
        for rule in [30u8, 90, 110, 150, 190] {
            let events = generator(rule, scattered_row(), gated(mode, 0.5), 40).run();
            for pair in events.windows(2) {
                assert!(pair[0].tick <= pair[1].tick, "ticks must not decrease");
                if pair[0].tick == pair[1].tick {
                    assert!(
                        !(pair[0].is_note_on() && pair[1].is_note_off()),
                        "rule {} {:?}: NoteOn before NoteOff at tick {}",
                        rule,
                        mode,
                        pair[0].tick
                    );
                }
            }
        }
    }
}

#[test]
fn test_sustain_one_on_and_one_off_per_alive_run() {
    let row = scattered_row();
    let steps = 30;
    let options = GeneratorOptions {
        seed: SeedPolicy::Sound,
        ..Default::default()
    };
    let events = generator(30, row.clone(), options, steps).run();

    // Count maximal alive runs per column from an independent engine.
    let mut engine = AutomatonEngine::new(row.len(), RuleTable::from(30), row.clone()).unwrap();
    let mut runs = vec![0usize; row.len()];
    let mut previous = vec![0u8; row.len()];
    for _ in 0..=steps {
        for (i, &cell) in engine.row().iter().enumerate() {
            if cell == 1 && previous[i] == 0 {
                runs[i] += 1;
            }
        }
        previous.copy_from_slice(engine.row());
        engine.step();
    }

    for (column, &expected) in runs.iter().enumerate() {
        let kinds: Vec<EventType> = events
            .iter()
            .filter(|e| e.column == column)
            .map(|e| e.kind)
            .collect();
        let ons = kinds.iter().filter(|&&k| k == EventType::NoteOn).count();
        let offs = kinds.len() - ons;
        assert_eq!(ons, expected, "column {}", column);
        assert_eq!(offs, expected, "column {}", column);
        // Strict alternation, starting with a NoteOn.
        for (n, kind) in kinds.iter().enumerate() {
            let want = if n % 2 == 0 { EventType::NoteOn } else { EventType::NoteOff };
            assert_eq!(*kind, want, "column {} event {}", column, n);
        }
    }
}

#[test]
fn test_staccato_cuts_every_surviving_step() {
    let options = GeneratorOptions {
        seed: SeedPolicy::Sound,
        ..gated(SustainMode::Staccato, 0.5)
    };
    // Rule 204 is the identity: the middle cell survives every step.
    let events = generator(204, vec![0, 1, 0], options, 4).run();

    let ons: Vec<_> = events.iter().filter(|e| e.is_note_on()).collect();
    let offs: Vec<_> = events.iter().filter(|e| e.is_note_off()).map(|e| e.tick).collect();
    assert_eq!(ons.len(), 1);
    assert_eq!(ons[0].tick, 0);
    // One cut per surviving step, then the final release.
    assert_eq!(offs, vec![120, 360, 600, 840, 1080]);
    for (t, &tick) in offs.iter().take(4).enumerate() {
        let t = t as u64;
        assert!(tick >= t * Q && tick < (t + 1) * Q);
    }
}

#[test]
fn test_staccato_death_ends_run_once() {
    // Rule 51 inverts every cell: each cell lives exactly one step at a time.
    let events = generator(51, vec![1, 0], gated(SustainMode::Staccato, 0.25), 3).run();
    use EventType::{NoteOff, NoteOn};
    assert_eq!(
        summary(&events),
        vec![
            (NoteOff, 0, Q),
            (NoteOn, 1, Q),
            (NoteOff, 1, 2 * Q),
            (NoteOn, 0, 2 * Q),
            (NoteOff, 0, 3 * Q),
            (NoteOn, 1, 3 * Q),
            (NoteOff, 1, 3 * Q + 60),
        ]
    );
}

#[test]
fn test_retrigger_velocity_grows_with_age() {
    let events = generator(204, vec![0, 1, 0], gated(SustainMode::Retrigger, 0.5), 10).run();
    let velocities: Vec<u8> = events.iter().filter_map(|e| e.velocity).collect();
    assert_eq!(velocities, vec![40, 50, 60, 70, 80, 90, 100, 110, 110, 110]);

    let on_ticks: Vec<u64> = events.iter().filter(|e| e.is_note_on()).map(|e| e.tick).collect();
    assert_eq!(on_ticks, (1..=10).map(|t| t * Q).collect::<Vec<_>>());
}

#[test]
fn test_velocities_stay_within_floor_and_cap() {
    for mode in [SustainMode::Sustain, SustainMode::Staccato, SustainMode::Retrigger] {
        let events = generator(90, scattered_row(), gated(mode, 0.75), 50).run();
        for v in events.iter().filter_map(|e| e.velocity) {
            assert!((30..=110).contains(&v), "{:?} velocity {}", mode, v);
        }
    }
}

#[test]
fn test_runs_are_deterministic() {
    let first = generator(110, scattered_row(), gated(SustainMode::Retrigger, 0.5), 64).run();
    let second = generator(110, scattered_row(), gated(SustainMode::Retrigger, 0.5), 64).run();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_quiescent_empty_row_emits_nothing() {
    let events = generator(190, vec![0; 12], GeneratorOptions::default(), 20).run();
    assert!(events.is_empty());
}

#[test]
fn test_zero_steps_only_releases() {
    let options = GeneratorOptions {
        seed: SeedPolicy::Sound,
        ..Default::default()
    };
    let events = generator(190, vec![0, 1, 0], options, 0).run();
    assert_eq!(
        summary(&events),
        vec![(EventType::NoteOn, 1, 0), (EventType::NoteOff, 1, Q)]
    );
}

#[test]
fn test_silent_seed_that_survives_is_not_released() {
    // Rule 204 keeps the seed alive for the whole run.
    let events = generator(204, vec![0, 1, 0], GeneratorOptions::default(), 6).run();
    assert!(events.is_empty());

    // A silent seed that dies still reports its death.
    let events = generator(51, vec![0, 1, 0], GeneratorOptions::default(), 1).run();
    assert!(events.iter().any(|e| e.is_note_off() && e.column == 1 && e.tick == Q));
}

#[test]
fn test_event_time_in_seconds() {
    let events = generator(190, AutomatonEngine::single_seed_row(5), GeneratorOptions::default(), 1).run();
    assert_eq!(events[0].tick, Q);
    assert_eq!(events[0].time, 0.25);
}

#[test]
fn test_end_tick() {
    assert_eq!(generator(190, vec![0, 1, 0], GeneratorOptions::default(), 4).end_tick(), 5 * Q);
    let options = GeneratorOptions {
        release_at_end: false,
        ..Default::default()
    };
    assert_eq!(generator(190, vec![0, 1, 0], options, 4).end_tick(), 4 * Q);
    assert_eq!(
        generator(190, vec![0, 1, 0], gated(SustainMode::Staccato, 0.5), 4).end_tick(),
        4 * Q + 120
    );
}

#[test]
fn test_gated_modes_require_gate() {
    let engine = AutomatonEngine::new(3, RuleTable::from(190), vec![0, 1, 0]).unwrap();
    let timing = TimingMapper::new(120.0, 480, 240).unwrap();
    let pitches = PitchMapper::new(&[60u8, 62, 64], 3).unwrap();
    let options = GeneratorOptions {
        mode: SustainMode::Staccato,
        ..Default::default()
    };
    let err = EventGenerator::new(engine, timing, pitches, options, 4).unwrap_err();
    assert_eq!(err.parameter(), Some("gate"));
}

#[test]
fn test_short_gate_cuts_after_the_strike() {
    // floor(0.4 * 2) would put the cut on the strike tick itself.
    let options = GeneratorOptions {
        seed: SeedPolicy::Sound,
        ..gated(SustainMode::Staccato, 0.4)
    };
    let events = generator_with_q(204, vec![0, 1, 0], options, 3, 2).run();
    use EventType::{NoteOff, NoteOn};
    assert_eq!(
        summary(&events),
        vec![(NoteOn, 1, 0), (NoteOff, 1, 1), (NoteOff, 1, 3), (NoteOff, 1, 5), (NoteOff, 1, 7)]
    );
}

#[test]
fn test_one_tick_steps_in_gated_modes() {
    let events = generator_with_q(204, vec![0, 1, 0], gated(SustainMode::Retrigger, 0.5), 3, 1).run();
    use EventType::{NoteOff, NoteOn};
    // Each cut lands on the next boundary, ahead of the re-strike there.
    assert_eq!(
        summary(&events),
        vec![
            (NoteOff, 1, 1),
            (NoteOn, 1, 1),
            (NoteOff, 1, 2),
            (NoteOn, 1, 2),
            (NoteOff, 1, 3),
            (NoteOn, 1, 3),
            (NoteOff, 1, 4),
        ]
    );

    let options = GeneratorOptions {
        seed: SeedPolicy::Sound,
        ..gated(SustainMode::Staccato, 1.0)
    };
    let events = generator_with_q(204, vec![1, 0, 0], options, 2, 1).run();
    assert_eq!(summary(&events)[..2], [(NoteOn, 0, 0), (NoteOff, 0, 1)]);
}

#[test]
fn test_tick_overflow_rejected() {
    let engine = AutomatonEngine::new(3, RuleTable::from(190), vec![0, 1, 0]).unwrap();
    let timing = TimingMapper::new(120.0, 480, 240).unwrap();
    let pitches = PitchMapper::new(&[60u8, 62, 64], 3).unwrap();
    let err = EventGenerator::new(engine, timing, pitches, GeneratorOptions::default(), usize::MAX / 2)
        .unwrap_err();
    assert_eq!(err.parameter(), Some("steps"));
}

#[test]
fn test_pitch_width_mismatch() {
    let engine = AutomatonEngine::new(3, RuleTable::from(190), vec![0, 1, 0]).unwrap();
    let timing = TimingMapper::new(120.0, 480, 240).unwrap();
    let pitches = PitchMapper::new(&[60u8, 62], 2).unwrap();
    let err = EventGenerator::new(engine, timing, pitches, GeneratorOptions::default(), 4)
        .unwrap_err();
    assert_eq!(err.parameter(), Some("pitches"));
}

#[test]
fn test_velocity_curve() {
    let curve = VelocityCurve::default();
    let expected = [30u8, 40, 50, 60, 70, 80, 90, 100, 110, 110, 110];
    for (age, &v) in expected.iter().enumerate() {
        assert_eq!(curve.velocity(age as u32), v);
    }
    assert_eq!(curve.velocity(u32::MAX), 110);

    assert_eq!(VelocityCurve::new(30, 10, 128).unwrap_err().parameter(), Some("velocity-cap"));
    assert_eq!(VelocityCurve::new(-1, 10, 110).unwrap_err().parameter(), Some("velocity-floor"));
    assert_eq!(VelocityCurve::new(90, 10, 80).unwrap_err().parameter(), Some("velocity-floor"));
}
