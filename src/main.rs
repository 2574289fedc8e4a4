use std::env;
use std::fs;
use std::path::Path;
use std::process;

use eca_midi::reference::{rule190_sequence, verify_single_seed};
use eca_midi::{generate, render_row, Config, RuleTable};
use tracing::{info, warn};

const USAGE: &str = "Usage: eca-midi [--rows] [--check] <config.yaml> [output.mid]";

/// Rows checked against the rule 190 reference sequence.
const CHECK_STEPS: usize = 20;

fn main() {
    init_tracing();

    let mut show_rows = false;
    let mut check = false;
    let mut positional = Vec::new();

    // Parse flags
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--rows" => show_rows = true,
            "--check" => check = true,
            flag if flag.starts_with("--") => {
                eprintln!("Unknown flag '{}'", flag);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
            _ => positional.push(arg),
        }
    }

    if check {
        check_rule190();
    }

    let Some(input_path) = positional.first() else {
        if check {
            return;
        }
        eprintln!("{}", USAGE);
        process::exit(1);
    };
    let output_path = positional.get(1);

    // Read input file
    let source = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    let config = match Config::from_yaml(&source) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    if show_rows {
        print_rows(&config);
    }

    let performance = match generate(&config) {
        Ok(performance) => performance,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    // Output
    match output_path {
        Some(path) => {
            if let Err(e) = performance.write_midi(Path::new(path)) {
                eprintln!("Error writing to '{}': {}", path, e);
                process::exit(1);
            }
            eprintln!(
                "Wrote {} ({} events, {:.2} s)",
                path,
                performance.events.len(),
                performance.duration_seconds()
            );
        }
        None => {
            for event in &performance.events {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => {
                        eprintln!("Error encoding event: {}", e);
                        process::exit(1);
                    }
                }
            }
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print the automaton evolution the run will sonify.
fn print_rows(config: &Config) {
    let (mut engine, steps) = match config.build() {
        Ok(generator) => (generator.engine().clone(), generator.steps()),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    eprintln!("{:>5} {}", 0, render_row(engine.row()));
    for t in 1..=steps {
        engine.step();
        eprintln!("{:>5} {}", t, render_row(engine.row()));
    }
}

fn check_rule190() {
    let expected = rule190_sequence(CHECK_STEPS);
    let mismatches = verify_single_seed(RuleTable::from(190), &expected);
    if mismatches.is_empty() {
        info!(rows = CHECK_STEPS, "rule 190 matches its reference sequence");
        eprintln!("[ok] First {} rows match the rule 190 sequence", CHECK_STEPS);
        return;
    }
    for m in &mismatches {
        warn!(step = m.step, expected = %m.expected, actual = ?m.actual, "rule 190 mismatch");
    }
    eprintln!("[fail] {} of {} rows differ from the rule 190 sequence", mismatches.len(), CHECK_STEPS);
    process::exit(1);
}
