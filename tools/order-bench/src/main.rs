//! Reading-order benchmark CLI for Kimeno.
//!
//! Replays OCR observations recorded as JSON through the reconstructor and
//! reports the assembled text and how long it took. No display or OCR
//! engine needed.
//!
//! Usage:
//!   cargo run -- <file.json>                    Single fixture, line-aware
//!   cargo run -- <file.json> --raw              Single fixture, engine order
//!   cargo run -- <file.json> --compare          Both modes side-by-side
//!   cargo run -- --batch <directory>            All .json fixtures → CSV
//!   cargo run -- --batch <directory> --raw      Batch in engine order
//!
//! Fixture format: a JSON array of
//!   {"text": "...", "bounds": {"origin": {"x": 0.1, "y": 0.8}, "width": 0.3, "height": 0.05}}
//! with normalized, bottom-left-origin bounds.

use kimeno_lib::ocr::{reconstruct_lines, ReadingMode, TextObservation};
use kimeno_lib::reconstruct;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One timed reconstruction.
struct Run {
    text: String,
    lines: usize,
    micros: u128,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage:");
        eprintln!("  order-bench <file.json> [--raw] [--compare]");
        eprintln!("  order-bench --batch <directory> [--raw] [--compare]");
        std::process::exit(1);
    }

    let raw = args.contains(&"--raw".to_string());
    let compare = args.contains(&"--compare".to_string());

    if args[1] == "--batch" {
        let Some(dir) = args.get(2) else {
            eprintln!("--batch requires a directory path");
            std::process::exit(1);
        };
        run_batch(dir, raw, compare);
    } else {
        run_single(&args[1], raw, compare);
    }
}

fn load_fixture(path: &Path) -> Result<Vec<TextObservation>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("{}: {}", path.display(), e))
}

fn time_mode(observations: &[TextObservation], mode: ReadingMode) -> Run {
    let start = Instant::now();
    let (text, lines) = match mode {
        ReadingMode::LineAware => {
            let lines = reconstruct_lines(observations.to_vec());
            let count = lines.len();
            let text = lines.iter().map(|l| l.text()).collect::<Vec<_>>().join("\n");
            (text, count)
        }
        ReadingMode::RawOrder => (
            reconstruct(observations.to_vec(), ReadingMode::RawOrder),
            observations.len(),
        ),
    };
    Run {
        text,
        lines,
        micros: start.elapsed().as_micros(),
    }
}

fn mode_label(mode: ReadingMode) -> &'static str {
    match mode {
        ReadingMode::LineAware => "line_aware",
        ReadingMode::RawOrder => "raw_order",
    }
}

fn modes(raw: bool, compare: bool) -> Vec<ReadingMode> {
    if compare {
        vec![ReadingMode::LineAware, ReadingMode::RawOrder]
    } else if raw {
        vec![ReadingMode::RawOrder]
    } else {
        vec![ReadingMode::LineAware]
    }
}

fn run_single(path: &str, raw: bool, compare: bool) {
    let observations = match load_fixture(Path::new(path)) {
        Ok(observations) => observations,
        Err(e) => {
            eprintln!("Failed to load fixture {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("=== {} ({} fragments) ===", path, observations.len());
    for mode in modes(raw, compare) {
        let run = time_mode(&observations, mode);
        eprintln!();
        eprintln!("  {}:", mode_label(mode).to_uppercase());
        eprintln!("    Lines: {}", run.lines);
        eprintln!("    Chars: {}", run.text.chars().count());
        eprintln!("    Time: {}µs", run.micros);
        println!("{}", run.text);
    }
}

fn run_batch(dir_path: &str, raw: bool, compare: bool) {
    let dir = Path::new(dir_path);
    if !dir.is_dir() {
        eprintln!("Not a directory: {}", dir_path);
        std::process::exit(1);
    }

    let mut entries: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(read) => read
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect(),
        Err(e) => {
            eprintln!("Failed to read directory: {}", e);
            std::process::exit(1);
        }
    };
    entries.sort();

    if entries.is_empty() {
        eprintln!("No .json fixtures found in {}", dir_path);
        std::process::exit(1);
    }

    println!("file,mode,lines,chars,micros");

    let mut timings: Vec<u128> = Vec::new();
    let mut skipped = 0usize;

    for path in &entries {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let observations = match load_fixture(path) {
            Ok(observations) => observations,
            Err(e) => {
                eprintln!("Skipping {}", e);
                skipped += 1;
                continue;
            }
        };

        for mode in modes(raw, compare) {
            let run = time_mode(&observations, mode);
            println!(
                "{},{},{},{},{}",
                filename,
                mode_label(mode),
                run.lines,
                run.text.chars().count(),
                run.micros
            );
            timings.push(run.micros);
        }

        std::io::stdout().flush().ok();
    }

    eprintln!("\n--- Benchmark Summary ---");
    eprintln!("  Fixtures processed: {}", entries.len() - skipped);
    if skipped > 0 {
        eprintln!("  Fixtures skipped: {}", skipped);
    }
    if !timings.is_empty() {
        print_timing_summary(&mut timings);
    }
}

fn print_timing_summary(timings: &mut [u128]) {
    timings.sort_unstable();
    let median = timings[timings.len() / 2];
    let p99_idx = ((timings.len() as f64 * 0.99).ceil() as usize).min(timings.len() - 1);
    let p99 = timings[p99_idx];
    let avg = timings.iter().sum::<u128>() as f64 / timings.len() as f64;

    eprintln!("    Median: {}µs", median);
    eprintln!("    Average: {:.1}µs", avg);
    eprintln!("    P99: {}µs", p99);
}
