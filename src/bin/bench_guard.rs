//! Fails CI when a cascade benchmark median exceeds its ceiling.
//!
//! Usage: `bench_guard [criterion-dir]` (default `target/criterion`).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

struct Budget {
    bench: &'static str,
    max_median_ns: u64,
}

const BUDGETS: &[Budget] = &[
    Budget { bench: "query/element_fusion", max_median_ns: 200_000 },
    Budget { bench: "query/runtime_roundtrip", max_median_ns: 500_000 },
    Budget { bench: "cascade/feedback_run", max_median_ns: 250_000_000 },
    Budget { bench: "pathway/view_rarity", max_median_ns: 1_000_000 },
];

fn main() -> ExitCode {
    let requested = env::args().nth(1).unwrap_or_else(|| "target/criterion".to_string());
    let Some(root) = locate(&requested) else {
        eprintln!("bench_guard: no criterion output at {requested} or any parent target dir");
        return ExitCode::from(2);
    };

    let mut failures = Vec::new();
    for budget in BUDGETS {
        match median_ns(&root, budget.bench) {
            Ok(median) if median > budget.max_median_ns => failures.push(format!(
                "{}: median {median}ns over ceiling {}ns",
                budget.bench, budget.max_median_ns
            )),
            Ok(median) => println!(
                "{}: median {median}ns (ceiling {}ns)",
                budget.bench, budget.max_median_ns
            ),
            Err(err) => failures.push(format!("{}: {err}", budget.bench)),
        }
    }

    if failures.is_empty() {
        return ExitCode::SUCCESS;
    }
    eprintln!("bench_guard: {} benchmark(s) failed", failures.len());
    for failure in &failures {
        eprintln!("  {failure}");
    }
    ExitCode::FAILURE
}

/// Resolves the criterion directory, walking up from the current directory
/// for relative paths.
fn locate(requested: &str) -> Option<PathBuf> {
    let path = Path::new(requested);
    if path.exists() {
        return Some(path.to_path_buf());
    }
    if path.is_absolute() {
        return None;
    }
    env::current_dir()
        .ok()?
        .ancestors()
        .take(6)
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.exists())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn median_ns(root: &Path, bench: &str) -> Result<u64, String> {
    let estimates = estimates_for(root, bench)
        .ok_or_else(|| "no estimates.json found".to_string())?;
    let raw = fs::read(&estimates).map_err(|e| format!("read {}: {e}", estimates.display()))?;
    let json: serde_json::Value =
        serde_json::from_slice(&raw).map_err(|e| format!("parse {}: {e}", estimates.display()))?;

    let median = json
        .pointer("/median/point_estimate")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| format!("{} has no median.point_estimate", estimates.display()))?;
    if !median.is_finite() || median < 0.0 {
        return Err(format!("bad median {median} in {}", estimates.display()));
    }

    Ok(median.round() as u64)
}

/// Criterion writes `<group>/<id>/new/estimates.json`, or
/// `<group>_<id>/new/estimates.json` for an ungrouped id containing `/`.
fn estimates_for(root: &Path, bench: &str) -> Option<PathBuf> {
    [root.join(bench), root.join(bench.replace('/', "_"))]
        .into_iter()
        .map(|dir| dir.join("new").join("estimates.json"))
        .find(|file| file.is_file())
}
