//! The `examscore compare` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examscore_core::report::{ProgressReport, SessionReport};

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&threshold),
        "threshold is an accuracy fraction and must be within [0, 1], got {threshold}"
    );

    let baseline = SessionReport::load_json(&baseline_path)?;
    let current = SessionReport::load_json(&current_path)?;

    if baseline.participant_id() != current.participant_id() {
        tracing::warn!(
            baseline = baseline.participant_id(),
            current = current.participant_id(),
            "reports belong to different participants"
        );
    }
    if baseline.exam_id != current.exam_id {
        tracing::info!(
            "comparing across papers: {} -> {}",
            baseline.exam_id,
            current.exam_id
        );
    }

    let progress = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => print!("{}", progress.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&progress)?),
        _ => print_progress(&progress),
    }

    if fail_on_regression && progress.has_regressions() {
        eprintln!(
            "{} subject(s) regressed beyond {:.1}%",
            progress.regressions.len(),
            threshold * 100.0
        );
        std::process::exit(1);
    }

    Ok(())
}

fn print_progress(progress: &ProgressReport) {
    println!(
        "Marks: {:.2} -> {:.2} ({:+.2})",
        progress.baseline_marks,
        progress.current_marks,
        progress.current_marks - progress.baseline_marks
    );

    let moved = progress
        .regressions
        .iter()
        .map(|c| (c, "regression"))
        .chain(progress.improvements.iter().map(|c| (c, "improvement")));

    let mut table = Table::new();
    table.set_header(vec!["Subject", "Baseline", "Current", "Change", "Trend"]);
    for (change, trend) in moved {
        table.add_row(vec![
            Cell::new(&change.subject),
            Cell::new(format!("{:.1}%", change.baseline_accuracy * 100.0)),
            Cell::new(format!("{:.1}%", change.current_accuracy * 100.0)),
            Cell::new(format!("{:+.1}%", change.delta * 100.0)),
            Cell::new(trend),
        ]);
    }

    if progress.regressions.is_empty() && progress.improvements.is_empty() {
        println!("No subject moved beyond the threshold.");
    } else {
        if !progress.improvements.is_empty() {
            println!("Improvements: {}", progress.improvements.len());
        }
        if !progress.regressions.is_empty() {
            println!("Regressions: {}", progress.regressions.len());
        }
        println!("{table}");
    }

    let mut tail = vec![format!("{} unchanged", progress.unchanged)];
    if progress.new_subjects > 0 {
        tail.push(format!("{} new", progress.new_subjects));
    }
    if progress.removed_subjects > 0 {
        tail.push(format!("{} removed", progress.removed_subjects));
    }
    println!("Subjects: {}", tail.join(", "));
}
