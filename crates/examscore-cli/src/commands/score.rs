//! The `examscore score` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examscore_core::aggregation::{Bucket, Dimension};
use examscore_core::dataset::load_responses;
use examscore_core::report::SessionReport;

use super::{build_engine, load_bank, print_diagnostics};

pub fn execute(
    questions_path: PathBuf,
    responses_path: PathBuf,
    participant: String,
    session: Option<String>,
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let engine = build_engine(config_path.as_deref())?;
    let bank = load_bank(&questions_path)?;

    let mut records = load_responses(&responses_path)?;
    let before = records.len();
    records.retain(|r| r.participant_id == participant);
    if records.len() < before {
        tracing::info!(
            "ignoring {} record(s) from other participants",
            before - records.len()
        );
    }
    if let Some(session) = &session {
        records.retain(|r| &r.session_id == session);
        anyhow::ensure!(
            !records.is_empty(),
            "no records for participant {participant} in session {session}"
        );
    }

    let result = engine.summarize_session(&participant, &bank.questions, &records);
    let report = SessionReport::new(bank.id.clone(), result);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_report(&report),
    }
    print_diagnostics(&report.result.diagnostics);

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn print_report(report: &SessionReport) {
    let summary = &report.result.summary;
    let aggregation = &report.result.aggregation;

    println!("Participant: {} ({})", summary.participant_id, report.exam_id);
    println!(
        "Marks: {:.2} / {:.2}  Accuracy: {:.1}%  Time: {:.1} min",
        summary.obtained_marks,
        summary.max_possible_marks,
        summary.accuracy * 100.0,
        summary.time_spent_minutes
    );
    println!(
        "Correct {}  Incorrect {}  Unattempted {}  of {}",
        summary.correct_count,
        summary.incorrect_count,
        summary.unattempted_count,
        summary.total_questions
    );

    for dimension in [Dimension::Subject, Dimension::Difficulty, Dimension::Section] {
        let buckets = aggregation.buckets(dimension);
        if buckets.is_empty() {
            continue;
        }
        println!("\nBy {dimension}:\n{}", bucket_table(buckets.iter()));
    }

    if !aggregation.chapter_insights.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Chapter", "Accuracy", "Band"]);
        for insight in &aggregation.chapter_insights {
            table.add_row(vec![
                Cell::new(&insight.chapter),
                Cell::new(format!("{:.1}%", insight.accuracy * 100.0)),
                Cell::new(insight.classification),
            ]);
        }
        println!("\nChapters:\n{table}");
    }

    let review = &aggregation.review;
    println!(
        "\nReview marking: answered+marked {} ({} wrong), answered only {}, marked only {}, untouched {}",
        review.answered_marked,
        review.answered_marked_incorrect,
        review.answered_unmarked,
        review.marked_unanswered,
        review.unmarked_unanswered
    );
}

fn bucket_table<'a>(buckets: impl Iterator<Item = (&'a String, &'a Bucket)>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Group",
        "Correct",
        "Incorrect",
        "Skipped",
        "Accuracy",
        "Marks",
        "Avg time",
    ]);
    for (name, bucket) in buckets {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(bucket.correct_count),
            Cell::new(bucket.incorrect_count),
            Cell::new(bucket.unattempted_count),
            Cell::new(format!("{:.1}%", bucket.accuracy() * 100.0)),
            Cell::new(format!("{:.2}/{:.2}", bucket.marks_obtained, bucket.marks_possible)),
            Cell::new(format!("{:.0}s", bucket.average_time_seconds())),
        ]);
    }
    table
}
