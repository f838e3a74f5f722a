//! The `examscore rank` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examscore_core::dataset::load_attempts;
use examscore_core::ranking::Leaderboard;

use super::{build_engine, load_bank, print_diagnostics};

pub fn execute(
    questions_path: PathBuf,
    attempts_path: PathBuf,
    contest: String,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let engine = build_engine(config_path.as_deref())?;
    let bank = load_bank(&questions_path)?;
    let attempts = load_attempts(&attempts_path)?;

    let result = engine.rank_attempts(&contest, &bank.questions, &attempts)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result.leaderboard)?),
        _ => print_leaderboard(&result.leaderboard),
    }
    print_diagnostics(&result.diagnostics);

    Ok(())
}

fn print_leaderboard(board: &Leaderboard) {
    if board.is_empty() {
        println!("No attempts found for contest {}.", board.contest_id);
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Rank",
        "Participant",
        "Marks",
        "Accuracy",
        "Time (min)",
        "Percentile",
    ]);
    for entry in &board.entries {
        let s = &entry.summary;
        table.add_row(vec![
            Cell::new(entry.rank),
            Cell::new(&s.participant_id),
            Cell::new(format!("{:.2}/{:.2}", s.obtained_marks, s.max_possible_marks)),
            Cell::new(format!("{:.1}%", s.accuracy * 100.0)),
            Cell::new(format!("{:.1}", s.time_spent_minutes)),
            Cell::new(format!("{:.1}", entry.percentile)),
        ]);
    }

    println!(
        "Contest {} ({} participants)\n{table}",
        board.contest_id,
        board.len()
    );
}
