//! The `examscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examscore_core::config::load_config_from;
use examscore_core::dataset::{load_question_banks, validate_questions};

pub fn execute(questions_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let banks = load_question_banks(&questions_path)?;

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Question bank: {} ({} questions)", bank.name, bank.questions.len());

        let warnings = validate_questions(bank, config.default_numerical_tolerance);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
