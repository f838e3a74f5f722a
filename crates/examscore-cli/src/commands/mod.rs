pub mod compare;
pub mod init;
pub mod rank;
pub mod score;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use examscore_core::config::load_config_from;
use examscore_core::dataset::{parse_question_bank, QuestionBank};
use examscore_core::diagnostics::Diagnostic;
use examscore_core::engine::ScoringEngine;

/// Load config and build the engine from it.
fn build_engine(config_path: Option<&Path>) -> Result<ScoringEngine> {
    let config = load_config_from(config_path)?;
    Ok(ScoringEngine::new(&config)?)
}

fn load_bank(path: &Path) -> Result<QuestionBank> {
    anyhow::ensure!(
        !path.is_dir(),
        "expected a question bank file, got a directory: {}",
        path.display()
    );
    parse_question_bank(path)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!("\n{} data warning(s):", diagnostics.len());
    for d in diagnostics {
        eprintln!("  [{}] {}: {}", d.question_id, d.kind, d.message);
    }
}
