//! Question bank, response log, and attempt log loading.
//!
//! Question banks are TOML (`[exam]` header plus `[[questions]]`) or a JSON
//! array of questions. Response and attempt logs are JSON arrays.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{AttemptRecord, Question, QuestionKind, ResponseRecord};

/// A named set of questions, in paper order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestionFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// Parse a question bank file, picking the format from its extension.
pub fn parse_question_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        let questions: Vec<Question> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(QuestionBank {
            id: stem.clone(),
            name: stem,
            description: String::new(),
            questions,
        })
    } else {
        parse_question_bank_str(&content, path)
    }
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_question_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlQuestionFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(QuestionBank {
        id: parsed.exam.id,
        name: parsed.exam.name,
        description: parsed.exam.description,
        questions: parsed.questions,
    })
}

/// Recursively load all `.toml` and `.json` question banks from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_question_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_question_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Load a question bank from a file or every bank in a directory.
pub fn load_question_banks(path: &Path) -> Result<Vec<QuestionBank>> {
    if path.is_dir() {
        load_question_directory(path)
    } else {
        Ok(vec![parse_question_bank(path)?])
    }
}

/// Load a JSON array of response records.
pub fn load_responses(path: &Path) -> Result<Vec<ResponseRecord>> {
    load_json_array(path, "response log")
}

/// Load a JSON array of attempt records.
pub fn load_attempts(path: &Path) -> Result<Vec<AttemptRecord>> {
    load_json_array(path, "attempt log")
}

fn load_json_array<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what}: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {what}: {}", path.display()))
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a question bank for data that would score as incorrect.
///
/// `default_tolerance` is the configured fallback for numerical questions.
pub fn validate_questions(
    bank: &QuestionBank,
    default_tolerance: Option<f64>,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |id: &str, message: String| {
        warnings.push(ValidationWarning {
            question_id: Some(id.to_string()),
            message,
        })
    };

    let mut seen_ids = std::collections::HashSet::new();
    for question in &bank.questions {
        if !seen_ids.insert(&question.id) {
            warn(&question.id, format!("duplicate question ID: {}", question.id));
        }

        match &question.kind {
            QuestionKind::SingleChoice {
                correct_option_labels,
            } => {
                if correct_option_labels.is_empty() {
                    warn(&question.id, "no correct option labels".into());
                } else if correct_option_labels.len() > 1 {
                    warn(
                        &question.id,
                        format!(
                            "single_choice question has {} correct options",
                            correct_option_labels.len()
                        ),
                    );
                }
            }
            QuestionKind::MultiChoice {
                correct_option_labels,
            } => {
                if correct_option_labels.is_empty() {
                    warn(&question.id, "no correct option labels".into());
                }
            }
            QuestionKind::Numerical {
                numerical_answer,
                numerical_tolerance,
            } => {
                if numerical_answer.is_none() {
                    warn(&question.id, "numerical question has no answer".into());
                }
                match numerical_tolerance.or(default_tolerance) {
                    None => warn(
                        &question.id,
                        "numerical question has no tolerance and no default is configured".into(),
                    ),
                    Some(t) if !t.is_finite() || t < 0.0 => {
                        warn(&question.id, format!("invalid tolerance: {t}"))
                    }
                    Some(_) => {}
                }
            }
        }

        if !question.positive_marks.is_finite() || question.positive_marks < 0.0 {
            warn(
                &question.id,
                format!("positive_marks must be non-negative, got {}", question.positive_marks),
            );
        }
        if question.negative_marks < 0.0 {
            warn(
                &question.id,
                format!(
                    "negative_marks should be stored as a magnitude, got {}",
                    question.negative_marks
                ),
            );
        }
    }

    if bank.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "question bank has no questions".into(),
        });
    }

    warnings
}
