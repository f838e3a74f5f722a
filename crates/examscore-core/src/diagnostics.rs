//! Data-quality diagnostics raised while scoring.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What was wrong with a question or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A choice question has no correct option labels.
    MissingCorrectOptions,
    /// A single-choice question lists more than one correct label.
    AmbiguousSingleChoice,
    /// A numerical question has no reference answer.
    MissingNumericalAnswer,
    /// A numerical question has no tolerance and no default is configured.
    MissingTolerance,
    /// A tolerance is negative or not finite.
    InvalidTolerance,
    /// A marks value is negative or not finite.
    InvalidMarks,
    /// A numerical response was marked answered but carries no value.
    MissingNumericalValue,
    /// A response refers to a question that was not supplied.
    UnknownQuestion,
    /// A response belongs to a different participant than the one scored.
    ForeignParticipant,
    /// A response belongs to a different session than the one scored.
    OtherSession,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::MissingCorrectOptions => "missing_correct_options",
            DiagnosticKind::AmbiguousSingleChoice => "ambiguous_single_choice",
            DiagnosticKind::MissingNumericalAnswer => "missing_numerical_answer",
            DiagnosticKind::MissingTolerance => "missing_tolerance",
            DiagnosticKind::InvalidTolerance => "invalid_tolerance",
            DiagnosticKind::InvalidMarks => "invalid_marks",
            DiagnosticKind::MissingNumericalValue => "missing_numerical_value",
            DiagnosticKind::UnknownQuestion => "unknown_question",
            DiagnosticKind::ForeignParticipant => "foreign_participant",
            DiagnosticKind::OtherSession => "other_session",
        };
        f.write_str(s)
    }
}

/// A single data-quality finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub question_id: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(question_id: &str, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            question_id: question_id.to_string(),
            kind,
            message: message.into(),
        }
    }
}

/// Collects diagnostics and mirrors each one to the log.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            question_id = %diagnostic.question_id,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn report(&mut self, question_id: &str, kind: DiagnosticKind, message: impl Into<String>) {
        self.push(Diagnostic::new(question_id, kind, message));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
