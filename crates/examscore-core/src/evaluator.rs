//! Per-response correctness and marking.
//!
//! Evaluation is fail-soft: a question with missing or inconsistent answer
//! data scores the response as incorrect and records a [`Diagnostic`]
//! instead of returning an error, so one bad question never blocks the rest
//! of an attempt.
//!
//! [`Diagnostic`]: crate::diagnostics::Diagnostic

use std::collections::BTreeSet;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{EvaluatedResponse, Question, QuestionKind, ResponseRecord, ResponseStatus};

/// Scores responses against their questions.
#[derive(Debug, Clone)]
pub struct AnswerEvaluator {
    default_tolerance: Option<f64>,
}

impl Default for AnswerEvaluator {
    fn default() -> Self {
        Self::new(Some(0.01))
    }
}

impl AnswerEvaluator {
    /// `default_tolerance` applies to numerical questions without their own.
    pub fn new(default_tolerance: Option<f64>) -> Self {
        Self { default_tolerance }
    }

    /// Evaluate one authoritative response against its question.
    pub fn evaluate(
        &self,
        question: &Question,
        response: &ResponseRecord,
        diagnostics: &mut Diagnostics,
    ) -> EvaluatedResponse {
        let base = EvaluatedResponse {
            question_id: question.id.clone(),
            is_correct: false,
            marks_obtained: 0.0,
            status: ResponseStatus::Unattempted,
            is_marked_for_review: response.is_marked_for_review,
            time_spent_seconds: response.time_spent_seconds,
        };

        if !response.is_answered {
            return base;
        }

        let is_correct = match &question.kind {
            QuestionKind::SingleChoice {
                correct_option_labels,
            } => {
                if correct_option_labels.len() > 1 {
                    diagnostics.report(
                        &question.id,
                        DiagnosticKind::AmbiguousSingleChoice,
                        format!(
                            "single-choice question lists {} correct options",
                            correct_option_labels.len()
                        ),
                    );
                    false
                } else {
                    choice_matches(question, correct_option_labels, response, diagnostics)
                }
            }
            QuestionKind::MultiChoice {
                correct_option_labels,
            } => choice_matches(question, correct_option_labels, response, diagnostics),
            QuestionKind::Numerical {
                numerical_answer,
                numerical_tolerance,
            } => self.numerical_matches(
                question,
                *numerical_answer,
                *numerical_tolerance,
                response,
                diagnostics,
            ),
        };

        let marks_obtained = if is_correct {
            award(question, diagnostics)
        } else {
            // Subtract rather than negate so a zero penalty stays +0.0.
            0.0 - penalty(question, diagnostics)
        };

        EvaluatedResponse {
            is_correct,
            marks_obtained,
            status: if is_correct {
                ResponseStatus::Correct
            } else {
                ResponseStatus::Incorrect
            },
            ..base
        }
    }

    fn numerical_matches(
        &self,
        question: &Question,
        answer: Option<f64>,
        tolerance: Option<f64>,
        response: &ResponseRecord,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let Some(answer) = answer.filter(|a| a.is_finite()) else {
            diagnostics.report(
                &question.id,
                DiagnosticKind::MissingNumericalAnswer,
                "numerical question has no usable reference answer",
            );
            return false;
        };

        let Some(tolerance) = tolerance.or(self.default_tolerance) else {
            diagnostics.report(
                &question.id,
                DiagnosticKind::MissingTolerance,
                "numerical question has no tolerance and no default is configured",
            );
            return false;
        };
        if !tolerance.is_finite() || tolerance < 0.0 {
            diagnostics.report(
                &question.id,
                DiagnosticKind::InvalidTolerance,
                format!("tolerance {tolerance} is not a non-negative number"),
            );
            return false;
        }

        let Some(value) = response.numerical_value else {
            diagnostics.report(
                &question.id,
                DiagnosticKind::MissingNumericalValue,
                format!(
                    "response from {} is marked answered but has no value",
                    response.participant_id
                ),
            );
            return false;
        };

        // Strict: a response exactly on the tolerance boundary is wrong.
        (value - answer).abs() < tolerance
    }
}

fn choice_matches(
    question: &Question,
    correct: &BTreeSet<String>,
    response: &ResponseRecord,
    diagnostics: &mut Diagnostics,
) -> bool {
    if correct.is_empty() {
        diagnostics.report(
            &question.id,
            DiagnosticKind::MissingCorrectOptions,
            format!("{} question has no correct options", question.kind.type_name()),
        );
        return false;
    }
    response.selected_option_labels == *correct
}

fn award(question: &Question, diagnostics: &mut Diagnostics) -> f64 {
    let marks = question.positive_marks;
    if marks.is_finite() && marks >= 0.0 {
        marks
    } else {
        diagnostics.report(
            &question.id,
            DiagnosticKind::InvalidMarks,
            format!("positive_marks {marks} is not a non-negative number"),
        );
        0.0
    }
}

fn penalty(question: &Question, diagnostics: &mut Diagnostics) -> f64 {
    let marks = question.negative_marks;
    if marks.is_finite() {
        marks.abs()
    } else {
        diagnostics.report(
            &question.id,
            DiagnosticKind::InvalidMarks,
            format!("negative_marks {marks} is not a number"),
        );
        0.0
    }
}
