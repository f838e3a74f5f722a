//! Core data model types for examscore.
//!
//! Questions, response records, and attempt records are supplied by the
//! caller (usually fetched from a persistence layer). Everything derived from
//! them lives in the engine modules and is rebuilt on every call.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// An immutable question definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier for this question.
    pub id: String,
    /// Answer type plus the data needed to check a response.
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Marks awarded for a correct response.
    #[serde(default)]
    pub positive_marks: f64,
    /// Marks deducted for an incorrect response, stored as a magnitude.
    #[serde(default)]
    pub negative_marks: f64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Section of the paper this question belongs to, if sectioned.
    #[serde(default)]
    pub section_id: Option<String>,
}

/// The three supported answer types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one option is correct.
    SingleChoice {
        #[serde(default)]
        correct_option_labels: BTreeSet<String>,
    },
    /// The full set of correct options must be selected; no partial credit.
    MultiChoice {
        #[serde(default)]
        correct_option_labels: BTreeSet<String>,
    },
    /// A decimal answer checked against a tolerance window.
    Numerical {
        #[serde(default)]
        numerical_answer: Option<f64>,
        #[serde(default)]
        numerical_tolerance: Option<f64>,
    },
}

impl QuestionKind {
    /// Short name of the answer type, matching its serialized tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice { .. } => "single_choice",
            QuestionKind::MultiChoice { .. } => "multi_choice",
            QuestionKind::Numerical { .. } => "numerical",
        }
    }
}

/// Question difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[serde(alias = "moderate")]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "moderate" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One observation of a participant's interaction with one question.
///
/// A session usually holds several records per question, one per visit.
/// Only the record with the highest `visit_sequence` counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub question_id: String,
    pub participant_id: String,
    pub session_id: String,
    /// Monotonic visit counter within the session.
    pub visit_sequence: u64,
    #[serde(default)]
    pub is_answered: bool,
    #[serde(default)]
    pub selected_option_labels: BTreeSet<String>,
    #[serde(default)]
    pub numerical_value: Option<f64>,
    /// Whole seconds. Fractional values in a log are rounded on load.
    #[serde(default, deserialize_with = "whole_seconds")]
    pub time_spent_seconds: u32,
    #[serde(default)]
    pub is_marked_for_review: bool,
}

fn whole_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(de::Error::custom(format!(
            "time_spent_seconds must be a non-negative number, got {seconds}"
        )));
    }
    Ok(seconds.round().min(f64::from(u32::MAX)) as u32)
}

/// One submission event by a participant for a contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_id: Uuid,
    pub participant_id: String,
    pub contest_id: String,
    pub created_at: DateTime<Utc>,
    pub payload: AttemptPayload,
}

/// What an attempt carries: a ready summary or the raw responses behind one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPayload {
    Summary(ParticipantSummary),
    Responses(Vec<ResponseRecord>),
}

/// Outcome of evaluating one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Correct,
    Incorrect,
    Unattempted,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Correct => write!(f, "correct"),
            ResponseStatus::Incorrect => write!(f, "incorrect"),
            ResponseStatus::Unattempted => write!(f, "unattempted"),
        }
    }
}

/// A response after scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedResponse {
    pub question_id: String,
    /// Meaningless when `status` is unattempted (always `false` then).
    pub is_correct: bool,
    /// Signed marks, within `[-negative_marks, positive_marks]`.
    pub marks_obtained: f64,
    pub status: ResponseStatus,
    pub is_marked_for_review: bool,
    pub time_spent_seconds: u32,
}

impl EvaluatedResponse {
    /// An unattempted response for a question the participant never visited.
    pub fn unvisited(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            is_correct: false,
            marks_obtained: 0.0,
            status: ResponseStatus::Unattempted,
            is_marked_for_review: false,
            time_spent_seconds: 0,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status != ResponseStatus::Unattempted
    }
}

/// Headline numbers for one participant's attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub participant_id: String,
    pub obtained_marks: f64,
    pub max_possible_marks: f64,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub unattempted_count: u32,
    pub total_questions: u32,
    /// Fraction of attempted questions answered correctly, in `[0, 1]`.
    pub accuracy: f64,
    pub time_spent_minutes: f64,
}

/// A ranked row of a contest leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(flatten)]
    pub summary: ParticipantSummary,
    /// 1-based dense rank.
    pub rank: u32,
    /// In `[0, 100]`, non-increasing as rank grows.
    pub percentile: f64,
}
