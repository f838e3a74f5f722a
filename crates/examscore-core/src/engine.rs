//! Scoring pipeline orchestrator.
//!
//! Wires the deduplicator, evaluator, aggregation, and ranking together:
//! raw response log → latest record per question → evaluated responses →
//! aggregation and summary; and, for contests, latest attempt per
//! participant → summaries → leaderboard.
//!
//! The engine holds only configuration. Every call builds its output from
//! the arguments alone.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::aggregation::{Aggregation, AggregationEngine};
use crate::config::EngineConfig;
use crate::dedup::{current_session, latest_attempts_per_participant, latest_responses};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::EngineError;
use crate::evaluator::AnswerEvaluator;
use crate::model::{
    AttemptPayload, AttemptRecord, EvaluatedResponse, ParticipantSummary, Question, ResponseRecord,
};
use crate::ranking::{Leaderboard, RankingEngine};

/// Output of scoring one participant's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub summary: ParticipantSummary,
    pub aggregation: Aggregation,
    /// One entry per question, in paper order.
    pub evaluated: Vec<EvaluatedResponse>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Output of ranking a contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestResult {
    pub leaderboard: Leaderboard,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// The scoring engine.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    evaluator: AnswerEvaluator,
    aggregator: AggregationEngine,
    ranking: RankingEngine,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self {
            evaluator: AnswerEvaluator::new(EngineConfig::default().default_numerical_tolerance),
            aggregator: AggregationEngine::default(),
            ranking: RankingEngine::new(),
        }
    }
}

impl ScoringEngine {
    /// Build an engine, rejecting inconsistent configuration.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            evaluator: AnswerEvaluator::new(config.default_numerical_tolerance),
            aggregator: AggregationEngine::new(config),
            ranking: RankingEngine::new(),
        })
    }

    /// Evaluate a single question/response pair.
    pub fn evaluate(
        &self,
        question: &Question,
        response: &ResponseRecord,
    ) -> (EvaluatedResponse, Vec<Diagnostic>) {
        let mut diagnostics = Diagnostics::new();
        let evaluated = self.evaluator.evaluate(question, response, &mut diagnostics);
        (evaluated, diagnostics.into_vec())
    }

    /// Aggregate already-evaluated responses into a summary and buckets.
    pub fn summarize(
        &self,
        participant_id: &str,
        questions: &[Question],
        evaluated: &[EvaluatedResponse],
    ) -> (ParticipantSummary, Aggregation, Vec<Diagnostic>) {
        let mut diagnostics = Diagnostics::new();
        let aggregation = self.aggregator.aggregate(questions, evaluated, &mut diagnostics);
        let summary = aggregation.participant_summary(participant_id);
        (summary, aggregation, diagnostics.into_vec())
    }

    /// Score a raw session log end to end.
    ///
    /// Questions without any response record count as unattempted.
    /// Records for questions not in `questions`, records of other
    /// participants, and records of earlier sessions in a mixed log are
    /// reported and dropped.
    pub fn summarize_session(
        &self,
        participant_id: &str,
        questions: &[Question],
        records: &[ResponseRecord],
    ) -> SessionResult {
        let mut diagnostics = Diagnostics::new();
        let evaluated =
            self.evaluate_session(participant_id, questions, records, &mut diagnostics);
        let aggregation = self
            .aggregator
            .aggregate(questions, &evaluated, &mut diagnostics);
        let summary = aggregation.participant_summary(participant_id);

        tracing::debug!(
            participant_id,
            records = records.len(),
            questions = questions.len(),
            obtained_marks = summary.obtained_marks,
            "scored session"
        );

        SessionResult {
            summary,
            aggregation,
            evaluated,
            diagnostics: diagnostics.into_vec(),
        }
    }

    /// Rank summaries that are already one per participant.
    pub fn rank(
        &self,
        contest_id: &str,
        summaries: Vec<ParticipantSummary>,
    ) -> Result<Leaderboard, EngineError> {
        self.ranking.rank(contest_id, summaries)
    }

    /// Rank a contest from its raw attempt log.
    ///
    /// Keeps the latest attempt per participant, scores attempts that carry
    /// raw responses against `questions`, and ranks the results.
    pub fn rank_attempts(
        &self,
        contest_id: &str,
        questions: &[Question],
        attempts: &[AttemptRecord],
    ) -> Result<ContestResult, EngineError> {
        let mut diagnostics = Diagnostics::new();
        let latest = latest_attempts_per_participant(contest_id, attempts);

        let summaries: Vec<ParticipantSummary> = latest
            .into_iter()
            .map(|attempt| match &attempt.payload {
                AttemptPayload::Summary(summary) => ParticipantSummary {
                    participant_id: attempt.participant_id.clone(),
                    ..summary.clone()
                },
                AttemptPayload::Responses(records) => {
                    let evaluated = self.evaluate_session(
                        &attempt.participant_id,
                        questions,
                        records,
                        &mut diagnostics,
                    );
                    self.aggregator
                        .aggregate(questions, &evaluated, &mut diagnostics)
                        .participant_summary(&attempt.participant_id)
                }
            })
            .collect();

        let leaderboard = self.ranking.rank(contest_id, summaries)?;
        Ok(ContestResult {
            leaderboard,
            diagnostics: diagnostics.into_vec(),
        })
    }

    /// Latest record per question, evaluated, in paper order.
    ///
    /// Only `participant_id`'s records from a single session are scored; the
    /// session is the one the log's last record belongs to. Everything else
    /// is reported and skipped.
    fn evaluate_session(
        &self,
        participant_id: &str,
        questions: &[Question],
        records: &[ResponseRecord],
        diagnostics: &mut Diagnostics,
    ) -> Vec<EvaluatedResponse> {
        let mut own: Vec<&ResponseRecord> = Vec::with_capacity(records.len());
        for record in records {
            if record.participant_id == participant_id {
                own.push(record);
            } else {
                diagnostics.report(
                    &record.question_id,
                    DiagnosticKind::ForeignParticipant,
                    format!(
                        "record from participant {} ignored while scoring {participant_id}",
                        record.participant_id
                    ),
                );
            }
        }
        let session = current_session(own.iter().copied());

        let known: HashSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        let mut latest: HashMap<&str, &ResponseRecord> = HashMap::new();
        for record in latest_responses(own.iter().copied()) {
            if Some(record.session_id.as_str()) != session {
                diagnostics.report(
                    &record.question_id,
                    DiagnosticKind::OtherSession,
                    format!(
                        "record from session {} ignored while scoring session {}",
                        record.session_id,
                        session.unwrap_or_default()
                    ),
                );
                continue;
            }
            if !known.contains(record.question_id.as_str()) {
                diagnostics.report(
                    &record.question_id,
                    DiagnosticKind::UnknownQuestion,
                    "response record refers to a question that was not supplied",
                );
                continue;
            }
            latest.insert(&record.question_id, record);
        }

        questions
            .iter()
            .map(|question| match latest.get(question.id.as_str()) {
                Some(record) => self.evaluator.evaluate(question, record, diagnostics),
                None => EvaluatedResponse::unvisited(question.id.clone()),
            })
            .collect()
    }
}
