//! Contest leaderboard ranking.
//!
//! Participants are ordered by marks (desc), then accuracy (desc), then time
//! (asc). Ranks are dense over that order, but rank equality only looks at
//! marks and accuracy: two participants level on both share a rank even when
//! one finished faster, and the faster one is still listed first.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{LeaderboardEntry, ParticipantSummary};

/// A ranked contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub contest_id: String,
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a participant's entry.
    pub fn entry_for(&self, participant_id: &str) -> Option<&LeaderboardEntry> {
        self.entries
            .iter()
            .find(|e| e.summary.participant_id == participant_id)
    }
}

/// Ranks participant summaries for a contest.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rank one summary per participant.
    ///
    /// Summaries must already be reduced to the latest attempt per
    /// participant; a repeated participant id is rejected, as is a NaN or
    /// infinite marks, accuracy, or time value.
    pub fn rank(
        &self,
        contest_id: &str,
        summaries: Vec<ParticipantSummary>,
    ) -> Result<Leaderboard, EngineError> {
        let mut seen = HashSet::new();
        for summary in &summaries {
            if !seen.insert(summary.participant_id.as_str()) {
                return Err(EngineError::DuplicateParticipant {
                    contest_id: contest_id.to_string(),
                    participant_id: summary.participant_id.clone(),
                });
            }
            check_finite(summary)?;
        }

        let mut sorted = summaries;
        sorted.sort_by(compare_standing);

        let n = sorted.len();
        let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(n);
        for (position, summary) in sorted.into_iter().enumerate() {
            let rank = match entries.last() {
                Some(previous) if shares_rank(&previous.summary, &summary) => previous.rank,
                _ => position as u32 + 1,
            };
            entries.push(LeaderboardEntry {
                percentile: percentile(rank, n),
                rank,
                summary,
            });
        }

        tracing::debug!(contest_id, participants = n, "ranked contest");

        Ok(Leaderboard {
            contest_id: contest_id.to_string(),
            entries,
        })
    }
}

/// Standing order: better participants compare as `Less`.
///
/// Keys compare with the same notion of equality as [`shares_rank`], so
/// `-0.0` and `0.0` marks tie and fall through to accuracy.
pub fn compare_standing(a: &ParticipantSummary, b: &ParticipantSummary) -> Ordering {
    key(b.obtained_marks)
        .total_cmp(&key(a.obtained_marks))
        .then_with(|| key(b.accuracy).total_cmp(&key(a.accuracy)))
        .then_with(|| key(a.time_spent_minutes).total_cmp(&key(b.time_spent_minutes)))
}

/// Folds `-0.0` into `0.0`; `total_cmp` would otherwise order them apart.
fn key(value: f64) -> f64 {
    value + 0.0
}

/// Whether `current` takes the same rank as the participant listed above it.
/// Time only orders the list; it never splits a rank.
fn shares_rank(previous: &ParticipantSummary, current: &ParticipantSummary) -> bool {
    previous.obtained_marks == current.obtained_marks && previous.accuracy == current.accuracy
}

/// `(N - rank) / (N - 1) * 100`, or 100 for a single participant.
pub fn percentile(rank: u32, participants: usize) -> f64 {
    if participants <= 1 {
        return 100.0;
    }
    let n = participants as f64;
    ((n - f64::from(rank)) / (n - 1.0)) * 100.0
}

fn check_finite(summary: &ParticipantSummary) -> Result<(), EngineError> {
    let fields = [
        ("obtained_marks", summary.obtained_marks),
        ("accuracy", summary.accuracy),
        ("time_spent_minutes", summary.time_spent_minutes),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(EngineError::NonFiniteScore {
                participant_id: summary.participant_id.clone(),
                field,
            });
        }
    }
    Ok(())
}
