//! Last-write-wins reduction of noisy input records.
//!
//! Response logs hold one record per visit and attempt logs hold one record
//! per submission. These helpers pick the single authoritative record in
//! each group without touching their inputs.

use std::collections::HashMap;

use crate::model::{AttemptRecord, ResponseRecord};

/// Reduce a response log to one record per `(session_id, question_id)`.
///
/// Visit sequences are numbered per session, so records from different
/// sessions never replace each other. Within a group the record with the
/// highest `visit_sequence` wins, and on equal sequences the record that
/// appears later in the input wins. Output order follows the first
/// appearance of each group in the input.
pub fn latest_responses<'a>(
    records: impl IntoIterator<Item = &'a ResponseRecord>,
) -> Vec<&'a ResponseRecord> {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut latest: HashMap<(&str, &str), &ResponseRecord> = HashMap::new();

    for record in records {
        let key = (record.session_id.as_str(), record.question_id.as_str());
        match latest.get(&key) {
            Some(current) if current.visit_sequence > record.visit_sequence => {}
            Some(_) => {
                latest.insert(key, record);
            }
            None => {
                order.push(key);
                latest.insert(key, record);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| latest.get(&key).copied())
        .collect()
}

/// The session a mixed log is scored as: the one its last record belongs to.
pub fn current_session<'a>(
    records: impl IntoIterator<Item = &'a ResponseRecord>,
) -> Option<&'a str> {
    records.into_iter().last().map(|r| r.session_id.as_str())
}

/// Pick the most recent attempt from one participant's attempts at a contest.
///
/// On equal `created_at` the attempt that appears later in the input wins.
pub fn latest_attempt(attempts: &[AttemptRecord]) -> Option<&AttemptRecord> {
    newest(attempts.iter())
}

fn newest<'a>(attempts: impl Iterator<Item = &'a AttemptRecord>) -> Option<&'a AttemptRecord> {
    attempts.fold(None, |best, attempt| match best {
        Some(current) if current.created_at > attempt.created_at => Some(current),
        _ => Some(attempt),
    })
}

/// Reduce a contest's attempt log to the latest attempt per participant.
///
/// Attempts belonging to other contests are ignored. Output order follows
/// the first appearance of each participant in the input.
pub fn latest_attempts_per_participant<'a>(
    contest_id: &str,
    attempts: &'a [AttemptRecord],
) -> Vec<&'a AttemptRecord> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, Vec<&AttemptRecord>> = HashMap::new();

    for attempt in attempts.iter().filter(|a| a.contest_id == contest_id) {
        let group = grouped
            .entry(attempt.participant_id.as_str())
            .or_insert_with(|| {
                order.push(&attempt.participant_id);
                Vec::new()
            });
        group.push(attempt);
    }

    order
        .into_iter()
        .filter_map(|participant_id| {
            grouped
                .get(participant_id)
                .and_then(|group| newest(group.iter().copied()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttemptPayload, ParticipantSummary};
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn visit(question_id: &str, sequence: u64, label: &str) -> ResponseRecord {
        ResponseRecord {
            question_id: question_id.into(),
            participant_id: "p1".into(),
            session_id: "s1".into(),
            visit_sequence: sequence,
            is_answered: true,
            selected_option_labels: BTreeSet::from([label.to_string()]),
            numerical_value: None,
            time_spent_seconds: 10,
            is_marked_for_review: false,
        }
    }

    fn attempt(participant: &str, contest: &str, minute: u32, marks: f64) -> AttemptRecord {
        AttemptRecord {
            attempt_id: Uuid::new_v4(),
            participant_id: participant.into(),
            contest_id: contest.into(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
            payload: AttemptPayload::Summary(ParticipantSummary {
                participant_id: participant.into(),
                obtained_marks: marks,
                max_possible_marks: 100.0,
                correct_count: 0,
                incorrect_count: 0,
                unattempted_count: 0,
                total_questions: 0,
                accuracy: 0.0,
                time_spent_minutes: 0.0,
            }),
        }
    }

    fn marks_of(attempt: &AttemptRecord) -> f64 {
        match &attempt.payload {
            AttemptPayload::Summary(s) => s.obtained_marks,
            AttemptPayload::Responses(_) => unreachable!(),
        }
    }

    #[test]
    fn highest_visit_sequence_wins() {
        let records = vec![visit("q1", 1, "A"), visit("q1", 3, "C"), visit("q1", 2, "B")];
        let latest = latest_responses(&records);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].visit_sequence, 3);
        assert!(latest[0].selected_option_labels.contains("C"));
    }

    #[test]
    fn equal_sequence_prefers_later_record() {
        let records = vec![visit("q1", 2, "A"), visit("q1", 2, "B")];
        let latest = latest_responses(&records);
        assert!(latest[0].selected_option_labels.contains("B"));
    }

    #[test]
    fn keeps_first_appearance_order() {
        let records = vec![
            visit("q2", 1, "A"),
            visit("q1", 1, "A"),
            visit("q2", 2, "B"),
            visit("q3", 1, "D"),
        ];
        let ids: Vec<_> = latest_responses(&records)
            .iter()
            .map(|r| r.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["q2", "q1", "q3"]);
    }

    #[test]
    fn sessions_are_reduced_separately() {
        let first = ResponseRecord {
            session_id: "s1".into(),
            ..visit("q1", 5, "A")
        };
        let second = ResponseRecord {
            session_id: "s2".into(),
            ..visit("q1", 1, "B")
        };
        let records = vec![first, second];
        let sessions: Vec<_> = latest_responses(&records)
            .iter()
            .map(|r| (r.session_id.as_str(), r.visit_sequence))
            .collect();
        assert_eq!(sessions, vec![("s1", 5), ("s2", 1)]);
        assert_eq!(current_session(&records), Some("s2"));
    }

    #[test]
    fn empty_inputs_yield_empty_outputs() {
        let none: Vec<ResponseRecord> = Vec::new();
        assert!(current_session(&none).is_none());
        assert!(latest_responses(&none).is_empty());
        assert!(latest_attempt(&[]).is_none());
        assert!(latest_attempts_per_participant("c1", &[]).is_empty());
    }

    #[test]
    fn later_attempt_wins() {
        let attempts = vec![attempt("p1", "c1", 30, 80.0), attempt("p1", "c1", 5, 95.0)];
        let latest = latest_attempt(&attempts).unwrap();
        assert_eq!(marks_of(latest), 80.0);
    }

    #[test]
    fn per_participant_reduction_filters_contest() {
        let attempts = vec![
            attempt("p1", "c1", 1, 10.0),
            attempt("p2", "c1", 2, 20.0),
            attempt("p1", "c1", 3, 30.0),
            attempt("p1", "c2", 9, 99.0),
        ];
        let latest = latest_attempts_per_participant("c1", &attempts);
        let summary: Vec<_> = latest
            .iter()
            .map(|a| (a.participant_id.as_str(), marks_of(a)))
            .collect();
        assert_eq!(summary, vec![("p1", 30.0), ("p2", 20.0)]);
    }

    #[test]
    fn inputs_are_untouched() {
        let records = vec![visit("q1", 2, "A"), visit("q1", 1, "B")];
        let before = records.clone();
        let _ = latest_responses(&records);
        assert_eq!(records, before);
    }
}
