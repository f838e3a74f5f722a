//! Session reports with JSON persistence and progress comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::SessionResult;

/// A scored session, stamped for storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Question bank the session was scored against.
    pub exam_id: String,
    /// The scoring output.
    pub result: SessionResult,
}

impl SessionReport {
    /// Wrap a session result with a fresh id and timestamp.
    pub fn new(exam_id: impl Into<String>, result: SessionResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            exam_id: exam_id.into(),
            result,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.result.summary.participant_id
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare per-subject accuracy against a baseline report.
    ///
    /// Subjects whose accuracy moved by more than `threshold` (a fraction)
    /// are listed as regressions or improvements.
    pub fn compare(&self, baseline: &SessionReport, threshold: f64) -> ProgressReport {
        let accuracy_map = |report: &SessionReport| -> BTreeMap<String, f64> {
            report
                .result
                .aggregation
                .by_subject
                .iter()
                .map(|(subject, bucket)| (subject.clone(), bucket.accuracy()))
                .collect()
        };

        let baseline_scores = accuracy_map(baseline);
        let current_scores = accuracy_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_subjects = 0usize;

        for (subject, &current) in &current_scores {
            if let Some(&baseline_val) = baseline_scores.get(subject) {
                let delta = current - baseline_val;
                let change = SubjectChange {
                    subject: subject.clone(),
                    baseline_accuracy: baseline_val,
                    current_accuracy: current,
                    delta,
                };
                if delta < -threshold {
                    regressions.push(change);
                } else if delta > threshold {
                    improvements.push(change);
                } else {
                    unchanged += 1;
                }
            } else {
                new_subjects += 1;
            }
        }

        let removed_subjects = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        ProgressReport {
            baseline_marks: baseline.result.summary.obtained_marks,
            current_marks: self.result.summary.obtained_marks,
            regressions,
            improvements,
            unchanged,
            new_subjects,
            removed_subjects,
        }
    }
}

/// Result of comparing two session reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_marks: f64,
    pub current_marks: f64,
    /// Subjects where accuracy went down.
    pub regressions: Vec<SubjectChange>,
    /// Subjects where accuracy went up.
    pub improvements: Vec<SubjectChange>,
    /// Subjects with no significant change.
    pub unchanged: usize,
    /// Subjects in current but not baseline.
    pub new_subjects: usize,
    /// Subjects in baseline but not current.
    pub removed_subjects: usize,
}

/// Accuracy movement in one subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectChange {
    pub subject: String,
    pub baseline_accuracy: f64,
    pub current_accuracy: f64,
    pub delta: f64,
}

impl ProgressReport {
    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Marks:** {:.2} -> {:.2}\n\n**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.baseline_marks,
            self.current_marks,
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Subject | Baseline | Current | Delta |\n");
            md.push_str("|---------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.subject,
                    c.baseline_accuracy * 100.0,
                    c.current_accuracy * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if any subject regressed.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScoringEngine;
    use crate::model::{Question, QuestionKind, ResponseRecord};
    use std::collections::BTreeSet;

    fn question(id: &str, subject: &str) -> Question {
        Question {
            id: id.into(),
            kind: QuestionKind::SingleChoice {
                correct_option_labels: BTreeSet::from(["A".to_string()]),
            },
            positive_marks: 4.0,
            negative_marks: 1.0,
            subject: Some(subject.into()),
            chapter: None,
            topic: None,
            difficulty: None,
            section_id: None,
        }
    }

    fn answer(id: &str, label: &str) -> ResponseRecord {
        ResponseRecord {
            question_id: id.into(),
            participant_id: "u1".into(),
            session_id: "s".into(),
            visit_sequence: 1,
            is_answered: true,
            selected_option_labels: BTreeSet::from([label.to_string()]),
            numerical_value: None,
            time_spent_seconds: 20,
            is_marked_for_review: false,
        }
    }

    fn make_report(questions: &[Question], answers: &[(&str, &str)]) -> SessionReport {
        let records: Vec<_> = answers.iter().map(|(id, l)| answer(id, l)).collect();
        let result = ScoringEngine::default().summarize_session("u1", questions, &records);
        SessionReport::new("mock", result)
    }

    fn paper() -> Vec<Question> {
        vec![question("p1", "Physics"), question("c1", "Chemistry")]
    }

    #[test]
    fn same_answers_show_no_movement() {
        let baseline = make_report(&paper(), &[("p1", "A"), ("c1", "A")]);
        let current = make_report(&paper(), &[("p1", "A"), ("c1", "A")]);
        let progress = current.compare(&baseline, 0.05);
        assert!(progress.regressions.is_empty());
        assert!(progress.improvements.is_empty());
        assert_eq!(progress.unchanged, 2);
    }

    #[test]
    fn compare_with_regression_and_improvement() {
        let baseline = make_report(&paper(), &[("p1", "A"), ("c1", "B")]);
        let current = make_report(&paper(), &[("p1", "B"), ("c1", "A")]);
        let progress = current.compare(&baseline, 0.05);
        assert_eq!(progress.regressions.len(), 1);
        assert_eq!(progress.regressions[0].subject, "Physics");
        assert_eq!(progress.improvements[0].subject, "Chemistry");
        assert!(progress.has_regressions());
        assert_eq!(progress.baseline_marks, progress.current_marks);
    }

    #[test]
    fn subjects_added_and_dropped_are_counted() {
        let baseline = make_report(&[question("p1", "Physics")], &[("p1", "A")]);
        let current = make_report(&[question("b1", "Biology")], &[("b1", "A")]);
        let progress = current.compare(&baseline, 0.05);
        assert_eq!(progress.new_subjects, 1);
        assert_eq!(progress.removed_subjects, 1);
    }

    #[test]
    fn saved_report_loads_back() {
        let report = make_report(&paper(), &[("p1", "A")]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = SessionReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.participant_id(), "u1");
        assert_eq!(loaded.result, report.result);
    }

    #[test]
    fn markdown_lists_only_nonempty_sections() {
        let baseline = make_report(&paper(), &[("p1", "A")]);
        let current = make_report(&paper(), &[("p1", "C")]);
        let md = current.compare(&baseline, 0.05).to_markdown();
        assert!(md.contains("Regressions"));
        assert!(md.contains("Physics"));
        assert!(!md.contains("### Improvements"));
    }
}
