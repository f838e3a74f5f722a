//! Grouped statistics for a single participant's evaluated responses.
//!
//! One pass over the responses fills an overall bucket, one bucket per value
//! of each dimension (subject, chapter, topic, difficulty, section), the
//! review-marking tally, the per-question time series, and a time breakdown
//! by outcome. Dimensions are independent of each other.
//!
//! All grouped maps are `BTreeMap`s so repeated runs over the same input
//! serialize identically.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{EvaluatedResponse, ParticipantSummary, Question, ResponseStatus};

/// Accumulator for one group of responses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Bucket {
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub unattempted_count: u32,
    pub total_time_seconds: u64,
    pub marks_obtained: f64,
    pub marks_possible: f64,
}

impl Bucket {
    /// Add one response to the bucket.
    pub fn record(&mut self, question: &Question, response: &EvaluatedResponse) {
        match response.status {
            ResponseStatus::Correct => self.correct_count += 1,
            ResponseStatus::Incorrect => self.incorrect_count += 1,
            ResponseStatus::Unattempted => self.unattempted_count += 1,
        }
        self.total_time_seconds += u64::from(response.time_spent_seconds);
        self.marks_obtained += response.marks_obtained;
        self.marks_possible += possible_marks(question);
    }

    pub fn total_count(&self) -> u32 {
        self.correct_count + self.incorrect_count + self.unattempted_count
    }

    pub fn attempted_count(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }

    /// Correct over attempted; 0 when nothing was attempted.
    pub fn accuracy(&self) -> f64 {
        let attempted = self.attempted_count();
        if attempted == 0 {
            0.0
        } else {
            f64::from(self.correct_count) / f64::from(attempted)
        }
    }

    /// Mean seconds per question; 0 for an empty bucket.
    pub fn average_time_seconds(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            0.0
        } else {
            self.total_time_seconds as f64 / f64::from(total)
        }
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Bucket", 9)?;
        state.serialize_field("correct_count", &self.correct_count)?;
        state.serialize_field("incorrect_count", &self.incorrect_count)?;
        state.serialize_field("unattempted_count", &self.unattempted_count)?;
        state.serialize_field("total_count", &self.total_count())?;
        state.serialize_field("total_time_seconds", &self.total_time_seconds)?;
        state.serialize_field("marks_obtained", &self.marks_obtained)?;
        state.serialize_field("marks_possible", &self.marks_possible)?;
        state.serialize_field("accuracy", &self.accuracy())?;
        state.serialize_field("average_time_seconds", &self.average_time_seconds())?;
        state.end()
    }
}

fn possible_marks(question: &Question) -> f64 {
    if question.positive_marks.is_finite() && question.positive_marks >= 0.0 {
        question.positive_marks
    } else {
        0.0
    }
}

/// A grouping axis for buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Subject,
    Chapter,
    Topic,
    Difficulty,
    Section,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Subject,
        Dimension::Chapter,
        Dimension::Topic,
        Dimension::Difficulty,
        Dimension::Section,
    ];

    /// The question's value along this dimension, if it has one.
    pub fn value_of(self, question: &Question) -> Option<String> {
        let value = match self {
            Dimension::Subject => question.subject.clone(),
            Dimension::Chapter => question.chapter.clone(),
            Dimension::Topic => question.topic.clone(),
            Dimension::Difficulty => question.difficulty.map(|d| d.to_string()),
            Dimension::Section => question.section_id.clone(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Subject => write!(f, "subject"),
            Dimension::Chapter => write!(f, "chapter"),
            Dimension::Topic => write!(f, "topic"),
            Dimension::Difficulty => write!(f, "difficulty"),
            Dimension::Section => write!(f, "section"),
        }
    }
}

/// How review marking lined up with answering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPatterns {
    pub answered_marked: u32,
    pub answered_unmarked: u32,
    pub marked_unanswered: u32,
    pub unmarked_unanswered: u32,
    /// Answered, marked for review, and still wrong.
    pub answered_marked_incorrect: u32,
}

impl ReviewPatterns {
    fn record(&mut self, response: &EvaluatedResponse) {
        match (response.is_answered(), response.is_marked_for_review) {
            (true, true) => {
                self.answered_marked += 1;
                if response.status == ResponseStatus::Incorrect {
                    self.answered_marked_incorrect += 1;
                }
            }
            (true, false) => self.answered_unmarked += 1,
            (false, true) => self.marked_unanswered += 1,
            (false, false) => self.unmarked_unanswered += 1,
        }
    }
}

/// Time spent on one question, in paper order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    pub sequence_index: usize,
    pub question_id: String,
    pub time_spent_seconds: u32,
}

/// Count and total time for one response outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTime {
    pub count: u32,
    pub total_seconds: u64,
}

impl StatusTime {
    pub fn average_seconds(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_seconds as f64 / f64::from(self.count)
        }
    }
}

/// Time split by response outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeBreakdown {
    pub correct: StatusTime,
    pub incorrect: StatusTime,
    pub unattempted: StatusTime,
}

impl TimeBreakdown {
    fn record(&mut self, response: &EvaluatedResponse) {
        let slot = match response.status {
            ResponseStatus::Correct => &mut self.correct,
            ResponseStatus::Incorrect => &mut self.incorrect,
            ResponseStatus::Unattempted => &mut self.unattempted,
        };
        slot.count += 1;
        slot.total_seconds += u64::from(response.time_spent_seconds);
    }
}

/// Accuracy band of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStrength {
    Strength,
    Moderate,
    Weakness,
}

impl fmt::Display for ChapterStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChapterStrength::Strength => write!(f, "strength"),
            ChapterStrength::Moderate => write!(f, "moderate"),
            ChapterStrength::Weakness => write!(f, "weakness"),
        }
    }
}

/// A chapter with its accuracy band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterInsight {
    pub chapter: String,
    pub accuracy: f64,
    pub classification: ChapterStrength,
}

/// Everything the aggregation pass produces for one participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub overall: Bucket,
    pub by_subject: BTreeMap<String, Bucket>,
    pub by_chapter: BTreeMap<String, Bucket>,
    pub by_topic: BTreeMap<String, Bucket>,
    pub by_difficulty: BTreeMap<String, Bucket>,
    pub by_section: BTreeMap<String, Bucket>,
    pub review: ReviewPatterns,
    pub time_series: Vec<TimePoint>,
    pub time_breakdown: TimeBreakdown,
    /// Weakest chapters first.
    pub chapter_insights: Vec<ChapterInsight>,
}

impl Aggregation {
    /// Buckets for one dimension.
    pub fn buckets(&self, dimension: Dimension) -> &BTreeMap<String, Bucket> {
        match dimension {
            Dimension::Subject => &self.by_subject,
            Dimension::Chapter => &self.by_chapter,
            Dimension::Topic => &self.by_topic,
            Dimension::Difficulty => &self.by_difficulty,
            Dimension::Section => &self.by_section,
        }
    }

    fn buckets_mut(&mut self, dimension: Dimension) -> &mut BTreeMap<String, Bucket> {
        match dimension {
            Dimension::Subject => &mut self.by_subject,
            Dimension::Chapter => &mut self.by_chapter,
            Dimension::Topic => &mut self.by_topic,
            Dimension::Difficulty => &mut self.by_difficulty,
            Dimension::Section => &mut self.by_section,
        }
    }

    /// Headline summary built from the overall bucket.
    pub fn participant_summary(&self, participant_id: &str) -> ParticipantSummary {
        let overall = &self.overall;
        ParticipantSummary {
            participant_id: participant_id.to_string(),
            obtained_marks: overall.marks_obtained,
            max_possible_marks: overall.marks_possible,
            correct_count: overall.correct_count,
            incorrect_count: overall.incorrect_count,
            unattempted_count: overall.unattempted_count,
            total_questions: overall.total_count(),
            accuracy: overall.accuracy(),
            time_spent_minutes: overall.total_time_seconds as f64 / 60.0,
        }
    }
}

/// Builds an [`Aggregation`] from evaluated responses.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    strength_threshold: f64,
    weakness_threshold: f64,
    unclassified_label: String,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl AggregationEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            strength_threshold: config.strength_threshold,
            weakness_threshold: config.weakness_threshold,
            unclassified_label: config.unclassified_label.clone(),
        }
    }

    /// Aggregate one participant's responses.
    ///
    /// `responses` are visited in the order given, which should be paper
    /// order; the time series follows it. Responses whose question is not in
    /// `questions` are skipped with an `unknown_question` diagnostic.
    pub fn aggregate(
        &self,
        questions: &[Question],
        responses: &[EvaluatedResponse],
        diagnostics: &mut Diagnostics,
    ) -> Aggregation {
        let by_id: HashMap<&str, &Question> =
            questions.iter().map(|q| (q.id.as_str(), q)).collect();

        let mut aggregation = Aggregation::default();

        for response in responses {
            let Some(question) = by_id.get(response.question_id.as_str()) else {
                diagnostics.report(
                    &response.question_id,
                    DiagnosticKind::UnknownQuestion,
                    "evaluated response refers to a question that was not supplied",
                );
                continue;
            };

            aggregation.overall.record(question, response);
            for dimension in Dimension::ALL {
                let key = dimension
                    .value_of(question)
                    .unwrap_or_else(|| self.unclassified_label.clone());
                aggregation
                    .buckets_mut(dimension)
                    .entry(key)
                    .or_default()
                    .record(question, response);
            }

            aggregation.review.record(response);
            aggregation.time_breakdown.record(response);
            aggregation.time_series.push(TimePoint {
                sequence_index: aggregation.time_series.len(),
                question_id: response.question_id.clone(),
                time_spent_seconds: response.time_spent_seconds,
            });
        }

        aggregation.chapter_insights = self.chapter_insights(&aggregation.by_chapter);

        tracing::debug!(
            responses = responses.len(),
            subjects = aggregation.by_subject.len(),
            chapters = aggregation.by_chapter.len(),
            "aggregated responses"
        );

        aggregation
    }

    /// Band an accuracy value into strength, moderate, or weakness.
    pub fn classify(&self, accuracy: f64) -> ChapterStrength {
        if accuracy >= self.strength_threshold {
            ChapterStrength::Strength
        } else if accuracy >= self.weakness_threshold {
            ChapterStrength::Moderate
        } else {
            ChapterStrength::Weakness
        }
    }

    fn chapter_insights(&self, chapters: &BTreeMap<String, Bucket>) -> Vec<ChapterInsight> {
        let mut insights: Vec<ChapterInsight> = chapters
            .iter()
            .map(|(chapter, bucket)| {
                let accuracy = bucket.accuracy();
                ChapterInsight {
                    chapter: chapter.clone(),
                    accuracy,
                    classification: self.classify(accuracy),
                }
            })
            .collect();
        // BTreeMap iteration already orders by name, so a stable sort keeps
        // equal accuracies alphabetical.
        insights.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
        insights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuestionKind};
    use std::collections::BTreeSet;

    fn question(id: &str, subject: &str, chapter: Option<&str>, difficulty: Difficulty) -> Question {
        Question {
            id: id.into(),
            kind: QuestionKind::SingleChoice {
                correct_option_labels: BTreeSet::from(["A".to_string()]),
            },
            positive_marks: 4.0,
            negative_marks: 1.0,
            subject: Some(subject.into()),
            chapter: chapter.map(Into::into),
            topic: None,
            difficulty: Some(difficulty),
            section_id: Some("S1".into()),
        }
    }

    fn response(id: &str, status: ResponseStatus, marked: bool, time: u32) -> EvaluatedResponse {
        let marks_obtained = match status {
            ResponseStatus::Correct => 4.0,
            ResponseStatus::Incorrect => -1.0,
            ResponseStatus::Unattempted => 0.0,
        };
        EvaluatedResponse {
            question_id: id.into(),
            is_correct: status == ResponseStatus::Correct,
            marks_obtained,
            status,
            is_marked_for_review: marked,
            time_spent_seconds: time,
        }
    }

    fn fixture() -> (Vec<Question>, Vec<EvaluatedResponse>) {
        let questions = vec![
            question("q1", "Physics", Some("Optics"), Difficulty::Easy),
            question("q2", "Physics", Some("Optics"), Difficulty::Hard),
            question("q3", "Physics", None, Difficulty::Medium),
            question("q4", "Chemistry", Some("Bonding"), Difficulty::Easy),
            question("q5", "Chemistry", Some("Bonding"), Difficulty::Hard),
        ];
        let responses = vec![
            response("q1", ResponseStatus::Correct, false, 30),
            response("q2", ResponseStatus::Incorrect, true, 90),
            response("q3", ResponseStatus::Unattempted, true, 10),
            response("q4", ResponseStatus::Correct, true, 40),
            response("q5", ResponseStatus::Unattempted, false, 0),
        ];
        (questions, responses)
    }

    fn aggregate(questions: &[Question], responses: &[EvaluatedResponse]) -> Aggregation {
        AggregationEngine::default().aggregate(questions, responses, &mut Diagnostics::new())
    }

    #[test]
    fn overall_bucket_totals() {
        let (questions, responses) = fixture();
        let agg = aggregate(&questions, &responses);
        let overall = &agg.overall;
        assert_eq!(overall.correct_count, 2);
        assert_eq!(overall.incorrect_count, 1);
        assert_eq!(overall.unattempted_count, 2);
        assert_eq!(overall.total_count(), 5);
        assert_eq!(overall.total_time_seconds, 170);
        assert_eq!(overall.marks_obtained, 7.0);
        assert_eq!(overall.marks_possible, 20.0);
        assert!((overall.accuracy() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(overall.average_time_seconds(), 34.0);
    }

    #[test]
    fn dimension_buckets_are_independent() {
        let (questions, responses) = fixture();
        let agg = aggregate(&questions, &responses);

        assert_eq!(agg.by_subject["Physics"].total_count(), 3);
        assert_eq!(agg.by_subject["Chemistry"].total_count(), 2);
        assert_eq!(agg.by_difficulty["easy"].correct_count, 2);
        assert_eq!(agg.by_difficulty["hard"].total_count(), 2);
        assert_eq!(agg.by_section["S1"].total_count(), 5);
        // q3 has no chapter but still counts everywhere else.
        assert_eq!(agg.by_chapter["unclassified"].unattempted_count, 1);
        assert_eq!(agg.by_chapter["Optics"].total_count(), 2);
        assert_eq!(agg.by_topic["unclassified"].total_count(), 5);
    }

    #[test]
    fn bucket_counts_sum_to_total() {
        let (questions, responses) = fixture();
        let agg = aggregate(&questions, &responses);
        for dimension in Dimension::ALL {
            let buckets = agg.buckets(dimension);
            let sum: u32 = buckets.values().map(Bucket::total_count).sum();
            assert_eq!(sum, 5, "dimension {dimension}");
            for bucket in buckets.values() {
                assert_eq!(
                    bucket.correct_count + bucket.incorrect_count + bucket.unattempted_count,
                    bucket.total_count()
                );
                assert!((0.0..=1.0).contains(&bucket.accuracy()));
            }
        }
    }

    #[test]
    fn review_patterns() {
        let (questions, responses) = fixture();
        let review = aggregate(&questions, &responses).review;
        assert_eq!(
            review,
            ReviewPatterns {
                answered_marked: 2,
                answered_unmarked: 1,
                marked_unanswered: 1,
                unmarked_unanswered: 1,
                answered_marked_incorrect: 1,
            }
        );
    }

    #[test]
    fn time_series_follows_input_order() {
        let (questions, responses) = fixture();
        let series = aggregate(&questions, &responses).time_series;
        let points: Vec<_> = series
            .iter()
            .map(|p| (p.sequence_index, p.question_id.as_str(), p.time_spent_seconds))
            .collect();
        assert_eq!(
            points,
            vec![
                (0, "q1", 30),
                (1, "q2", 90),
                (2, "q3", 10),
                (3, "q4", 40),
                (4, "q5", 0)
            ]
        );
    }

    #[test]
    fn time_breakdown_by_status() {
        let (questions, responses) = fixture();
        let breakdown = aggregate(&questions, &responses).time_breakdown;
        assert_eq!(breakdown.correct.count, 2);
        assert_eq!(breakdown.correct.average_seconds(), 35.0);
        assert_eq!(breakdown.incorrect.total_seconds, 90);
        assert_eq!(breakdown.unattempted.average_seconds(), 5.0);
    }

    #[test]
    fn chapter_classification_thresholds() {
        let engine = AggregationEngine::default();
        assert_eq!(engine.classify(0.70), ChapterStrength::Strength);
        assert_eq!(engine.classify(0.6999), ChapterStrength::Moderate);
        assert_eq!(engine.classify(0.40), ChapterStrength::Moderate);
        assert_eq!(engine.classify(0.3999), ChapterStrength::Weakness);
        assert_eq!(engine.classify(0.0), ChapterStrength::Weakness);

        let strict = AggregationEngine::new(&EngineConfig {
            strength_threshold: 0.9,
            ..Default::default()
        });
        assert_eq!(strict.classify(0.8), ChapterStrength::Moderate);
    }

    #[test]
    fn chapter_insights_weakest_first() {
        let (questions, responses) = fixture();
        let insights = aggregate(&questions, &responses).chapter_insights;
        let rows: Vec<_> = insights
            .iter()
            .map(|i| (i.chapter.as_str(), i.classification))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("unclassified", ChapterStrength::Weakness),
                ("Optics", ChapterStrength::Moderate),
                ("Bonding", ChapterStrength::Strength),
            ]
        );
    }

    #[test]
    fn unknown_questions_are_skipped_with_diagnostic() {
        let (questions, mut responses) = fixture();
        responses.push(response("ghost", ResponseStatus::Correct, false, 5));
        let mut diagnostics = Diagnostics::new();
        let agg = AggregationEngine::default().aggregate(&questions, &responses, &mut diagnostics);
        assert_eq!(agg.overall.total_count(), 5);
        assert_eq!(
            diagnostics.into_vec()[0].kind,
            DiagnosticKind::UnknownQuestion
        );
    }

    #[test]
    fn empty_input_gives_zeroed_output() {
        let agg = aggregate(&[], &[]);
        assert_eq!(agg.overall.total_count(), 0);
        assert_eq!(agg.overall.accuracy(), 0.0);
        assert_eq!(agg.overall.average_time_seconds(), 0.0);
        assert!(agg.by_subject.is_empty());
        assert!(agg.time_series.is_empty());
        assert!(agg.chapter_insights.is_empty());
    }

    #[test]
    fn rerun_is_identical() {
        let (questions, responses) = fixture();
        let first = serde_json::to_string(&aggregate(&questions, &responses)).unwrap();
        let second = serde_json::to_string(&aggregate(&questions, &responses)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn participant_summary_from_overall() {
        let (questions, responses) = fixture();
        let summary = aggregate(&questions, &responses).participant_summary("p1");
        assert_eq!(summary.participant_id, "p1");
        assert_eq!(summary.obtained_marks, 7.0);
        assert_eq!(summary.max_possible_marks, 20.0);
        assert_eq!(summary.total_questions, 5);
        assert!((summary.time_spent_minutes - 170.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn bucket_serializes_derived_fields() {
        let mut bucket = Bucket::default();
        let q = question("q1", "Physics", None, Difficulty::Easy);
        bucket.record(&q, &response("q1", ResponseStatus::Correct, false, 12));
        let value = serde_json::to_value(&bucket).unwrap();
        assert_eq!(value["accuracy"], 1.0);
        assert_eq!(value["total_count"], 1);
        let back: Bucket = serde_json::from_value(value).unwrap();
        assert_eq!(back, bucket);
    }
}
