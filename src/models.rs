//! Data models for the survey analytics engine.
//!
//! This module contains all the core data structures used throughout
//! the application: the wire shape of submissions, canonical response
//! records, and the derived aggregate/chart types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Number of multiple-choice questions in the survey.
pub const QUESTION_COUNT: usize = 10;

/// Submittable age window; the age aggregate is restricted to it as well.
pub const TARGET_AGE_RANGE: RangeInclusive<u32> = 18..=35;

/// Sentiment derived for one respondent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "Positivo")]
    Positive,
    #[serde(rename = "Neutro")]
    Neutral,
    #[serde(rename = "Negativo")]
    Negative,
}

impl Sentiment {
    /// All sentiments in display order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// Label used in tables and charts.
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positivo",
            Sentiment::Neutral => "Neutro",
            Sentiment::Negative => "Negativo",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One selected option for a survey question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOption {
    A,
    B,
    C,
    /// The question was skipped or the stored value is not `a`/`b`/`c`.
    Unanswered,
}

impl AnswerOption {
    /// Parse a stored option value. Anything outside `a`/`b`/`c` is unanswered.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" => AnswerOption::A,
            "b" => AnswerOption::B,
            "c" => AnswerOption::C,
            _ => AnswerOption::Unanswered,
        }
    }

    /// Letter shown in tables, `-` for unanswered.
    #[allow(dead_code)] // Display helper for tabular consumers
    pub fn letter(&self) -> &'static str {
        match self {
            AnswerOption::A => "a",
            AnswerOption::B => "b",
            AnswerOption::C => "c",
            AnswerOption::Unanswered => "-",
        }
    }
}

/// One submission as the survey form stores it (wire shape).
///
/// The form also writes `clasificaciones` and `clasificacionFinal`; those are
/// deliberately not deserialized. Sentiment is always re-derived from the
/// answers, so a stale stored classification can never leak into the output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmission {
    /// The form fields, nested under `respuestas` by the submission page.
    #[serde(default, rename = "respuestas")]
    pub fields: RawFields,
    /// Submission timestamp string written by the form.
    #[serde(default, rename = "fecha")]
    pub submitted_at: Option<String>,
}

/// The demographic and answer fields of one submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFields {
    #[serde(default, rename = "nombre")]
    pub name: Option<String>,
    /// Arrives as a JSON string or number depending on the client.
    #[serde(default, rename = "edad")]
    pub age: Option<serde_json::Value>,
    #[serde(default, rename = "carrera")]
    pub division: Option<String>,
    #[serde(default, rename = "genero")]
    pub gender: Option<String>,
    /// Remaining keys; the ten answers arrive as `pregunta1`..`pregunta10`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A complete point-in-time dataset: opaque submission ids to payloads.
///
/// `BTreeMap` keeps the ids sorted, which matches the chronological order of
/// the push ids the submission workflow generates.
pub type Snapshot = BTreeMap<String, RawSubmission>;

/// One normalized, classified survey response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalResponse {
    /// 1-based position in snapshot order; stable for a given snapshot.
    pub id: usize,
    pub name: String,
    /// Age in years; `None` when absent or not parseable as an integer.
    pub age: Option<u32>,
    pub division: String,
    pub gender: String,
    /// Answers to questions 1..=10, in question order.
    pub answers: [AnswerOption; QUESTION_COUNT],
    pub sentiment: Sentiment,
    /// Submission timestamp as recorded by the form, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
}

impl CanonicalResponse {
    /// Age column value for tabular display.
    pub fn age_label(&self) -> String {
        match self.age {
            Some(age) => age.to_string(),
            None => "unknown".to_string(),
        }
    }
}

/// Percentage of `count` over `total`, rounded to one decimal.
///
/// A zero total yields `0.0` rather than a division fault.
pub fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

/// One dimension value with its count and share of the aggregate total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: u64,
    /// Share of the aggregate total, rounded to one decimal.
    pub percentage: f64,
}

impl Bucket {
    pub fn new(label: impl Into<String>, count: u64, total: u64) -> Self {
        Self {
            label: label.into(),
            count,
            percentage: percent(count, total),
        }
    }
}

/// Counts and percentages of responses grouped along one dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Aggregate {
    /// Denominator of the percentages: the total counted in this aggregate.
    pub total: u64,
    pub buckets: Vec<Bucket>,
}

/// Per-question counts of each selected option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QuestionTally {
    /// Question number, 1-based.
    pub question: usize,
    pub a: u64,
    pub b: u64,
    pub c: u64,
}

impl QuestionTally {
    /// Number of respondents who picked any option for this question.
    pub fn answered(&self) -> u64 {
        self.a + self.b + self.c
    }

    /// Share of one option among the answered, rounded to one decimal.
    pub fn share(&self, option: AnswerOption) -> f64 {
        let count = match option {
            AnswerOption::A => self.a,
            AnswerOption::B => self.b,
            AnswerOption::C => self.c,
            AnswerOption::Unanswered => return 0.0,
        };
        percent(count, self.answered())
    }
}

/// The five aggregates recomputed on every snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSet {
    pub division: Aggregate,
    pub age: Aggregate,
    pub gender: Aggregate,
    pub sentiment: Aggregate,
    pub questions: Vec<QuestionTally>,
}

/// One ordered numeric series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub values: Vec<f64>,
}

/// Ordered labels plus one or more series, independent of any renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

/// Chart-ready data for every dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub division: ChartData,
    pub age: ChartData,
    pub gender: ChartData,
    pub sentiment: ChartData,
    pub questions: ChartData,
}

impl ChartSet {
    /// Charts by name, in dashboard order.
    #[allow(dead_code)] // Lookup for rendering collaborators
    pub fn named(&self) -> [(&'static str, &ChartData); 5] {
        [
            ("division", &self.division),
            ("age", &self.age),
            ("gender", &self.gender),
            ("sentiment", &self.sentiment),
            ("questions", &self.questions),
        ]
    }
}

/// A fully-formed analysis result derived from one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardFrame {
    /// Sequence number of the snapshot this frame was derived from.
    pub seq: u64,
    pub generated_at: DateTime<Utc>,
    pub responses: Vec<CanonicalResponse>,
    pub aggregates: AggregateSet,
    pub charts: ChartSet,
}

impl DashboardFrame {
    pub fn respondent_count(&self) -> usize {
        self.responses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_labels() {
        assert_eq!(Sentiment::Positive.label(), "Positivo");
        assert_eq!(Sentiment::Neutral.label(), "Neutro");
        assert_eq!(Sentiment::Negative.label(), "Negativo");
        assert_eq!(Sentiment::Positive.to_string(), "Positivo");
    }

    #[test]
    fn test_answer_option_parse() {
        assert_eq!(AnswerOption::parse("a"), AnswerOption::A);
        assert_eq!(AnswerOption::parse(" B "), AnswerOption::B);
        assert_eq!(AnswerOption::parse("c"), AnswerOption::C);
        assert_eq!(AnswerOption::parse("d"), AnswerOption::Unanswered);
        assert_eq!(AnswerOption::parse(""), AnswerOption::Unanswered);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(1, 1), 100.0);
        assert_eq!(percent(0, 7), 0.0);
    }

    #[test]
    fn test_percent_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(5, 0), 0.0);
    }

    #[test]
    fn test_question_tally_share() {
        let tally = QuestionTally {
            question: 1,
            a: 2,
            b: 1,
            c: 0,
        };
        assert_eq!(tally.answered(), 3);
        assert_eq!(tally.share(AnswerOption::A), 66.7);
        assert_eq!(tally.share(AnswerOption::B), 33.3);
        assert_eq!(tally.share(AnswerOption::C), 0.0);
        assert_eq!(tally.share(AnswerOption::Unanswered), 0.0);
    }

    #[test]
    fn test_raw_submission_wire_shape() {
        let json = r#"{
            "respuestas": {
                "nombre": "Ana",
                "edad": "22",
                "carrera": "Mecatrónica",
                "genero": "Femenino",
                "pregunta1": "a",
                "pregunta10": "c"
            },
            "clasificaciones": ["Positivo"],
            "clasificacionFinal": "Positivo",
            "fecha": "15/3/2025, 10:12:03"
        }"#;

        let raw: RawSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(raw.fields.name.as_deref(), Some("Ana"));
        assert_eq!(raw.fields.division.as_deref(), Some("Mecatrónica"));
        assert_eq!(raw.submitted_at.as_deref(), Some("15/3/2025, 10:12:03"));
        assert!(raw.fields.extra.contains_key("pregunta1"));
        assert!(raw.fields.extra.contains_key("pregunta10"));
    }

    #[test]
    fn test_raw_submission_tolerates_missing_fields() {
        let raw: RawSubmission = serde_json::from_str("{}").unwrap();
        assert!(raw.fields.name.is_none());
        assert!(raw.fields.extra.is_empty());
        assert!(raw.submitted_at.is_none());
    }
}
