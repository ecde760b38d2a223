//! Chart-ready data extraction.
//!
//! Turns aggregates into ordered (labels, series) pairs that any rendering
//! collaborator can consume. Ordering follows the aggregates; nothing here
//! knows about colors, canvases, or chart types.

use crate::models::{Aggregate, AggregateSet, ChartData, ChartSet, QuestionTally, Series};

/// Build chart data for every dashboard chart.
pub fn chart_set(aggregates: &AggregateSet) -> ChartSet {
    ChartSet {
        division: from_aggregate(&aggregates.division, None),
        age: from_aggregate(&aggregates.age, Some("Cantidad de usuarios")),
        gender: from_aggregate(&aggregates.gender, None),
        sentiment: from_aggregate(&aggregates.sentiment, None),
        questions: from_question_tallies(&aggregates.questions),
    }
}

/// One single-series chart from an aggregate, bucket order preserved.
pub fn from_aggregate(aggregate: &Aggregate, series_name: Option<&str>) -> ChartData {
    ChartData {
        labels: aggregate.buckets.iter().map(|b| b.label.clone()).collect(),
        series: vec![Series {
            name: series_name.map(str::to_string),
            values: aggregate.buckets.iter().map(|b| b.count as f64).collect(),
        }],
    }
}

/// One grouped chart over all questions, with one series per option.
pub fn from_question_tallies(tallies: &[QuestionTally]) -> ChartData {
    ChartData {
        labels: tallies
            .iter()
            .map(|t| format!("Pregunta {}", t.question))
            .collect(),
        series: vec![
            Series {
                name: Some("Opción A".to_string()),
                values: tallies.iter().map(|t| t.a as f64).collect(),
            },
            Series {
                name: Some("Opción B".to_string()),
                values: tallies.iter().map(|t| t.b as f64).collect(),
            },
            Series {
                name: Some("Opción C".to_string()),
                values: tallies.iter().map(|t| t.c as f64).collect(),
            },
        ],
    }
}
