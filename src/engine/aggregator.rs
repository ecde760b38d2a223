//! Grouped counts and percentages across the response set.
//!
//! Aggregates are always derived from the complete current response set,
//! never updated incrementally. Bucket order is part of the contract:
//! division and gender follow first appearance, sentiment uses a fixed
//! display order, ages sort numerically ascending.

use crate::models::{
    Aggregate, AggregateSet, AnswerOption, Bucket, CanonicalResponse, QuestionTally, Sentiment,
    QUESTION_COUNT, TARGET_AGE_RANGE,
};
use std::collections::BTreeMap;

/// Compute all five aggregates for one response set.
pub fn aggregate(responses: &[CanonicalResponse]) -> AggregateSet {
    AggregateSet {
        division: by_division(responses),
        age: by_age(responses),
        gender: by_gender(responses),
        sentiment: by_sentiment(responses),
        questions: question_tallies(responses),
    }
}

/// Respondents per division, in order of first appearance.
pub fn by_division(responses: &[CanonicalResponse]) -> Aggregate {
    ordered_counts(responses.iter().map(|r| r.division.as_str()))
}

/// Respondents per gender, in order of first appearance.
pub fn by_gender(responses: &[CanonicalResponse]) -> Aggregate {
    ordered_counts(responses.iter().map(|r| r.gender.as_str()))
}

/// Sentiment distribution in fixed display order.
/// All three buckets are always present, so counts sum to the response count.
pub fn by_sentiment(responses: &[CanonicalResponse]) -> Aggregate {
    let total = responses.len() as u64;
    let buckets = Sentiment::ALL
        .iter()
        .map(|sentiment| {
            let count = responses.iter().filter(|r| r.sentiment == *sentiment).count() as u64;
            Bucket::new(sentiment.label(), count, total)
        })
        .collect();

    Aggregate { total, buckets }
}

/// Respondents per exact age within the target window, ascending by age.
///
/// Unknown and out-of-range ages are left out of this aggregate only; the
/// percentages are shares of the in-range count.
pub fn by_age(responses: &[CanonicalResponse]) -> Aggregate {
    let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
    for age in responses.iter().filter_map(|r| r.age) {
        if TARGET_AGE_RANGE.contains(&age) {
            *counts.entry(age).or_insert(0) += 1;
        }
    }

    let total: u64 = counts.values().sum();
    let buckets = counts
        .into_iter()
        .map(|(age, count)| Bucket::new(age.to_string(), count, total))
        .collect();

    Aggregate { total, buckets }
}

/// Option counts for each of the ten questions. Unanswered entries are not
/// tallied as any option.
pub fn question_tallies(responses: &[CanonicalResponse]) -> Vec<QuestionTally> {
    (0..QUESTION_COUNT)
        .map(|index| {
            let mut tally = QuestionTally {
                question: index + 1,
                ..QuestionTally::default()
            };
            for response in responses {
                match response.answers[index] {
                    AnswerOption::A => tally.a += 1,
                    AnswerOption::B => tally.b += 1,
                    AnswerOption::C => tally.c += 1,
                    AnswerOption::Unanswered => {}
                }
            }
            tally
        })
        .collect()
}

fn ordered_counts<'a>(values: impl Iterator<Item = &'a str>) -> Aggregate {
    let mut pairs: Vec<(String, u64)> = Vec::new();
    let mut total = 0u64;
    for value in values {
        total += 1;
        match pairs.iter_mut().find(|(label, _)| label == value) {
            Some((_, count)) => *count += 1,
            None => pairs.push((value.to_string(), 1)),
        }
    }

    let buckets = pairs
        .into_iter()
        .map(|(label, count)| Bucket::new(label, count, total))
        .collect();

    Aggregate { total, buckets }
}
