//! Snapshot normalization.
//!
//! Maps raw wire submissions to canonical response records. A record never
//! fails to normalize; every missing or unusable field resolves to a
//! documented default:
//!
//! | field    | default      |
//! |----------|--------------|
//! | name     | `"Anónimo"`  |
//! | age      | unknown      |
//! | division | `"N/A"`      |
//! | gender   | `"N/A"`      |
//! | answer   | unanswered   |

use crate::engine::classifier;
use crate::models::{
    AnswerOption, CanonicalResponse, RawFields, RawSubmission, Snapshot, QUESTION_COUNT,
};
use serde_json::Value;

/// Fallback respondent name.
pub const DEFAULT_NAME: &str = "Anónimo";

/// Fallback for missing demographic fields.
pub const DEFAULT_FIELD: &str = "N/A";

/// Normalize a whole snapshot into canonical responses.
///
/// Ids are assigned 1-based in snapshot key order, so the numbering matches
/// the submission order of the original dataset.
pub fn normalize_snapshot(snapshot: &Snapshot) -> Vec<CanonicalResponse> {
    snapshot
        .values()
        .enumerate()
        .map(|(index, raw)| normalize(index + 1, raw))
        .collect()
}

/// Normalize one raw submission. Never fails.
pub fn normalize(id: usize, raw: &RawSubmission) -> CanonicalResponse {
    let fields = &raw.fields;
    let answers = collect_answers(fields);

    CanonicalResponse {
        id,
        name: text_or_default(fields.name.as_deref(), DEFAULT_NAME),
        age: parse_age(fields.age.as_ref()),
        division: text_or_default(fields.division.as_deref(), DEFAULT_FIELD),
        gender: text_or_default(fields.gender.as_deref(), DEFAULT_FIELD),
        sentiment: classifier::classify(&answers),
        answers,
        submitted_at: raw.submitted_at.clone(),
    }
}

fn text_or_default(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => default.to_string(),
    }
}

/// Parse the age field, which arrives as a string or a number.
/// Anything that is not a non-negative integer is unknown.
fn parse_age(value: Option<&Value>) -> Option<u32> {
    match value {
        Some(Value::Number(number)) => number.as_u64().and_then(|age| u32::try_from(age).ok()),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    }
}

fn collect_answers(fields: &RawFields) -> [AnswerOption; QUESTION_COUNT] {
    let mut answers = [AnswerOption::Unanswered; QUESTION_COUNT];
    for (index, slot) in answers.iter_mut().enumerate() {
        let key = format!("pregunta{}", index + 1);
        if let Some(Value::String(selected)) = fields.extra.get(&key) {
            *slot = AnswerOption::parse(selected);
        }
    }
    answers
}
