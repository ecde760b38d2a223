//! Sentiment classification.
//!
//! A respondent's ten answers reduce to one weighted favorability score:
//! `a` counts 3, `c` counts 2, `b` counts 1, and an unanswered question
//! counts 1 (the floor of the scale). The sum ranges over [10, 30];
//! 21 and above reads Positive, 10 and below Negative, anything in
//! between Neutral.
//!
//! Classification is a pure function of the answers. Stored classifications
//! on the wire are never consulted.

use crate::models::{AnswerOption, Sentiment, QUESTION_COUNT};

/// Scores at or above this are Positive.
pub const POSITIVE_THRESHOLD: u32 = 21;

/// Scores at or below this are Negative.
pub const NEGATIVE_THRESHOLD: u32 = 10;

/// Derive the sentiment for one answer set.
pub fn classify(answers: &[AnswerOption; QUESTION_COUNT]) -> Sentiment {
    let score = weighted_score(answers);
    if score >= POSITIVE_THRESHOLD {
        Sentiment::Positive
    } else if score <= NEGATIVE_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Weighted favorability score summed over all ten answers.
pub fn weighted_score(answers: &[AnswerOption; QUESTION_COUNT]) -> u32 {
    answers.iter().map(|answer| answer_weight(*answer)).sum()
}

fn answer_weight(answer: AnswerOption) -> u32 {
    match answer {
        AnswerOption::A => 3,
        AnswerOption::C => 2,
        AnswerOption::B | AnswerOption::Unanswered => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pattern: &str) -> [AnswerOption; QUESTION_COUNT] {
        assert_eq!(pattern.len(), QUESTION_COUNT);
        let mut result = [AnswerOption::Unanswered; QUESTION_COUNT];
        for (slot, letter) in result.iter_mut().zip(pattern.chars()) {
            *slot = match letter {
                'a' => AnswerOption::A,
                'b' => AnswerOption::B,
                'c' => AnswerOption::C,
                _ => AnswerOption::Unanswered,
            };
        }
        result
    }

    #[test]
    fn test_weighted_score_bounds() {
        assert_eq!(weighted_score(&answers("aaaaaaaaaa")), 30);
        assert_eq!(weighted_score(&answers("bbbbbbbbbb")), 10);
        assert_eq!(weighted_score(&answers("cccccccccc")), 20);
    }

    #[test]
    fn test_worked_examples() {
        let positive = answers("aaaaaaacbb"); // 3*7 + 2 + 1*2 = 25
        let negative = answers("bbbbbbbbbb"); // 10
        let neutral = answers("cbcbcbcbcb"); // 15
        assert_eq!(classify(&positive), Sentiment::Positive);
        assert_eq!(classify(&negative), Sentiment::Negative);
        assert_eq!(classify(&neutral), Sentiment::Neutral);
    }

    #[test]
    fn test_single_favorable_answer_does_not_dominate() {
        // One `a` among nine `b`s scores 12: Neutral, not Positive.
        assert_eq!(classify(&answers("abbbbbbbbb")), Sentiment::Neutral);
    }

    #[test]
    fn test_unanswered_scores_as_floor() {
        let skipped = [AnswerOption::Unanswered; QUESTION_COUNT];
        assert_eq!(weighted_score(&skipped), 10);
        assert_eq!(classify(&skipped), Sentiment::Negative);

        // Unanswered weighs the same as `b`.
        let mut mixed = answers("bbbbbbbbbb");
        mixed[0] = AnswerOption::Unanswered;
        assert_eq!(weighted_score(&mixed), 10);
    }

    #[test]
    fn test_boundary_scores() {
        // Exactly 21 is Positive: 3*5 + 2*1 + 1*4 = 21.
        assert_eq!(classify(&answers("aaaaacbbbb")), Sentiment::Positive);
        // Exactly 20 is Neutral.
        assert_eq!(classify(&answers("cccccccccc")), Sentiment::Neutral);
        // Exactly 11 is Neutral: 2 + 1*9 = 11.
        assert_eq!(classify(&answers("cbbbbbbbbb")), Sentiment::Neutral);
    }

    #[test]
    fn test_classify_is_pure() {
        let set = answers("abcabcabca");
        assert_eq!(classify(&set), classify(&set));
    }
}
