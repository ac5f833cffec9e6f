//! # Quiz
//!
//! Personality questionnaire scoring for the Academy.
//!
//! ## Scoring
//!
//! 1. Each answer becomes a token: question number followed by the lowercased
//!    answer, so question 3 answered `"B"` is `"3b"`.
//! 2. Tokens are collected into a set, duplicates collapse.
//! 3. Every profile in [`PROFILES`] is scored by the size of its intersection
//!    with that set.
//! 4. The first profile to reach a strictly greater score wins.
//! 5. A best score of zero (including an empty submission) falls back to
//!    [`DEFAULT_PROFILE`].
//!
//! Classification never fails. Out of range question numbers, unknown letters
//! or multi-character answers just don't match anything. Validating the
//! submission is up to the caller.
//!
//! ```
//! use quiz::{QuizAnswer, classify};
//!
//! let result = classify(&[QuizAnswer::new(1, "a"), QuizAnswer::new(2, "b")]);
//! assert_eq!(result.profile_name, "Allenatore Cinico");
//! ```
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub mod profiles;

pub use profiles::{DEFAULT_PROFILE, PROFILES, Profile, default_profile, profile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub question_number: i64,
    pub answer: String,
}

impl QuizAnswer {
    pub fn new(question_number: i64, answer: impl Into<String>) -> Self {
        Self {
            question_number,
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub profile_name: String,
    pub profile_type: String,
    pub description: String,
}

pub fn token(answer: &QuizAnswer) -> String {
    format!("{}{}", answer.question_number, answer.answer.to_lowercase())
}

pub fn tokens(answers: &[QuizAnswer]) -> HashSet<String> {
    answers.iter().map(token).collect()
}

pub fn best_profile(answers: &[QuizAnswer]) -> &'static Profile {
    let tokens = tokens(answers);

    let mut best = default_profile();
    let mut best_score = 0;

    for profile in &PROFILES {
        let score = profile.score(&tokens);

        if score > best_score {
            best_score = score;
            best = profile;
        }
    }

    best
}

pub fn classify(answers: &[QuizAnswer]) -> QuizResult {
    best_profile(answers).result()
}
