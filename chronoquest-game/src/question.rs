//! Quiz questions and the static fallback bank.
//!
//! Questions normally arrive from the external generator; the bank embedded
//! in the crate guarantees the quiz UI is never left empty when the
//! generator is unreachable.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Self::Easy),
            "Medium" => Ok(Self::Medium),
            "Hard" => Ok(Self::Hard),
            _ => Err(()),
        }
    }
}

/// Immutable multiple-choice question. Four options, one correct index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Question {
    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_index
    }
}

/// Static pool of fallback questions keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            questions: Vec::new(),
        }
    }

    /// Load a bank from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into question data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The bank shipped with the crate.
    pub fn builtin() -> &'static Self {
        static BANK: OnceLock<QuestionBank> = OnceLock::new();
        BANK.get_or_init(|| {
            Self::from_json(include_str!("../assets/data/questions.json"))
                .unwrap_or_else(|_| Self::empty())
        })
    }

    #[must_use]
    pub fn by_ref(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Last-resort lookup: wrap the node index around the pool size.
    #[must_use]
    pub fn by_index_modulo(&self, node_index: usize) -> Option<&Question> {
        if self.questions.is_empty() {
            return None;
        }
        self.questions.get(node_index % self.questions.len())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_of(ids: &[&str]) -> QuestionBank {
        QuestionBank {
            questions: ids
                .iter()
                .map(|id| Question {
                    id: (*id).to_string(),
                    text: format!("question {id}"),
                    options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_index: 0,
                    explanation: String::new(),
                    topic: String::new(),
                    difficulty: Difficulty::Easy,
                })
                .collect(),
        }
    }

    #[test]
    fn lookup_by_ref_and_modulo() {
        let bank = bank_of(&["f1", "f2", "f3"]);
        assert_eq!(bank.by_ref("f2").unwrap().id, "f2");
        assert!(bank.by_ref("missing").is_none());
        assert_eq!(bank.by_index_modulo(0).unwrap().id, "f1");
        assert_eq!(bank.by_index_modulo(4).unwrap().id, "f2");
    }

    #[test]
    fn empty_bank_yields_no_modulo_question() {
        assert!(QuestionBank::empty().by_index_modulo(3).is_none());
    }

    #[test]
    fn builtin_bank_parses_and_is_answerable() {
        let bank = QuestionBank::builtin();
        assert!(!bank.is_empty());
        for question in bank.iter() {
            assert_eq!(question.options.len(), 4);
            assert!(question.correct_index < question.options.len());
            assert!(question.is_correct(question.correct_index));
        }
    }

    #[test]
    fn difficulty_round_trips_strings() {
        assert_eq!(Difficulty::from_str("Hard"), Ok(Difficulty::Hard));
        assert_eq!(Difficulty::Hard.to_string(), "Hard");
        assert!(Difficulty::from_str("impossible").is_err());
    }
}
