pub mod catalog;
pub mod events;
pub mod media;
pub mod runner;
pub mod scoring;
pub mod session;
pub mod sound;
pub mod timeline;

#[cfg(test)]
pub mod testing;

use std::collections::BTreeMap;
use std::fmt;

/// Scoring bucket of an answer. The letter carries no order or weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnswerId {
    A,
    B,
    C,
    D,
}

impl AnswerId {
    pub const ALL: [AnswerId; 4] = [AnswerId::A, AnswerId::B, AnswerId::C, AnswerId::D];

    pub fn index(self) -> usize {
        match self {
            AnswerId::A => 0,
            AnswerId::B => 1,
            AnswerId::C => 2,
            AnswerId::D => 3,
        }
    }

    pub fn letter(self) -> char {
        match self {
            AnswerId::A => 'A',
            AnswerId::B => 'B',
            AnswerId::C => 'C',
            AnswerId::D => 'D',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(AnswerId::A),
            'B' => Some(AnswerId::B),
            'C' => Some(AnswerId::C),
            'D' => Some(AnswerId::D),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub id: AnswerId,
    pub text: &'static str,
}

impl Answer {
    pub const fn new(id: AnswerId, text: &'static str) -> Self {
        Self { id, text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    /// 1-based and stable across releases.
    pub id: u32,
    pub prompt: &'static str,
    pub micro_copy: &'static str,
    pub answers: [Answer; 4],
}

impl Question {
    pub fn answer(&self, id: AnswerId) -> &Answer {
        &self.answers[id.index()]
    }
}

/// Chosen answer per question id. Recording the same question twice keeps
/// the latest choice and does not grow the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    answers: BTreeMap<u32, AnswerId>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, question_id: u32, answer: AnswerId) -> Option<AnswerId> {
        self.answers.insert(question_id, answer)
    }

    pub fn get(&self, question_id: u32) -> Option<AnswerId> {
        self.answers.get(&question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn choices(&self) -> impl Iterator<Item = AnswerId> + '_ {
        self.answers.values().copied()
    }
}

impl FromIterator<(u32, AnswerId)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (u32, AnswerId)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_same_question_overwrites_without_growing() {
        let mut answers = AnswerSet::new();
        assert_eq!(answers.record(1, AnswerId::A), None);
        assert_eq!(answers.record(1, AnswerId::C), Some(AnswerId::A));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(1), Some(AnswerId::C));
    }

    #[test]
    fn letters_parse_case_insensitively() {
        assert_eq!(AnswerId::from_letter('b'), Some(AnswerId::B));
        assert_eq!(AnswerId::from_letter('D'), Some(AnswerId::D));
        assert_eq!(AnswerId::from_letter('E'), None);
    }
}
