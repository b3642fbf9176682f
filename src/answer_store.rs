use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::PlacementRejected;
use crate::sentence::count_blanks;
use crate::types::{Correctness, Question};

/// One slot per blank, each empty or holding a placed word.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerSlots {
    slots: Vec<Option<String>>,
}

impl AnswerSlots {
    pub fn empty(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn from_vec(slots: Vec<Option<String>>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|slot| slot.as_deref())
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn used_words(&self) -> BTreeSet<&str> {
        self.slots.iter().filter_map(|slot| slot.as_deref()).collect()
    }

    pub fn is_used(&self, word: &str) -> bool {
        self.slots.iter().any(|slot| slot.as_deref() == Some(word))
    }

    pub fn place(&mut self, index: usize, word: &str) -> Result<(), PlacementRejected> {
        let len = self.slots.len();
        let is_used = self.is_used(word);
        let Some(slot) = self.slots.get_mut(index) else {
            return Err(PlacementRejected::BlankOutOfRange { index, len });
        };
        if slot.is_some() {
            return Err(PlacementRejected::BlankFilled(index));
        }
        if is_used {
            return Err(PlacementRejected::WordAlreadyPlaced(word.to_string()));
        }
        *slot = Some(word.to_string());
        Ok(())
    }

    /// Empties a filled blank and returns the word. Empty or missing blanks are untouched.
    pub fn clear(&mut self, index: usize) -> Option<String> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn as_slice(&self) -> &[Option<String>] {
        &self.slots
    }

    pub fn into_vec(self) -> Vec<Option<String>> {
        self.slots
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    #[serde(rename = "questionId")]
    pub question_id: i64,
    pub answers: AnswerSlots,
    pub correctness: Correctness,
}

impl AnswerRecord {
    pub fn new(question: &Question) -> Self {
        Self {
            question_id: question.question_id,
            answers: AnswerSlots::empty(count_blanks(&question.text)),
            correctness: Correctness::Unknown,
        }
    }

    pub fn is_graded(&self) -> bool {
        self.correctness != Correctness::Unknown
    }

    /// Stores the submitted answers and their grade. Returns false when already graded.
    pub fn record_submission(&mut self, answers: AnswerSlots, correct: bool) -> bool {
        if self.is_graded() {
            log::warn!(
                "[answers] question {} already graded, ignoring resubmission",
                self.question_id
            );
            return false;
        }
        self.answers = answers;
        self.correctness = Correctness::from_graded(correct);
        true
    }
}
