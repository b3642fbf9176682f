use crate::answer_store::AnswerSlots;
use crate::constants::{PROMPT_DRAGGING, PROMPT_IDLE};
use crate::drag::{
    blank_target_id, option_item_id, parse_option_item_id, resolve_drop, DragState, DropTarget,
};
use crate::error::PlacementRejected;
use crate::sentence::split_sentence;
use crate::timer::{QuestionTimer, TimerTick};
use crate::types::{
    Completion, CompletionReason, PlayView, Question, SentencePart, WordOptionView,
};

/// One active question: its slots, countdown and drag session.
/// Yields at most one `Completion`, after which every event is ignored.
#[derive(Clone, Debug)]
pub struct QuestionPlay {
    question: Question,
    slots: AnswerSlots,
    timer: QuestionTimer,
    drag: DragState,
    question_number: usize,
    total_questions: usize,
    completed: bool,
}

impl QuestionPlay {
    pub fn new(
        question: Question,
        initial: AnswerSlots,
        question_number: usize,
        total_questions: usize,
        timer_secs: u32,
    ) -> Self {
        Self {
            question,
            slots: initial,
            timer: QuestionTimer::new(timer_secs),
            drag: DragState::Idle,
            question_number,
            total_questions,
            completed: false,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn question_id(&self) -> i64 {
        self.question.question_id
    }

    pub fn slots(&self) -> &AnswerSlots {
        &self.slots
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn time_left(&self) -> u32 {
        self.timer.time_left()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn drag_start(&mut self, item_id: &str) -> Result<(), PlacementRejected> {
        if self.completed {
            return Err(PlacementRejected::NoActiveQuestion);
        }
        let started = match self.option_word(item_id) {
            None => Err(PlacementRejected::UnknownOption(item_id.to_string())),
            Some(word) if self.slots.is_used(word) => {
                Err(PlacementRejected::OptionUnavailable(item_id.to_string()))
            }
            Some(_) => Ok(()),
        };
        match &started {
            Ok(()) => self.drag.start(item_id),
            Err(error) => log::warn!(
                "[play] question {} drag start refused: {error}",
                self.question.question_id
            ),
        }
        started
    }

    pub fn drag_over(&mut self, target_id: Option<&str>) {
        if !self.completed {
            self.drag.over(target_id);
        }
    }

    /// Places the dragged word when the drop is valid; otherwise nothing changes.
    pub fn drag_end(
        &mut self,
        item_id: &str,
        target: Option<&DropTarget>,
    ) -> Result<usize, PlacementRejected> {
        self.drag.end();
        if self.completed {
            return Err(PlacementRejected::NoActiveQuestion);
        }
        let placed = resolve_drop(&self.slots, &self.question.options, item_id, target)
            .and_then(|(index, word)| self.slots.place(index, &word).map(|()| index));
        match &placed {
            Ok(index) => log::debug!(
                "[play] question {} placed {item_id} in blank {index}",
                self.question.question_id
            ),
            Err(error) => log::warn!(
                "[play] question {} drop ignored: {error}",
                self.question.question_id
            ),
        }
        placed
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// Clears a filled blank. Clicking an empty blank does nothing.
    pub fn click_blank(&mut self, index: usize) -> Option<String> {
        if self.completed {
            return None;
        }
        self.slots.clear(index)
    }

    /// The Next action. Only available once every blank holds a word.
    pub fn next(&mut self) -> Option<Completion> {
        if self.completed || !self.slots.is_complete() {
            return None;
        }
        Some(self.finish(CompletionReason::Submitted))
    }

    /// Advances the countdown; on expiry submits whatever is placed.
    pub fn tick(&mut self) -> Option<Completion> {
        if self.completed {
            return None;
        }
        match self.timer.tick() {
            TimerTick::Expired => {
                log::info!(
                    "[play] question {} timed out with {}/{} blanks filled",
                    self.question.question_id,
                    self.slots.filled_count(),
                    self.slots.len()
                );
                Some(self.finish(CompletionReason::TimeUp))
            }
            TimerTick::Running(_) | TimerTick::Stopped => None,
        }
    }

    /// Stops the countdown without producing a completion.
    pub fn teardown(&mut self) {
        self.timer.stop();
        self.drag.cancel();
        self.completed = true;
    }

    pub fn view(&self) -> PlayView {
        let active_item = self.drag.active_item().map(str::to_string);
        let dragging_option = active_item
            .as_deref()
            .and_then(|item_id| self.option_word(item_id));
        let hover_target = self.drag.hover_target();

        let segments = split_sentence(&self.question.text);
        let mut sentence = Vec::with_capacity(segments.len() + self.slots.len());
        for (index, segment) in segments.into_iter().enumerate() {
            sentence.push(SentencePart::Text {
                text: segment.to_string(),
            });
            if index < self.slots.len() {
                let id = blank_target_id(index);
                let word = self.slots.get(index).map(str::to_string);
                sentence.push(SentencePart::Blank {
                    index,
                    filled: word.is_some(),
                    hovered: dragging_option.is_some() && hover_target == Some(id.as_str()),
                    id,
                    word,
                });
            }
        }

        let options = self
            .question
            .options
            .iter()
            .map(|word| WordOptionView {
                id: option_item_id(word),
                word: word.clone(),
                used: self.slots.is_used(word),
            })
            .collect();

        PlayView {
            question_id: self.question.question_id,
            question_number: self.question_number,
            total_questions: self.total_questions,
            time_left: self.timer.time_left(),
            time_progress: self.timer.progress_percent(),
            prompt: if active_item.is_some() {
                PROMPT_DRAGGING
            } else {
                PROMPT_IDLE
            }
            .to_string(),
            sentence,
            options,
            overlay_word: dragging_option.map(str::to_string),
            active_item,
            can_submit: !self.completed && self.slots.is_complete(),
        }
    }

    fn option_word<'a>(&'a self, item_id: &'a str) -> Option<&'a str> {
        parse_option_item_id(item_id)
            .filter(|word| self.question.options.iter().any(|option| option == word))
    }

    fn finish(&mut self, reason: CompletionReason) -> Completion {
        self.timer.stop();
        self.drag.cancel();
        self.completed = true;
        Completion {
            question_id: self.question.question_id,
            answers: self.slots.as_slice().to_vec(),
            reason,
        }
    }
}
