use crate::answer_store::{AnswerRecord, AnswerSlots};
use crate::constants::TIMER_DURATION_SECS;
use crate::drag::DropTarget;
use crate::error::{DataError, LookupMiss, PlacementRejected};
use crate::grading::grade;
use crate::play::QuestionPlay;
use crate::question_source::QuestionSource;
use crate::results::ResultsReport;
use crate::sentence::validate_question_set;
use crate::types::{Completion, CompletionReason, Question, Screen, SessionState};

#[derive(Clone, Debug)]
pub struct GameOptions {
    pub timer_secs: u32,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            timer_secs: TIMER_DURATION_SECS,
        }
    }
}

/// One play-through: loading, then one question at a time, then results.
#[derive(Clone, Debug)]
pub struct GameController {
    options: GameOptions,
    state: SessionState,
    questions: Vec<Question>,
    current_index: usize,
    records: Vec<AnswerRecord>,
    active: Option<QuestionPlay>,
    last_error: Option<String>,
}

impl GameController {
    pub fn new(options: GameOptions) -> Self {
        Self {
            options,
            state: SessionState::Loading,
            questions: Vec::new(),
            current_index: 0,
            records: Vec::new(),
            active: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &GameOptions {
        &self.options
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.state != SessionState::Playing {
            return None;
        }
        self.questions.get(self.current_index)
    }

    pub fn current_record(&self) -> Option<&AnswerRecord> {
        let question = self.current_question()?;
        self.records
            .iter()
            .find(|record| record.question_id == question.question_id)
    }

    pub fn active_play(&self) -> Option<&QuestionPlay> {
        self.active.as_ref()
    }

    /// Fetches the question set. On failure the session stays in loading.
    pub async fn load(&mut self, source: &QuestionSource) -> Result<(), DataError> {
        if self.state != SessionState::Loading {
            log::warn!("[controller] load called in {:?} state, ignoring", self.state);
            return Ok(());
        }
        let fetched = source.fetch().await;
        match fetched {
            Ok(questions) => self.start(questions),
            Err(error) => {
                log::error!("[controller] failed to fetch questions: {error}");
                self.last_error = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// Installs a fetched question set and opens the first question.
    pub fn start(&mut self, questions: Vec<Question>) -> Result<(), DataError> {
        if let Err(error) = validate_question_set(&questions) {
            log::error!("[controller] rejected question set: {error}");
            self.last_error = Some(error.to_string());
            return Err(error);
        }

        self.records = questions.iter().map(AnswerRecord::new).collect();
        self.questions = questions;
        self.current_index = 0;
        self.last_error = None;
        self.state = SessionState::Playing;
        log::info!(
            "[controller] loaded {} questions, timer {}s",
            self.questions.len(),
            self.options.timer_secs
        );
        self.open_current();
        Ok(())
    }

    /// Grades and stores one answer, then advances or finishes.
    /// Only the active question can be answered, and only once.
    /// Correct and incorrect submissions advance the same way.
    pub fn submit_answer(
        &mut self,
        question_id: i64,
        placed: Vec<Option<String>>,
    ) -> Result<(), LookupMiss> {
        let record_index = self
            .records
            .iter()
            .position(|record| record.question_id == question_id)
            .ok_or(LookupMiss::UnknownAnswerRecord(question_id))?;
        let position = self
            .questions
            .iter()
            .position(|question| question.question_id == question_id)
            .ok_or(LookupMiss::UnknownQuestion(question_id))?;
        if self.state != SessionState::Playing || position != self.current_index {
            return Err(LookupMiss::NotActive(question_id));
        }

        let correct = grade(&placed, &self.questions[position].correct_answer);
        if !self.records[record_index].record_submission(AnswerSlots::from_vec(placed), correct) {
            return Err(LookupMiss::AlreadyAnswered(question_id));
        }
        log::info!(
            "[controller] question {question_id} graded {}",
            if correct { "correct" } else { "incorrect" }
        );
        if let Some(mut play) = self.active.take() {
            play.teardown();
        }

        if position + 1 < self.questions.len() {
            self.current_index = position + 1;
            self.open_current();
        } else {
            self.state = SessionState::Finished;
            log::info!(
                "[controller] session finished with {}/{} correct",
                self.score(),
                self.questions.len()
            );
        }
        Ok(())
    }

    /// The single path for "this question is done", from Next or from the timer.
    pub fn complete_question(&mut self, completion: Completion) -> Result<(), LookupMiss> {
        let Some(play) = self.active.as_ref() else {
            return Err(LookupMiss::NotActive(completion.question_id));
        };
        if play.question_id() != completion.question_id {
            log::warn!(
                "[controller] completion for {} while {} is active",
                completion.question_id,
                play.question_id()
            );
            return Err(LookupMiss::NotActive(completion.question_id));
        }
        self.submit_answer(completion.question_id, completion.answers)
    }

    pub fn drag_start(&mut self, item_id: &str) -> Result<(), PlacementRejected> {
        self.active_mut()?.drag_start(item_id)
    }

    pub fn drag_over(&mut self, target_id: Option<&str>) {
        if let Some(play) = self.active.as_mut() {
            play.drag_over(target_id);
        }
    }

    pub fn drag_end(
        &mut self,
        item_id: &str,
        target: Option<&DropTarget>,
    ) -> Result<usize, PlacementRejected> {
        self.active_mut()?.drag_end(item_id, target)
    }

    pub fn drag_cancel(&mut self) {
        if let Some(play) = self.active.as_mut() {
            play.drag_cancel();
        }
    }

    pub fn click_blank(&mut self, index: usize) -> Option<String> {
        self.active.as_mut()?.click_blank(index)
    }

    /// Next action. Returns true when the question was submitted.
    pub fn next(&mut self) -> bool {
        let Some(completion) = self.active.as_mut().and_then(QuestionPlay::next) else {
            return false;
        };
        self.finish_with(completion);
        true
    }

    /// One countdown unit for the active question.
    pub fn tick(&mut self) -> Option<CompletionReason> {
        let completion = self.active.as_mut()?.tick()?;
        let reason = completion.reason;
        self.finish_with(completion);
        Some(reason)
    }

    pub fn score(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.correctness.is_correct())
            .count()
    }

    pub fn screen(&self) -> Screen {
        match (self.state, self.active.as_ref()) {
            (SessionState::Playing, Some(play)) => Screen::Playing(play.view()),
            (SessionState::Finished, _) => {
                Screen::Finished(ResultsReport::build(&self.questions, &self.records))
            }
            _ => Screen::Loading {
                error: self.last_error.clone(),
            },
        }
    }

    /// Play again: everything from the previous run is dropped.
    pub fn restart(&mut self) {
        if let Some(play) = self.active.as_mut() {
            play.teardown();
        }
        *self = Self::new(self.options.clone());
    }

    fn finish_with(&mut self, completion: Completion) {
        if let Err(miss) = self.complete_question(completion) {
            log::warn!("[controller] completion dropped: {miss}");
        }
    }

    fn active_mut(&mut self) -> Result<&mut QuestionPlay, PlacementRejected> {
        if self.active.is_none() {
            log::warn!("[controller] drag event in {:?} state, no active question", self.state);
        }
        self.active
            .as_mut()
            .ok_or(PlacementRejected::NoActiveQuestion)
    }

    fn open_current(&mut self) {
        let Some(question) = self.questions.get(self.current_index).cloned() else {
            self.active = None;
            return;
        };
        let initial = self
            .records
            .iter()
            .find(|record| record.question_id == question.question_id)
            .map(|record| record.answers.clone())
            .unwrap_or_default();
        self.active = Some(QuestionPlay::new(
            question,
            initial,
            self.current_index + 1,
            self.questions.len(),
            self.options.timer_secs,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BLANK_MARKER;
    use crate::drag::option_item_id;
    use crate::results::BlankMark;
    use crate::types::Correctness;

    fn make_question(id: i64, options: &[&str], correct: &str) -> Question {
        Question {
            question_id: id,
            text: format!("The {BLANK_MARKER} fox."),
            options: options.iter().map(|word| word.to_string()).collect(),
            correct_answer: vec![correct.to_string()],
            answer_type: "options".to_string(),
            question_type: "text".to_string(),
        }
    }

    fn two_question_game(timer_secs: u32) -> GameController {
        let mut game = GameController::new(GameOptions { timer_secs });
        game.start(vec![
            make_question(1, &["quick", "slow"], "quick"),
            make_question(2, &["quick", "slow"], "slow"),
        ])
        .expect("question set is valid");
        game
    }

    fn place(game: &mut GameController, word: &str, blank: usize) {
        let item_id = option_item_id(word);
        game.drag_start(&item_id).expect("drag start");
        game.drag_over(Some(&format!("blank-{blank}")));
        game.drag_end(&item_id, Some(&DropTarget::blank(blank)))
            .expect("drop accepted");
    }

    #[test]
    fn start_initializes_one_empty_record_per_question() {
        let game = two_question_game(30);
        assert_eq!(game.state(), SessionState::Playing);
        assert_eq!(game.records().len(), 2);
        assert!(game
            .records()
            .iter()
            .all(|record| record.correctness == Correctness::Unknown
                && record.answers.filled_count() == 0));
        assert_eq!(game.current_question().map(|q| q.question_id), Some(1));
        assert_eq!(game.current_record().map(|r| r.question_id), Some(1));
    }

    #[test]
    fn empty_question_set_stays_loading() {
        let mut game = GameController::new(GameOptions::default());
        assert!(matches!(game.start(Vec::new()), Err(DataError::Empty)));
        assert_eq!(game.state(), SessionState::Loading);
        assert!(game.records().is_empty());
        match game.screen() {
            Screen::Loading { error } => assert_eq!(error.as_deref(), Some("no questions found")),
            other => panic!("expected loading screen, got {other:?}"),
        }
    }

    #[test]
    fn both_correct_scores_two_of_two() {
        let mut game = two_question_game(30);
        place(&mut game, "quick", 0);
        assert!(game.next());
        assert_eq!(game.current_question().map(|q| q.question_id), Some(2));

        place(&mut game, "slow", 0);
        assert!(game.next());
        assert_eq!(game.state(), SessionState::Finished);
        assert_eq!(game.score(), 2);

        let Screen::Finished(report) = game.screen() else {
            panic!("expected results screen");
        };
        assert_eq!((report.score, report.total), (2, 2));
        assert!(report
            .entries
            .iter()
            .all(|entry| entry.correct && entry.blank_marks() == vec![BlankMark::Correct]));
    }

    #[test]
    fn incorrect_answer_advances_like_correct_one() {
        let mut game = two_question_game(30);
        place(&mut game, "slow", 0);
        assert!(game.next());
        assert_eq!(game.current_index(), 1);
        assert_eq!(game.records()[0].correctness, Correctness::Incorrect);
    }

    #[test]
    fn next_is_refused_until_all_blanks_filled() {
        let mut game = two_question_game(30);
        assert!(!game.next());
        assert_eq!(game.current_index(), 0);
    }

    #[test]
    fn timer_expiry_with_empty_blank_records_missed() {
        let mut game = two_question_game(2);
        assert_eq!(game.tick(), None);
        assert_eq!(game.tick(), Some(CompletionReason::TimeUp));
        assert_eq!(game.records()[0].correctness, Correctness::Incorrect);
        assert_eq!(game.records()[0].answers.filled_count(), 0);

        let fresh = game.active_play().expect("second question active");
        assert_eq!(fresh.question_id(), 2);
        assert_eq!(fresh.time_left(), 2);

        place(&mut game, "slow", 0);
        assert!(game.next());
        assert_eq!(game.state(), SessionState::Finished);

        let Screen::Finished(report) = game.screen() else {
            panic!("expected results screen");
        };
        assert_eq!(report.score, 1);
        assert_eq!(report.entries[0].blank_marks(), vec![BlankMark::Missed]);
    }

    #[test]
    fn partial_timeout_keeps_placed_words() {
        let mut game = GameController::new(GameOptions { timer_secs: 1 });
        game.start(vec![Question {
            question_id: 10,
            text: format!("{BLANK_MARKER} and {BLANK_MARKER} and {BLANK_MARKER}"),
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: vec!["a".into(), "b".into(), "c".into()],
            answer_type: String::new(),
            question_type: String::new(),
        }])
        .expect("valid set");
        place(&mut game, "a", 0);
        assert_eq!(game.tick(), Some(CompletionReason::TimeUp));
        let record = &game.records()[0];
        assert_eq!(record.answers.len() - record.answers.filled_count(), 2);
        assert_eq!(record.correctness, Correctness::Incorrect);
        assert_eq!(game.state(), SessionState::Finished);
    }

    #[test]
    fn unknown_submission_is_a_lookup_miss() {
        let mut game = two_question_game(30);
        assert_eq!(
            game.submit_answer(99, vec![None]),
            Err(LookupMiss::UnknownAnswerRecord(99))
        );
        assert_eq!(game.current_index(), 0);
        assert_eq!(game.state(), SessionState::Playing);
    }

    #[test]
    fn submission_for_inactive_question_is_refused() {
        let mut game = two_question_game(30);
        assert_eq!(
            game.submit_answer(2, vec![Some("slow".to_string())]),
            Err(LookupMiss::NotActive(2))
        );
        assert_eq!(game.state(), SessionState::Playing);
        assert_eq!(game.current_index(), 0);
        assert_eq!(game.records()[0].correctness, Correctness::Unknown);
        assert_eq!(game.records()[1].correctness, Correctness::Unknown);
        assert_eq!(game.active_play().map(QuestionPlay::question_id), Some(1));
    }

    #[test]
    fn direct_submission_moves_active_play_forward() {
        let mut game = two_question_game(30);
        game.submit_answer(1, vec![Some("quick".to_string())])
            .expect("active question accepts an answer");
        assert_eq!(game.records()[0].correctness, Correctness::Correct);
        assert_eq!(game.active_play().map(QuestionPlay::question_id), Some(2));
        assert_eq!(game.current_question().map(|q| q.question_id), Some(2));
    }

    #[test]
    fn resubmission_after_finish_is_refused() {
        let mut game = two_question_game(30);
        place(&mut game, "quick", 0);
        assert!(game.next());
        place(&mut game, "slow", 0);
        assert!(game.next());
        assert_eq!(game.state(), SessionState::Finished);

        assert_eq!(
            game.submit_answer(1, vec![Some("slow".to_string())]),
            Err(LookupMiss::NotActive(1))
        );
        assert_eq!(game.state(), SessionState::Finished);
        assert_eq!(game.records()[0].correctness, Correctness::Correct);
        assert_eq!(game.score(), 2);
        assert!(game.active_play().is_none());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut game = two_question_game(30);
        let stale = Completion {
            question_id: 2,
            answers: vec![Some("slow".to_string())],
            reason: CompletionReason::Submitted,
        };
        assert!(game.complete_question(stale).is_err());
        assert_eq!(game.current_index(), 0);
        assert_eq!(game.records()[1].correctness, Correctness::Unknown);
    }

    #[test]
    fn events_after_finish_are_rejected() {
        let mut game = two_question_game(1);
        game.tick();
        game.tick();
        assert_eq!(game.state(), SessionState::Finished);
        assert_eq!(
            game.drag_start("option-quick"),
            Err(PlacementRejected::NoActiveQuestion)
        );
        assert_eq!(game.tick(), None);
        assert!(!game.next());
    }

    #[test]
    fn restart_discards_previous_run() {
        let mut game = two_question_game(30);
        place(&mut game, "quick", 0);
        game.next();
        game.restart();
        assert_eq!(game.state(), SessionState::Loading);
        assert!(game.records().is_empty());
        assert!(game.questions().is_empty());
        assert!(game.active_play().is_none());
        assert_eq!(game.options().timer_secs, 30);
    }

    #[tokio::test]
    async fn load_from_inline_source_starts_playing() {
        let mut game = GameController::new(GameOptions::default());
        let source = QuestionSource::Inline(vec![make_question(5, &["quick"], "quick")]);
        game.load(&source).await.expect("inline source loads");
        assert_eq!(game.state(), SessionState::Playing);
        assert_eq!(game.current_question().map(|q| q.question_id), Some(5));
    }

    #[tokio::test]
    async fn failed_load_keeps_loading_state() {
        let mut game = GameController::new(GameOptions::default());
        let missing = std::env::temp_dir().join("fill-blank-quiz-missing/questions.json");
        let result = game.load(&QuestionSource::File(missing)).await;
        assert!(matches!(result, Err(DataError::Io { .. })));
        assert_eq!(game.state(), SessionState::Loading);
        assert!(game.last_error().is_some());
    }
}
