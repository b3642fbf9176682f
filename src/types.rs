use serde::{Deserialize, Serialize};

use crate::results::ResultsReport;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "questionId")]
    pub question_id: i64,
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: Vec<String>,
    #[serde(rename = "answerType", default)]
    pub answer_type: String,
    #[serde(rename = "questionType", default)]
    pub question_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Correctness {
    #[default]
    Unknown,
    Correct,
    Incorrect,
}

impl Correctness {
    pub fn from_graded(correct: bool) -> Self {
        if correct {
            Self::Correct
        } else {
            Self::Incorrect
        }
    }

    pub fn is_correct(self) -> bool {
        self == Self::Correct
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    Playing,
    Finished,
}

/// What a play instance hands back to the controller once its question is done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub question_id: i64,
    pub answers: Vec<Option<String>>,
    pub reason: CompletionReason,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    Submitted,
    TimeUp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SentencePart {
    Text {
        text: String,
    },
    Blank {
        index: usize,
        id: String,
        word: Option<String>,
        filled: bool,
        hovered: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WordOptionView {
    pub id: String,
    pub word: String,
    pub used: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayView {
    #[serde(rename = "questionId")]
    pub question_id: i64,
    #[serde(rename = "questionNumber")]
    pub question_number: usize,
    #[serde(rename = "totalQuestions")]
    pub total_questions: usize,
    #[serde(rename = "timeLeft")]
    pub time_left: u32,
    #[serde(rename = "timeProgress")]
    pub time_progress: f32,
    pub prompt: String,
    pub sentence: Vec<SentencePart>,
    pub options: Vec<WordOptionView>,
    #[serde(rename = "activeItem")]
    pub active_item: Option<String>,
    #[serde(rename = "overlayWord")]
    pub overlay_word: Option<String>,
    #[serde(rename = "canSubmit")]
    pub can_submit: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Loading { error: Option<String> },
    Playing(PlayView),
    Finished(ResultsReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_decodes_camel_case_fields() {
        let raw = r#"{
            "questionId": 7,
            "question": "The _____________ fox.",
            "options": ["quick", "slow"],
            "correctAnswer": ["quick"],
            "answerType": "options",
            "questionType": "text"
        }"#;
        let question: Question = serde_json::from_str(raw).expect("question should decode");
        assert_eq!(question.question_id, 7);
        assert_eq!(question.correct_answer, vec!["quick".to_string()]);
        assert_eq!(question.answer_type, "options");
    }

    #[test]
    fn metadata_fields_are_optional() {
        let raw = r#"{"questionId":1,"question":"a","options":[],"correctAnswer":[]}"#;
        let question: Question = serde_json::from_str(raw).expect("question should decode");
        assert!(question.answer_type.is_empty());
        assert!(question.question_type.is_empty());
    }

    #[test]
    fn correctness_from_grade() {
        assert_eq!(Correctness::from_graded(true), Correctness::Correct);
        assert_eq!(Correctness::from_graded(false), Correctness::Incorrect);
        assert!(!Correctness::Unknown.is_correct());
    }

    #[test]
    fn loading_screen_serializes_with_tag() {
        let value = serde_json::to_value(Screen::Loading { error: None }).expect("serialize");
        assert_eq!(value["screen"], "loading");
        assert!(value["error"].is_null());
    }
}
