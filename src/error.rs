use thiserror::Error;

/// Anything that keeps a question set from loading. Fatal to session start.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("question source request failed: {0}")]
    Transport(String),
    #[error("question source answered with status {0}")]
    Status(u16),
    #[error("question set is malformed: {0}")]
    Malformed(String),
    #[error("no questions found")]
    Empty,
    #[error("question {question_id} is invalid: {reason}")]
    InvalidQuestion { question_id: i64, reason: String },
    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(i64),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

impl From<reqwest::Error> for DataError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        Self::Malformed(error.to_string())
    }
}

/// A drop or drag that has no effect. Logged, never shown to the player.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlacementRejected {
    #[error("target {0} is not a blank")]
    NotABlank(String),
    #[error("no drop target")]
    NoTarget,
    #[error("unknown target id {0}")]
    UnknownTarget(String),
    #[error("blank {index} is out of range (blanks: {len})")]
    BlankOutOfRange { index: usize, len: usize },
    #[error("blank {0} is already filled")]
    BlankFilled(usize),
    #[error("unknown option id {0}")]
    UnknownOption(String),
    #[error("word {0:?} is already placed in another blank")]
    WordAlreadyPlaced(String),
    #[error("option {0} cannot be dragged")]
    OptionUnavailable(String),
    #[error("no active drag for {0}")]
    NotDragging(String),
    #[error("no active question")]
    NoActiveQuestion,
}

/// A submission naming a question the session does not know.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LookupMiss {
    #[error("no answer record for question {0}")]
    UnknownAnswerRecord(i64),
    #[error("no question with id {0}")]
    UnknownQuestion(i64),
    #[error("question {0} is not the active question")]
    NotActive(i64),
    #[error("question {0} was already answered")]
    AlreadyAnswered(i64),
}
