use std::collections::HashSet;

use crate::constants::BLANK_MARKER;
use crate::error::DataError;
use crate::types::Question;

pub fn count_blanks(text: &str) -> usize {
    text.matches(BLANK_MARKER).count()
}

/// Literal segments around the blanks. Always one more segment than blanks.
pub fn split_sentence(text: &str) -> Vec<&str> {
    text.split(BLANK_MARKER).collect()
}

pub fn validate_question(question: &Question) -> Result<(), DataError> {
    let invalid = |reason: String| DataError::InvalidQuestion {
        question_id: question.question_id,
        reason,
    };

    let blanks = count_blanks(&question.text);
    if blanks == 0 {
        return Err(invalid("sentence has no blanks".to_string()));
    }
    if blanks != question.correct_answer.len() {
        return Err(invalid(format!(
            "{blanks} blanks but {} correct answers",
            question.correct_answer.len()
        )));
    }

    for warning in option_warnings(question) {
        log::warn!("[sentence] question {}: {warning}", question.question_id);
    }
    Ok(())
}

/// Problems that leave a question playable but odd: repeated options share one
/// drag id, and a missing correct word makes the question impossible to get right.
pub fn option_warnings(question: &Question) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();
    for option in &question.options {
        if !seen.insert(option.as_str()) {
            warnings.push(format!("option {option:?} is listed twice"));
        }
    }
    for missing in question
        .correct_answer
        .iter()
        .filter(|word| !seen.contains(word.as_str()))
    {
        warnings.push(format!("correct answer {missing:?} is not among the options"));
    }
    warnings
}

pub fn validate_question_set(questions: &[Question]) -> Result<(), DataError> {
    if questions.is_empty() {
        return Err(DataError::Empty);
    }
    let mut ids = HashSet::new();
    for question in questions {
        if !ids.insert(question.question_id) {
            return Err(DataError::DuplicateQuestionId(question.question_id));
        }
        validate_question(question)?;
    }
    Ok(())
}
