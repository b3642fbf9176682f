use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::answer_store::AnswerRecord;
use crate::sentence::split_sentence;
use crate::types::Question;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankMark {
    Correct,
    Incorrect,
    Missed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewSegment {
    Text {
        text: String,
    },
    Blank {
        placed: Option<String>,
        expected: String,
        mark: BlankMark,
        hint: Option<String>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewEntry {
    pub number: usize,
    #[serde(rename = "questionId")]
    pub question_id: i64,
    pub correct: bool,
    pub segments: Vec<ReviewSegment>,
    #[serde(rename = "correctOrder", skip_serializing_if = "Option::is_none")]
    pub correct_order: Option<Vec<String>>,
}

impl ReviewEntry {
    pub fn blank_marks(&self) -> Vec<BlankMark> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                ReviewSegment::Blank { mark, .. } => Some(*mark),
                ReviewSegment::Text { .. } => None,
            })
            .collect()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ResultsReport {
    pub score: usize,
    pub total: usize,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    pub entries: Vec<ReviewEntry>,
}

impl ResultsReport {
    /// Read-only reconstruction of every answered sentence.
    pub fn build(questions: &[Question], records: &[AnswerRecord]) -> Self {
        let score = records
            .iter()
            .filter(|record| record.correctness.is_correct())
            .count();

        let entries = questions
            .iter()
            .enumerate()
            .filter_map(|(index, question)| {
                let record = records
                    .iter()
                    .find(|record| record.question_id == question.question_id)?;
                Some(review_question(index + 1, question, record))
            })
            .collect();

        Self {
            score,
            total: questions.len(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = format!("Quiz Results\nYour Score: {} out of {}\n", self.score, self.total);
        for entry in &self.entries {
            out.push_str(&format!(
                "\nQuestion {} [{}]\n  ",
                entry.number,
                if entry.correct { "correct" } else { "incorrect" }
            ));
            for segment in &entry.segments {
                match segment {
                    ReviewSegment::Text { text } => out.push_str(text),
                    ReviewSegment::Blank {
                        placed, mark, hint, ..
                    } => {
                        match (mark, placed) {
                            (BlankMark::Correct, Some(word)) => out.push_str(&format!("[{word}]")),
                            (BlankMark::Incorrect, Some(word)) => {
                                out.push_str(&format!("[~{word}~]"))
                            }
                            _ => out.push_str("[(missed)]"),
                        }
                        if let Some(hint) = hint {
                            out.push_str(&format!(" ({hint})"));
                        }
                    }
                }
            }
            out.push('\n');
            if let Some(order) = &entry.correct_order {
                out.push_str(&format!("  Correct order: {}\n", order.join(", ")));
            }
        }
        out
    }
}

fn review_question(number: usize, question: &Question, record: &AnswerRecord) -> ReviewEntry {
    let parts = split_sentence(&question.text);
    let blanks = parts.len().saturating_sub(1);
    let mut segments = Vec::with_capacity(parts.len() + blanks);

    for (index, part) in parts.into_iter().enumerate() {
        segments.push(ReviewSegment::Text {
            text: part.to_string(),
        });
        if index >= blanks {
            continue;
        }
        let placed = record.answers.get(index).map(str::to_string);
        let expected = question
            .correct_answer
            .get(index)
            .cloned()
            .unwrap_or_default();
        let mark = match placed.as_deref() {
            None => BlankMark::Missed,
            Some(word) if word == expected => BlankMark::Correct,
            Some(_) => BlankMark::Incorrect,
        };
        segments.push(ReviewSegment::Blank {
            hint: (mark != BlankMark::Correct).then(|| expected.clone()),
            placed,
            expected,
            mark,
        });
    }

    let correct = record.correctness.is_correct();
    ReviewEntry {
        number,
        question_id: question.question_id,
        correct,
        segments,
        correct_order: (!correct).then(|| question.correct_answer.clone()),
    }
}
