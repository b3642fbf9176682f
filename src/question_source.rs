use std::path::PathBuf;

use crate::error::DataError;
use crate::sentence::validate_question_set;
use crate::types::{Question, QuestionSet};

/// Where a session gets its questions from. No retries on any variant.
#[derive(Clone, Debug)]
pub enum QuestionSource {
    Http { client: reqwest::Client, url: String },
    File(PathBuf),
    Inline(Vec<Question>),
}

impl QuestionSource {
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Http { url, .. } => url.clone(),
            Self::File(path) => path.display().to_string(),
            Self::Inline(questions) => format!("inline ({} questions)", questions.len()),
        }
    }

    pub async fn fetch(&self) -> Result<Vec<Question>, DataError> {
        let questions = match self {
            Self::Http { client, url } => fetch_http(client, url).await?,
            Self::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|error| DataError::Io {
                    path: path.display().to_string(),
                    message: error.to_string(),
                })?;
                parse_question_set(&bytes)?
            }
            Self::Inline(questions) => {
                validate_question_set(questions)?;
                questions.clone()
            }
        };
        log::info!(
            "[source] fetched {} questions from {}",
            questions.len(),
            self.describe()
        );
        Ok(questions)
    }
}

/// Decodes `{ "questions": [...] }` and checks every question.
pub fn parse_question_set(bytes: &[u8]) -> Result<Vec<Question>, DataError> {
    let set: QuestionSet = serde_json::from_slice(bytes)?;
    validate_question_set(&set.questions)?;
    Ok(set.questions)
}

async fn fetch_http(client: &reqwest::Client, url: &str) -> Result<Vec<Question>, DataError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DataError::Status(status.as_u16()));
    }
    let bytes = response.bytes().await?;
    parse_question_set(&bytes)
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::constants::BLANK_MARKER;

    fn sample_json() -> String {
        format!(
            r#"{{"questions":[
                {{"questionId":1,"question":"The {BLANK_MARKER} fox.","options":["quick","slow"],"correctAnswer":["quick"],"answerType":"options","questionType":"text"}},
                {{"questionId":2,"question":"A {BLANK_MARKER} turtle.","options":["quick","slow"],"correctAnswer":["slow"],"answerType":"options","questionType":"text"}}
            ]}}"#
        )
    }

    #[test]
    fn parses_valid_question_set() {
        let questions = parse_question_set(sample_json().as_bytes()).expect("valid set");
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].correct_answer, vec!["slow".to_string()]);
    }

    #[test]
    fn bundled_sample_questions_are_valid() {
        let questions = parse_question_set(include_bytes!("../data/questions.json"))
            .expect("sample question file should validate");
        assert!(!questions.is_empty());
    }

    #[test]
    fn missing_or_empty_list_is_rejected() {
        assert!(matches!(
            parse_question_set(br#"{"questions":[]}"#),
            Err(DataError::Empty)
        ));
        assert!(matches!(parse_question_set(br#"{}"#), Err(DataError::Empty)));
    }

    #[test]
    fn malformed_body_is_rejected() {
        assert!(matches!(
            parse_question_set(b"<html>not json</html>"),
            Err(DataError::Malformed(_))
        ));
        assert!(matches!(
            parse_question_set(br#"{"questions":[{"questionId":"x"}]}"#),
            Err(DataError::Malformed(_))
        ));
    }

    #[test]
    fn inconsistent_question_is_rejected() {
        let body = format!(
            r#"{{"questions":[{{"questionId":1,"question":"{BLANK_MARKER} {BLANK_MARKER}","options":["a"],"correctAnswer":["a"]}}]}}"#
        );
        assert!(matches!(
            parse_question_set(body.as_bytes()),
            Err(DataError::InvalidQuestion { question_id: 1, .. })
        ));
    }

    #[tokio::test]
    async fn file_source_reads_and_validates() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("fill-blank-quiz-{now}.json"));
        std::fs::write(&path, sample_json()).expect("write temp file");

        let questions = QuestionSource::File(path.clone())
            .fetch()
            .await
            .expect("file source loads");
        assert_eq!(questions.len(), 2);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn inline_source_is_validated() {
        let result = QuestionSource::Inline(Vec::new()).fetch().await;
        assert!(matches!(result, Err(DataError::Empty)));
    }

    async fn serve_once(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}/data")
    }

    #[tokio::test]
    async fn server_error_status_fails_the_load() {
        use axum::http::StatusCode;
        use axum::routing::get;

        let url = serve_once(
            axum::Router::new().route("/data", get(|| async { StatusCode::INTERNAL_SERVER_ERROR })),
        )
        .await;
        assert!(matches!(
            QuestionSource::http(url).fetch().await,
            Err(DataError::Status(500))
        ));
    }

    #[tokio::test]
    async fn empty_set_over_http_is_rejected() {
        use axum::routing::get;

        let url = serve_once(
            axum::Router::new().route("/data", get(|| async { r#"{"questions":[]}"# })),
        )
        .await;
        assert!(matches!(
            QuestionSource::http(url).fetch().await,
            Err(DataError::Empty)
        ));
    }

    #[tokio::test]
    async fn valid_set_over_http_loads() {
        use axum::routing::get;

        let body = sample_json();
        let url = serve_once(axum::Router::new().route("/data", get(move || async move { body })))
            .await;
        let questions = QuestionSource::http(url).fetch().await.expect("http source loads");
        assert_eq!(questions.len(), 2);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let source = QuestionSource::http("http://127.0.0.1:1/data");
        assert!(matches!(
            source.fetch().await,
            Err(DataError::Transport(_))
        ));
    }
}
