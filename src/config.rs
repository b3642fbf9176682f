use std::path::PathBuf;

use crate::constants::{clamp_timer_secs, DEFAULT_API_URL, TIMER_DURATION_SECS};
use crate::controller::GameOptions;
use crate::question_source::QuestionSource;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub api_url: Option<String>,
    pub questions_path: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub timer_secs: u32,
    pub log_level: log::LevelFilter,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: parse_port(lookup("PORT").as_deref()),
            api_url: non_empty(lookup("QUIZ_API_URL")),
            questions_path: non_empty(lookup("QUESTIONS_PATH")).map(PathBuf::from),
            static_dir: non_empty(lookup("STATIC_DIR")).map(PathBuf::from),
            timer_secs: normalize_timer_secs(lookup("QUIZ_TIMER_SECS").as_deref()),
            log_level: parse_log_level(lookup("QUIZ_LOG").as_deref()),
        }
    }

    /// An explicit endpoint wins; otherwise a local question file; otherwise the default endpoint.
    pub fn question_source(&self) -> QuestionSource {
        if let Some(url) = &self.api_url {
            return QuestionSource::http(url.clone());
        }
        if let Some(path) = &self.questions_path {
            return QuestionSource::File(path.clone());
        }
        QuestionSource::http(DEFAULT_API_URL)
    }

    pub fn game_options(&self) -> GameOptions {
        GameOptions {
            timer_secs: self.timer_secs,
        }
    }
}

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(8080)
}

pub fn normalize_timer_secs(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map(|secs| clamp_timer_secs(secs.clamp(0, u32::MAX as i64) as u32))
        .unwrap_or(TIMER_DURATION_SECS)
}

pub fn parse_log_level(raw: Option<&str>) -> log::LevelFilter {
    raw.and_then(|value| value.trim().parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
