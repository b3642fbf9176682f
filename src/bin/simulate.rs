use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use clap::{Parser, ValueEnum};
use fill_blank_quiz::constants::{clamp_timer_secs, DEFAULT_API_URL, TIMER_DURATION_SECS};
use fill_blank_quiz::controller::{GameController, GameOptions};
use fill_blank_quiz::drag::{blank_target_id, option_item_id, DropTarget};
use fill_blank_quiz::logging::{self, emit_event, now_ms};
use fill_blank_quiz::question_source::QuestionSource;
use fill_blank_quiz::results::ResultsReport;
use fill_blank_quiz::types::{CompletionReason, Question, SessionState};
use log::Level;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays a fill-in-the-blank session headlessly")]
struct Cli {
    /// Local question file ({ "questions": [...] }).
    #[arg(long, conflicts_with = "url")]
    questions: Option<PathBuf>,
    /// Question source endpoint.
    #[arg(long)]
    url: Option<String>,
    #[arg(long, value_enum, default_value_t = Strategy::Correct)]
    strategy: Strategy,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    timer_secs: Option<u32>,
    /// Print the results screen as text instead of JSON.
    #[arg(long)]
    text: bool,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum Strategy {
    /// Places every expected word and presses Next.
    Correct,
    /// Fills each blank with the first unused option.
    FirstAvailable,
    /// Fills blanks with shuffled options.
    Random,
    /// Fills only the first blank and waits for the timer.
    Partial,
    /// Never touches a word; every question times out.
    Idle,
}

#[derive(Clone, Debug, Serialize)]
struct QuestionOutcome {
    #[serde(rename = "questionId")]
    question_id: i64,
    reason: CompletionReason,
    ticks: u32,
    placed: usize,
    rejected: usize,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    strategy: Strategy,
    seed: u64,
    #[serde(rename = "timerSecs")]
    timer_secs: u32,
    score: usize,
    total: usize,
    #[serde(rename = "timedOut")]
    timed_out: usize,
    outcomes: Vec<QuestionOutcome>,
    report: ResultsReport,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    let source = resolve_source(&cli);
    let seed = cli.seed.unwrap_or_else(now_ms);
    let timer_secs = clamp_timer_secs(cli.timer_secs.unwrap_or(TIMER_DURATION_SECS));
    let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let run_id = default_run_id(seed, now_ms());

    emit_event(
        Level::Info,
        "run_started",
        json!({
            "runId": run_id,
            "source": source.describe(),
            "strategy": cli.strategy,
            "seed": seed,
            "timerSecs": timer_secs,
        }),
    );

    let mut controller = GameController::new(GameOptions { timer_secs });
    if let Err(error) = controller.load(&source).await {
        emit_event(
            Level::Error,
            "load_failed",
            json!({ "runId": run_id, "error": error.to_string() }),
        );
        std::process::exit(2);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let outcomes = play_session(&mut controller, cli.strategy, &mut rng);
    let report = ResultsReport::build(controller.questions(), controller.records());

    if cli.text {
        print!("{}", report.render_text());
    } else {
        println!(
            "{}",
            serde_json::to_string(&report).context("results should serialize")?
        );
    }

    let summary = RunSummary {
        run_id: run_id.clone(),
        started_at,
        finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        strategy: cli.strategy,
        seed,
        timer_secs,
        score: report.score,
        total: report.total,
        timed_out: outcomes
            .iter()
            .filter(|outcome| outcome.reason == CompletionReason::TimeUp)
            .count(),
        outcomes,
        report,
    };

    if let Some(path) = cli.summary_out.as_ref() {
        write_summary(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
    }

    emit_event(
        Level::Info,
        "run_finished",
        json!({
            "runId": run_id,
            "score": summary.score,
            "total": summary.total,
            "timedOut": summary.timed_out,
        }),
    );
    Ok(())
}

fn resolve_source(cli: &Cli) -> QuestionSource {
    if let Some(path) = cli.questions.as_ref() {
        return QuestionSource::File(path.clone());
    }
    QuestionSource::http(cli.url.clone().unwrap_or_else(|| DEFAULT_API_URL.to_string()))
}

/// Drives the controller through the same events a browser would send.
fn play_session(
    controller: &mut GameController,
    strategy: Strategy,
    rng: &mut StdRng,
) -> Vec<QuestionOutcome> {
    let mut outcomes = Vec::new();
    while controller.state() == SessionState::Playing {
        let Some(question) = controller.current_question().cloned() else {
            break;
        };
        emit_event(
            Level::Debug,
            "question_started",
            json!({ "questionId": question.question_id }),
        );
        let outcome = play_question(controller, &question, strategy, rng);
        emit_event(
            Level::Debug,
            "question_finished",
            json!({
                "questionId": outcome.question_id,
                "reason": outcome.reason,
                "ticks": outcome.ticks,
            }),
        );
        outcomes.push(outcome);
    }
    outcomes
}

fn play_question(
    controller: &mut GameController,
    question: &Question,
    strategy: Strategy,
    rng: &mut StdRng,
) -> QuestionOutcome {
    let words = choose_words(question, strategy, rng);
    let mut placed = 0;
    let mut rejected = 0;
    for (blank, word) in words.iter().enumerate() {
        let Some(word) = word else {
            continue;
        };
        if drag_word(controller, word, blank) {
            placed += 1;
        } else {
            rejected += 1;
        }
    }

    if controller.next() {
        return QuestionOutcome {
            question_id: question.question_id,
            reason: CompletionReason::Submitted,
            ticks: 0,
            placed,
            rejected,
        };
    }

    let mut ticks = 0;
    loop {
        ticks += 1;
        if let Some(reason) = controller.tick() {
            return QuestionOutcome {
                question_id: question.question_id,
                reason,
                ticks,
                placed,
                rejected,
            };
        }
        if controller.active_play().is_none() {
            return QuestionOutcome {
                question_id: question.question_id,
                reason: CompletionReason::TimeUp,
                ticks,
                placed,
                rejected,
            };
        }
    }
}

fn choose_words(question: &Question, strategy: Strategy, rng: &mut StdRng) -> Vec<Option<String>> {
    let blanks = question.correct_answer.len();
    match strategy {
        Strategy::Correct => question.correct_answer.iter().cloned().map(Some).collect(),
        Strategy::FirstAvailable => (0..blanks)
            .map(|index| question.options.get(index).cloned())
            .collect(),
        Strategy::Random => {
            let mut pool = question.options.clone();
            pool.shuffle(rng);
            (0..blanks).map(|index| pool.get(index).cloned()).collect()
        }
        Strategy::Partial => (0..blanks)
            .map(|index| {
                if index == 0 {
                    question.correct_answer.first().cloned()
                } else {
                    None
                }
            })
            .collect(),
        Strategy::Idle => vec![None; blanks],
    }
}

fn drag_word(controller: &mut GameController, word: &str, blank: usize) -> bool {
    let item_id = option_item_id(word);
    if controller.drag_start(&item_id).is_err() {
        return false;
    }
    controller.drag_over(Some(&blank_target_id(blank)));
    controller
        .drag_end(&item_id, Some(&DropTarget::blank(blank)))
        .is_ok()
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
