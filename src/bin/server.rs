use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fill_blank_quiz::config::ServerConfig;
use fill_blank_quiz::constants::TIMER_TICK_MS;
use fill_blank_quiz::controller::GameController;
use fill_blank_quiz::logging::{self, emit_event};
use fill_blank_quiz::protocol::{parse_client_message, ParsedClientMessage};
use fill_blank_quiz::question_source::{parse_question_set, QuestionSource};
use fill_blank_quiz::types::{QuestionSet, Screen, SessionState};
use futures_util::{SinkExt, StreamExt};
use log::Level;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
    open_sessions: Arc<AtomicUsize>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    Screen { screen: &'a Screen },
    Pong { t: f64 },
    Error { message: &'a str },
}

/// What the socket loop does after a client message has been applied.
#[derive(Debug, PartialEq)]
enum Reply {
    Screen,
    Pong(f64),
    Reload,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    logging::init(config.log_level);

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        open_sessions: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/data", get(question_data))
        .route("/ws", get(ws_handler))
        .with_state(state.clone());

    let app = if let Some(static_dir) = resolve_static_dir(state.config.static_dir.as_ref()) {
        let index_file = static_dir.join("index.html");
        log::info!("[server] static file root: {}", static_dir.to_string_lossy());
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        log::warn!("[server] static file root not found, serving api and websocket only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind server socket on {bind_addr}"))?;

    log::info!(
        "[server] listening on :{port}, questions from {}",
        state.config.question_source().describe()
    );
    axum::serve(listener, app)
        .await
        .context("server runtime failed")?;
    Ok(())
}

fn resolve_static_dir(configured: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join("index.html").is_file() {
            return Some(path.clone());
        }
    }

    let candidates = [PathBuf::from("dist"), PathBuf::from("web/dist")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "sessions": state.open_sessions.load(Ordering::Relaxed),
    }))
}

/// Serves the configured question file so this server can be its own question source.
async fn question_data(State(state): State<AppState>) -> Response {
    let Some(path) = state.config.questions_path.as_ref() else {
        return error_response(StatusCode::NOT_FOUND, "no question file configured");
    };
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            log::error!("[server] failed to read {}: {error}", path.display());
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "question file unreadable");
        }
    };
    match parse_question_set(&bytes) {
        Ok(questions) => Json(QuestionSet { questions }).into_response(),
        Err(error) => {
            log::error!("[server] question file {} is invalid: {error}", path.display());
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let session_id = make_id("session");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(64);
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    state.open_sessions.fetch_add(1, Ordering::Relaxed);
    let source = state.config.question_source();
    emit_event(
        Level::Info,
        "session_opened",
        json!({ "session": session_id, "source": source.describe() }),
    );

    let mut controller = GameController::new(state.config.game_options());
    send_screen(&tx, &controller);
    load_session(&mut controller, &source, &session_id).await;
    send_screen(&tx, &controller);

    let mut countdown = tokio::time::interval(Duration::from_millis(TIMER_TICK_MS));
    countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
    countdown.reset();
    let mut active_question = active_question_id(&controller);
    let mut finish_reported = false;

    loop {
        let mut reloaded = false;
        tokio::select! {
            received = ws_receiver.next() => {
                let Some(Ok(message)) = received else {
                    break;
                };
                let raw = match message {
                    Message::Text(raw) => raw.to_string(),
                    Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                        Ok(text) => text,
                        Err(_) => {
                            send_message(&tx, &ServerMessage::Error { message: "invalid utf8 message" });
                            continue;
                        }
                    },
                    Message::Close(_) => break,
                    _ => continue,
                };
                let Some(parsed) = parse_client_message(&raw) else {
                    send_message(&tx, &ServerMessage::Error { message: "invalid message" });
                    continue;
                };
                match apply_client_message(&mut controller, parsed) {
                    Reply::Screen => send_screen(&tx, &controller),
                    Reply::Pong(t) => send_message(&tx, &ServerMessage::Pong { t }),
                    Reply::Reload => {
                        finish_reported = false;
                        send_screen(&tx, &controller);
                        load_session(&mut controller, &source, &session_id).await;
                        send_screen(&tx, &controller);
                        reloaded = true;
                    }
                }
            }
            _ = countdown.tick() => {
                if controller.state() == SessionState::Playing {
                    controller.tick();
                    send_screen(&tx, &controller);
                }
            }
        }

        if countdown_needs_reset(&mut active_question, &controller, reloaded) {
            countdown.reset();
        }
        if controller.state() == SessionState::Finished && !finish_reported {
            finish_reported = true;
            emit_event(
                Level::Info,
                "session_finished",
                json!({
                    "session": session_id,
                    "score": controller.score(),
                    "total": controller.questions().len(),
                }),
            );
        }
    }

    let _ = tx.try_send(OutboundMessage::Close {
        code: 1000,
        reason: "session closed".to_string(),
    });
    drop(tx);
    let _ = writer.await;
    state.open_sessions.fetch_sub(1, Ordering::Relaxed);
    emit_event(
        Level::Info,
        "session_closed",
        json!({ "session": session_id, "state": controller.state() }),
    );
}

async fn load_session(controller: &mut GameController, source: &QuestionSource, session_id: &str) {
    if let Err(error) = controller.load(source).await {
        emit_event(
            Level::Error,
            "session_load_failed",
            json!({ "session": session_id, "error": error.to_string() }),
        );
    }
}

/// Applies one client event to the session. Rejected drags and drops are logged where they are refused.
fn apply_client_message(controller: &mut GameController, message: ParsedClientMessage) -> Reply {
    match message {
        ParsedClientMessage::DragStart { item_id } => {
            let _ = controller.drag_start(&item_id);
        }
        ParsedClientMessage::DragOver { target_id } => {
            controller.drag_over(target_id.as_deref());
        }
        ParsedClientMessage::DragEnd { item_id, target } => {
            let _ = controller.drag_end(&item_id, target.as_ref());
        }
        ParsedClientMessage::DragCancel => controller.drag_cancel(),
        ParsedClientMessage::BlankClick { index } => {
            controller.click_blank(index);
        }
        ParsedClientMessage::Next => {
            controller.next();
        }
        ParsedClientMessage::PlayAgain => {
            controller.restart();
            return Reply::Reload;
        }
        ParsedClientMessage::Ping { t } => return Reply::Pong(t),
    }
    Reply::Screen
}

fn active_question_id(controller: &GameController) -> Option<i64> {
    controller.active_play().map(|play| play.question_id())
}

/// A freshly opened question gets a full first second, including one reopened by play again.
fn countdown_needs_reset(
    active_question: &mut Option<i64>,
    controller: &GameController,
    reloaded: bool,
) -> bool {
    let now_active = active_question_id(controller);
    let changed = reloaded || now_active != *active_question;
    *active_question = now_active;
    changed
}

fn send_screen(tx: &mpsc::Sender<OutboundMessage>, controller: &GameController) {
    let screen = controller.screen();
    send_message(tx, &ServerMessage::Screen { screen: &screen });
}

fn send_message(tx: &mpsc::Sender<OutboundMessage>, message: &ServerMessage<'_>) {
    match serde_json::to_string(message) {
        Ok(payload) => {
            if tx.try_send(OutboundMessage::Text(payload)).is_err() {
                log::warn!("[server] outbound queue full or closed, message dropped");
            }
        }
        Err(error) => log::error!("[server] failed to serialize outbound message: {error}"),
    }
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{prefix}_{seq}_{suffix}")
}
