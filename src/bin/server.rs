use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use maze_escape_engine::constants::{TICK_MS, TICK_SECS};
use maze_escape_engine::engine::Simulation;
use maze_escape_engine::server_protocol::{parse_client_message, ParsedClientMessage};
use maze_escape_engine::server_utils::{normalize_level, normalize_seed, parse_port};
use maze_escape_engine::telemetry::{emit_log, LogContext, LogLevel};
use maze_escape_engine::types::MoveIntents;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

struct SessionContext {
    tx: mpsc::Sender<OutboundMessage>,
    game: Option<Simulation>,
    intents: MoveIntents,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

#[derive(Default)]
struct ServerState {
    sessions: HashMap<String, SessionContext>,
}

#[tokio::main]
async fn main() {
    let port = parse_port(std::env::var("PORT").ok().as_deref());

    let state: SharedState = Arc::new(Mutex::new(ServerState::default()));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        emit_log(
            LogLevel::Info,
            "static_dir_resolved",
            LogContext::default(),
            json!({ "path": static_dir.to_string_lossy() }),
        );
        app.fallback_service(ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)))
    } else {
        emit_log(
            LogLevel::Warn,
            "static_dir_missing",
            LogContext::default(),
            json!({ "hint": "set STATIC_DIR to a directory containing index.html" }),
        );
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            emit_log(
                LogLevel::Error,
                "bind_failed",
                LogContext::default(),
                json!({ "addr": bind_addr, "error": error.to_string() }),
            );
            std::process::exit(1);
        }
    };

    emit_log(
        LogLevel::Info,
        "server_listening",
        LogContext::default(),
        json!({ "port": port }),
    );
    if let Err(error) = axum::serve(listener, app).await {
        emit_log(
            LogLevel::Error,
            "server_failed",
            LogContext::default(),
            json!({ "error": error.to_string() }),
        );
        std::process::exit(1);
    }
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("static"), PathBuf::from("dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let session_id = make_id("session");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard.sessions.insert(
            session_id.clone(),
            SessionContext {
                tx: tx.clone(),
                game: None,
                intents: MoveIntents::default(),
            },
        );
    }
    emit_log(
        LogLevel::Info,
        "session_connected",
        LogContext {
            session: Some(session_id.as_str()),
            ..LogContext::default()
        },
        Value::Null,
    );

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => ws_sender.send(Message::Text(payload.into())).await,
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

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                let mut guard = state.lock().await;
                handle_client_message(&mut guard, &session_id, raw.as_str());
            }
            Message::Binary(raw) => {
                let mut guard = state.lock().await;
                match std::str::from_utf8(&raw) {
                    Ok(text) => handle_client_message(&mut guard, &session_id, text),
                    Err(_) => send_error(&mut guard, &session_id, "invalid utf8 message"),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        disconnect_session(&mut guard, &session_id, None);
    }
    drop(tx);
    let _ = writer.await;
}

fn handle_client_message(state: &mut ServerState, session_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error(state, session_id, "invalid message");
        return;
    };

    match message {
        ParsedClientMessage::Start { level, seed } => {
            let level = normalize_level(level);
            let seed = normalize_seed(seed, rand::rng().random::<u32>());
            start_game(state, session_id, level, seed);
        }
        ParsedClientMessage::Input { intents } => {
            if let Some(session) = state.sessions.get_mut(session_id) {
                session.intents = intents;
            }
        }
        ParsedClientMessage::Ping { t } => {
            send_to_session(
                state,
                session_id,
                &json!({
                    "type": "pong",
                    "t": t,
                    "serverTime": now_ms(),
                }),
                QueuePolicy::DropOnFull,
            );
        }
    }
}

fn start_game(state: &mut ServerState, session_id: &str, level: u32, seed: u32) {
    let context = LogContext {
        session: Some(session_id),
        seed: Some(seed),
        ..LogContext::default()
    };
    let game = match Simulation::new(level, seed) {
        Ok(game) => game,
        Err(error) => {
            emit_log(
                LogLevel::Error,
                "generation_failed",
                context,
                json!({ "level": level, "error": error.to_string() }),
            );
            send_error(state, session_id, "could not generate level");
            return;
        }
    };

    let world = game.world_init();
    let Some(session) = state.sessions.get_mut(session_id) else {
        return;
    };
    session.game = Some(game);
    session.intents = MoveIntents::default();

    emit_log(
        LogLevel::Info,
        "game_started",
        context,
        json!({ "level": level }),
    );
    send_to_session(
        state,
        session_id,
        &json!({
            "type": "world_init",
            "level": level,
            "seed": seed,
            "world": world,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_sessions(&mut guard);
        }
    });
}

fn tick_sessions(state: &mut ServerState) {
    let mut failed_sessions = Vec::new();

    for (session_id, session) in state.sessions.iter_mut() {
        let Some(game) = session.game.as_mut() else {
            continue;
        };
        let frame = game.tick(session.intents, TICK_SECS);
        let frame_message = json!({ "type": "frame", "frame": frame });
        let _ = session
            .tx
            .try_send(OutboundMessage::Text(frame_message.to_string()));

        if !game.is_ended() {
            continue;
        }
        let summary = game.build_summary();
        emit_log(
            LogLevel::Info,
            "game_finished",
            LogContext {
                session: Some(session_id.as_str()),
                seed: Some(summary.seed),
                tick: Some(summary.ticks),
                ..LogContext::default()
            },
            json!({
                "level": summary.level,
                "reason": summary.reason,
                "score": summary.score,
            }),
        );
        let over_message = json!({ "type": "game_over", "summary": summary });
        if session
            .tx
            .try_send(OutboundMessage::Text(over_message.to_string()))
            .is_err()
        {
            failed_sessions.push(session_id.clone());
        }
        session.game = None;
    }

    for session_id in failed_sessions {
        disconnect_session(state, &session_id, Some("send queue overflow"));
    }
}

fn send_to_session(state: &mut ServerState, session_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(session) = state.sessions.get(session_id) {
        session
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_session(state, session_id, Some("send queue overflow"));
    }
}

fn send_error(state: &mut ServerState, session_id: &str, message: &str) {
    send_to_session(
        state,
        session_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

fn disconnect_session(state: &mut ServerState, session_id: &str, close_reason: Option<&str>) {
    let Some(session) = state.sessions.remove(session_id) else {
        return;
    };
    if let Some(reason) = close_reason {
        let _ = session.tx.try_send(OutboundMessage::Close {
            code: 1013,
            reason: reason.to_string(),
        });
    }
    emit_log(
        LogLevel::Info,
        "session_closed",
        LogContext {
            session: Some(session_id),
            ..LogContext::default()
        },
        json!({
            "reason": close_reason,
            "inGame": session.game.is_some(),
        }),
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_session(capacity: usize) -> (ServerState, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        let mut state = ServerState::default();
        state.sessions.insert(
            "session_1".to_string(),
            SessionContext {
                tx,
                game: None,
                intents: MoveIntents::default(),
            },
        );
        (state, rx)
    }

    fn next_json(rx: &mut mpsc::Receiver<OutboundMessage>) -> Value {
        match rx.try_recv().expect("a message should be queued") {
            OutboundMessage::Text(text) => serde_json::from_str(&text).expect("valid json"),
            OutboundMessage::Close { .. } => panic!("unexpected close"),
        }
    }

    #[test]
    fn start_sends_world_init_and_ticks_send_frames() {
        let (mut state, mut rx) = state_with_session(16);
        handle_client_message(&mut state, "session_1", r#"{"type":"start","level":2,"seed":5}"#);

        let init = next_json(&mut rx);
        assert_eq!(init["type"], "world_init");
        assert_eq!(init["level"], 2);
        assert_eq!(init["seed"], 5);
        assert_eq!(init["world"]["rows"], 41);

        handle_client_message(&mut state, "session_1", r#"{"type":"input","right":true}"#);
        assert!(state.sessions["session_1"].intents.right);

        tick_sessions(&mut state);
        let frame = next_json(&mut rx);
        assert_eq!(frame["type"], "frame");
        assert_eq!(frame["frame"]["tick"], 1);
        assert_eq!(frame["frame"]["enemies"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn invalid_messages_get_error_reply() {
        let (mut state, mut rx) = state_with_session(4);
        handle_client_message(&mut state, "session_1", "{nope");
        let reply = next_json(&mut rx);
        assert_eq!(reply["type"], "error");
        assert!(state.sessions.contains_key("session_1"));
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let (mut state, mut rx) = state_with_session(4);
        handle_client_message(&mut state, "session_1", r#"{"type":"ping","t":3.5}"#);
        let reply = next_json(&mut rx);
        assert_eq!(reply["type"], "pong");
        assert_eq!(reply["t"], 3.5);
    }

    #[test]
    fn ticks_without_game_send_nothing() {
        let (mut state, mut rx) = state_with_session(4);
        tick_sessions(&mut state);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_queue_disconnects_on_critical_messages() {
        let (mut state, _rx) = state_with_session(1);
        send_error(&mut state, "session_1", "first");
        assert!(state.sessions.contains_key("session_1"));
        send_error(&mut state, "session_1", "second");
        assert!(!state.sessions.contains_key("session_1"));
    }
}
