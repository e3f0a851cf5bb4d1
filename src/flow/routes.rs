//! REST endpoints and per-session WebSocket for the diagnostic flow.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::controller::FlowSnapshot;
use super::session::FlowSession;
use super::state::ViewState;
use super::store::SessionStore;
use crate::error::FlowError;
use crate::quiz::{AnswerValue, QuizStep, area_law_questions};
use crate::services::{TierAction, catalog, pricing_tiers};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
}

/// Build the flow REST + WebSocket routes.
pub fn flow_routes(store: Arc<SessionStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/health", get(health))
        .route("/api/quiz/questions", get(list_questions))
        .route("/api/services", get(list_services))
        .route("/api/pricing", get(list_pricing))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/ws", get(ws_handler))
        .route("/api/sessions/{id}/navigate", post(navigate))
        .route("/api/sessions/{id}/back", post(back))
        .route("/api/sessions/{id}/quiz/answer", post(quiz_answer))
        .route("/api/sessions/{id}/quiz/next", post(quiz_next))
        .route("/api/sessions/{id}/quiz/previous", post(quiz_previous))
        .route("/api/sessions/{id}/quiz/redo", post(quiz_redo))
        .route("/api/sessions/{id}/services/select", post(select_service))
        .route("/api/sessions/{id}/pricing/{tier_id}", post(apply_tier))
        .route("/api/sessions/{id}/register", post(register))
        .route("/api/sessions/{id}/handover/acknowledge", post(acknowledge))
        .route("/api/sessions/{id}/chat/open", post(open_chat))
        .route("/api/sessions/{id}/chat/close", post(close_chat))
        .route("/api/sessions/{id}/chat/messages", post(send_chat))
        .route("/api/sessions/{id}/notice/dismiss", post(dismiss_notice))
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

/// A flow error rendered as `{"error": ...}` with a matching status.
pub struct ApiError(FlowError);

impl From<FlowError> for ApiError {
    fn from(e: FlowError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            FlowError::SessionNotFound { .. }
            | FlowError::UnknownService { .. }
            | FlowError::UnknownTier { .. } => StatusCode::NOT_FOUND,
            FlowError::AlreadyProcessing => StatusCode::CONFLICT,
            FlowError::WrongView { .. }
            | FlowError::MissingPayload { .. }
            | FlowError::NotNavigable { .. }
            | FlowError::InvalidEmail
            | FlowError::ChatClosed
            | FlowError::Quiz(_) => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(serde_json::json!({"error": self.0.to_string()})),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn find_session(state: &AppState, id: &str) -> Result<Arc<FlowSession>, ApiError> {
    let not_found = || FlowError::SessionNotFound { id: id.to_string() };
    let session_id = Uuid::parse_str(id).map_err(|_| not_found())?;
    state.store.get(session_id).await.ok_or_else(not_found).map_err(ApiError)
}

// ── Health & catalog ────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ciberabogados"
    }))
}

async fn list_questions() -> impl IntoResponse {
    Json(area_law_questions().to_vec())
}

async fn list_services() -> impl IntoResponse {
    Json(catalog())
}

async fn list_pricing() -> impl IntoResponse {
    Json(pricing_tiers())
}

// ── Sessions ────────────────────────────────────────────────────────────

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.store.create().await;
    (StatusCode::CREATED, Json(session.snapshot().await))
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.snapshot().await))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let removed = match Uuid::parse_str(&id) {
        Ok(session_id) => state.store.remove(session_id).await,
        Err(_) => false,
    };
    if removed {
        StatusCode::NO_CONTENT.into_response()
    } else {
        ApiError(FlowError::SessionNotFound { id }).into_response()
    }
}

#[derive(Deserialize)]
struct NavigateRequest {
    target: ViewState,
}

async fn navigate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NavigateRequest>,
) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.navigate(body.target).await?))
}

async fn back(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.back().await?))
}

// ── Quiz ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AnswerRequest {
    question_id: String,
    value: AnswerValue,
}

async fn quiz_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AnswerRequest>,
) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.answer(&body.question_id, body.value).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum StepOutcome {
    Advanced,
    Blocked,
    Submitted,
    Empty,
}

#[derive(Serialize)]
struct NextResponse {
    step: StepOutcome,
    session: FlowSnapshot,
}

async fn quiz_next(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<NextResponse> {
    let session = find_session(&state, &id).await?;
    let (step, snapshot) = session.quiz_next().await?;
    let step = match step {
        QuizStep::Advanced(_) => StepOutcome::Advanced,
        QuizStep::Blocked => StepOutcome::Blocked,
        QuizStep::Submitted(_) => StepOutcome::Submitted,
        QuizStep::Empty => StepOutcome::Empty,
    };
    Ok(Json(NextResponse {
        step,
        session: snapshot,
    }))
}

async fn quiz_previous(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.quiz_previous().await?))
}

async fn quiz_redo(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.redo_diagnosis().await?))
}

// ── Services, pricing & registration ────────────────────────────────────

#[derive(Deserialize)]
struct SelectRequest {
    service_id: String,
}

async fn select_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SelectRequest>,
) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.select_service(&body.service_id).await?))
}

#[derive(Serialize)]
struct TierResponse {
    action: TierAction,
    session: FlowSnapshot,
}

async fn apply_tier(
    State(state): State<AppState>,
    Path((id, tier_id)): Path<(String, String)>,
) -> ApiResult<TierResponse> {
    let session = find_session(&state, &id).await?;
    let (action, snapshot) = session.apply_tier(&tier_id).await?;
    Ok(Json(TierResponse {
        action,
        session: snapshot,
    }))
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
}

async fn register(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.register(&body.email).await?))
}

async fn acknowledge(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.acknowledge().await?))
}

// ── Chat & notices ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OpenChatRequest {
    #[serde(default)]
    initial_message: Option<String>,
}

async fn open_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<OpenChatRequest>>,
) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    let initial_message = body.and_then(|Json(b)| b.initial_message);
    Ok(Json(session.open_chat(initial_message.as_deref()).await?))
}

async fn close_chat(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.close_chat().await?))
}

#[derive(Deserialize)]
struct ChatMessageRequest {
    text: String,
}

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ChatMessageRequest>,
) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.send_chat(&body.text).await?))
}

async fn dismiss_notice(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<FlowSnapshot> {
    let session = find_session(&state, &id).await?;
    Ok(Json(session.dismiss_notice().await?))
}

// ── WebSocket ───────────────────────────────────────────────────────────

/// Server → client WebSocket message.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsMessage {
    Snapshot { session: FlowSnapshot },
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match find_session(&state, &id).await {
        Ok(session) => {
            info!(session_id = %session.id(), "WebSocket client connecting");
            ws.on_upgrade(move |socket| handle_socket(socket, session))
        }
        Err(e) => e.into_response(),
    }
}

async fn send_snapshot(socket: &mut WebSocket, session: FlowSnapshot) -> bool {
    match serde_json::to_string(&WsMessage::Snapshot { session }) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize snapshot");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, session: Arc<FlowSession>) {
    let session_id = session.id();

    // Subscribe before the initial sync so no change is missed in between
    let mut rx = session.subscribe();
    if !send_snapshot(&mut socket, session.snapshot().await).await {
        warn!(session_id = %session_id, "Failed to send initial snapshot, client disconnected");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if !send_snapshot(&mut socket, snapshot).await {
                            debug!(session_id = %session_id, "Client disconnected during send");
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(session_id = %session_id, missed = n, "WS client lagged behind broadcast");
                        if !send_snapshot(&mut socket, session.snapshot().await).await {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!(session_id = %session_id, "Broadcast channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(session_id = %session_id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!(session_id = %session_id, "WebSocket connection closed");
}
