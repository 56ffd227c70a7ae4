//! HTTP API for the task agent.
//!
//! Endpoints (all under `/api`):
//!
//! - `POST   /api/agent/execute`: Run a task, stream progress as SSE
//! - `POST   /api/agent/run`: Run a task, return the buffered report
//! - `GET    /api/history`: Recent conversation history
//! - `DELETE /api/history`: Clear conversation history
//! - `GET    /api/tools`: Tool catalog
//! - `GET    /api/health`: Liveness probe

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};

use taskclaw_agent::{AgentStreamEvent, ChannelSink, RunReport, TaskAgent};
use taskclaw_core::history::HistoryEntry;
use taskclaw_core::tool::ToolDefinition;

/// Capacity of the per-request event channel between the run and the SSE body.
const STREAM_BUFFER: usize = 128;

pub type SharedAgent = Arc<TaskAgent>;

/// Build the `/api` router. Nest this under "/api" in the main router.
pub fn api_router() -> Router<SharedAgent> {
    Router::new()
        .route("/agent/execute", post(execute_handler))
        .route("/agent/run", post(run_handler))
        .route("/history", get(history_handler).delete(clear_history_handler))
        .route("/tools", get(list_tools_handler))
        .route("/health", get(health_handler))
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

impl TaskRequest {
    /// The task text, or a 400 when it is missing or blank.
    fn validated(self) -> Result<(String, Option<String>), ApiError> {
        match self.task {
            Some(task) if !task.trim().is_empty() => Ok((task, self.session_id)),
            _ => Err(bad_request("Task is required")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<HistoryEntry>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearHistoryResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDefinition>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// ── Agent ─────────────────────────────────────────────────────────────────

/// `POST /api/agent/execute`: run a task and stream its log as SSE.
///
/// The run happens on its own tokio task. A client that disconnects does
/// not cancel it; the remaining events are dropped.
async fn execute_handler(
    State(agent): State<SharedAgent>,
    Json(payload): Json<TaskRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let (task, session_id) = payload.validated()?;
    info!(session = ?session_id, "agent/execute SSE request");

    let (tx, rx) = mpsc::channel::<AgentStreamEvent>(STREAM_BUFFER);
    tokio::spawn(drive_stream(agent, task, session_id, tx));

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event.event_type()).data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Emit `start`, every log entry, then exactly one terminal event.
async fn drive_stream(
    agent: SharedAgent,
    task: String,
    session_id: Option<String>,
    tx: mpsc::Sender<AgentStreamEvent>,
) {
    send_event(&tx, AgentStreamEvent::start()).await;

    let sink = ChannelSink::new(tx.clone());
    let run = tokio::spawn(async move {
        agent
            .execute_task_streaming(&task, session_id.as_deref(), &sink)
            .await
    });

    let terminal = match run.await {
        Ok(response) => AgentStreamEvent::complete(response),
        Err(e) => {
            error!(error = %e, "Agent run aborted");
            AgentStreamEvent::error(format!("Agent execution failed: {e}"))
        }
    };
    send_event(&tx, terminal).await;
}

async fn send_event(tx: &mpsc::Sender<AgentStreamEvent>, event: AgentStreamEvent) {
    if tx.send(event).await.is_err() {
        debug!("SSE client disconnected");
    }
}

/// `POST /api/agent/run`: run a task and return the whole report at once.
async fn run_handler(
    State(agent): State<SharedAgent>,
    Json(payload): Json<TaskRequest>,
) -> Result<Json<RunReport>, ApiError> {
    let (task, session_id) = payload.validated()?;
    info!(session = ?session_id, "agent/run request");
    Ok(Json(agent.execute_task(&task, session_id.as_deref()).await))
}

// ── History ───────────────────────────────────────────────────────────────

async fn history_handler(
    State(agent): State<SharedAgent>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let history = agent
        .history(query.session_id.as_deref(), query.limit)
        .await;
    Json(HistoryResponse {
        success: true,
        history,
        timestamp: Utc::now(),
    })
}

async fn clear_history_handler(
    State(agent): State<SharedAgent>,
    Query(query): Query<HistoryQuery>,
) -> Json<ClearHistoryResponse> {
    agent.clear_history(query.session_id.as_deref()).await;
    Json(ClearHistoryResponse {
        success: true,
        message: "History cleared".into(),
        timestamp: Utc::now(),
    })
}

// ── Misc ──────────────────────────────────────────────────────────────────

async fn list_tools_handler(State(agent): State<SharedAgent>) -> Json<ToolListResponse> {
    let tools = agent.tools().definitions();
    let count = tools.len();
    Json(ToolListResponse { tools, count })
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        timestamp: Utc::now(),
    })
}

/// Fallback for every unmatched route.
pub(crate) async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Route not found".into(),
        }),
    )
}
