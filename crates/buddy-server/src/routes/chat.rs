use crate::markdown;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use buddy::models::message::Message;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
struct HistoryMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    html: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

// The browser only keeps the visible turns; tool traffic never leaves the server
fn convert_history(history: Vec<HistoryMessage>) -> Vec<Message> {
    let mut messages = Vec::new();

    for msg in history {
        match msg.role.as_str() {
            "user" => messages.push(Message::user().with_text(msg.content)),
            "assistant" => messages.push(Message::assistant().with_text(msg.content)),
            _ => {
                tracing::warn!("Unknown role in chat history: {}", msg.role);
            }
        }
    }

    messages
}

async fn handler(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let history = convert_history(request.history);

    match state
        .agent
        .chat(&state.persona, &history, &request.message)
        .await
    {
        Ok(response) => Json(ChatResponse {
            html: markdown::to_html(&response),
            response,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Chat failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(handler))
        .with_state(state)
}
