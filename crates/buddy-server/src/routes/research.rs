use crate::markdown;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use buddy::research::{pdf_report, PdfUpload, ProgressStream};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct ResearchRequest {
    query: String,
}

/// Server-sent events carrying research progress
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            Body::from_stream(self),
        )
            .into_response()
    }
}

struct EventFormatter;

impl EventFormatter {
    // Each progress string travels JSON encoded so newlines in a report stay inside one event
    fn format_progress(text: &str) -> String {
        format!("data: {}\n\n", Value::from(text))
    }

    fn format_error(message: &str) -> String {
        format!("event: error\ndata: {}\n\n", Value::from(message))
    }

    // The last progress item is the finished report, sent again rendered for display
    fn format_done(report: Option<&str>) -> String {
        let data = match report {
            Some(report) => json!({ "html": markdown::to_html(report) }),
            None => Value::Null,
        };
        format!("event: done\ndata: {}\n\n", data)
    }
}

fn stream_progress(mut progress: ProgressStream) -> SseResponse {
    let (tx, rx) = mpsc::channel(100);

    tokio::spawn(async move {
        let mut last = None;
        loop {
            match timeout(Duration::from_millis(500), progress.next()).await {
                Ok(Some(Ok(text))) => {
                    if let Err(e) = tx.send(EventFormatter::format_progress(&text)).await {
                        tracing::error!("Error sending progress through channel: {}", e);
                        return;
                    }
                    last = Some(text);
                }
                Ok(Some(Err(e))) => {
                    tracing::error!("Research failed: {:#}", e);
                    let _ = tx.send(EventFormatter::format_error(&e.to_string())).await;
                    return;
                }
                Ok(None) => break,
                // Heartbeat, used to stop work for clients that went away
                Err(_) => {
                    if tx.is_closed() {
                        tracing::debug!("Client disconnected, abandoning research");
                        return;
                    }
                }
            }
        }

        let _ = tx
            .send(EventFormatter::format_done(last.as_deref()))
            .await;
    });

    SseResponse::new(ReceiverStream::new(rx))
}

async fn research_handler(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> SseResponse {
    stream_progress(state.research.run(request.query))
}

fn bad_request(err: MultipartError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, err.to_string())
}

async fn pdf_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<SseResponse, (StatusCode, String)> {
    let mut query = String::new();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("query") => query = field.text().await.map_err(bad_request)?,
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_request)?;
                // Browsers send an empty file part when nothing was chosen
                if !bytes.is_empty() {
                    let mut pdf = PdfUpload::new(bytes.to_vec());
                    if let Some(filename) = filename {
                        pdf = pdf.with_filename(filename);
                    }
                    upload = Some(pdf);
                }
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok(stream_progress(pdf_report(
        state.writer.clone(),
        query,
        upload,
    )))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/research", post(research_handler))
        .route(
            "/research/pdf",
            post(pdf_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}
