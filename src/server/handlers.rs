//! HTTP handlers.

use axum::body::{Body, Bytes};
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::export::{self, ExportFormat};
use crate::ingest::{self, InputKind, TopicInput};
use crate::pipeline::progress::{self, ProgressEvent};
use crate::pipeline::{BatchScheduler, Frame, RunStatus};

use super::AppState;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Start a batch generation job.
///
/// Multipart fields: `format` (required export tag), plus either `file`
/// (an uploaded spreadsheet/CSV/JSON) or `topics` (a JSON array of rows).
/// An unknown format or unusable upload fails with 400 before any
/// generation starts; afterwards every outcome is reported on the stream.
pub async fn generate(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut format_tag: Option<String> = None;
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut topics_json: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("malformed multipart body: {}", e)),
        };
        let name = field.name().map(String::from);
        match name.as_deref() {
            Some("format") => match field.text().await {
                Ok(text) => format_tag = Some(text),
                Err(e) => return bad_request(format!("unreadable format field: {}", e)),
            },
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime = field.content_type().map(String::from);
                match field.bytes().await {
                    Ok(bytes) => upload = Some((filename, mime, bytes.to_vec())),
                    Err(e) => return bad_request(format!("unreadable file upload: {}", e)),
                }
            }
            Some("topics") => match field.text().await {
                Ok(text) => topics_json = Some(text),
                Err(e) => return bad_request(format!("unreadable topics field: {}", e)),
            },
            _ => {}
        }
    }

    let Some(format) = format_tag.as_deref().and_then(ExportFormat::parse) else {
        return bad_request(format!(
            "unsupported export format: {:?}",
            format_tag.unwrap_or_default()
        ));
    };

    let input = if let Some((filename, mime, data)) = upload {
        let Some(kind) = InputKind::detect(&filename, mime.as_deref()) else {
            return bad_request(format!("unsupported upload type: {}", filename));
        };
        TopicInput::RawBytes { data, kind }
    } else if let Some(raw) = topics_json {
        TopicInput::RawBytes {
            data: raw.into_bytes(),
            kind: InputKind::Json,
        }
    } else {
        return bad_request("no input provided: send a 'file' or 'topics' field".to_string());
    };

    let (frame_tx, frame_rx) = mpsc::unbounded_channel::<Frame>();
    tokio::spawn(run_job(state, input, format, frame_tx));

    let stream = futures::stream::unfold(frame_rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|frame| (Ok::<_, std::convert::Infallible>(Bytes::from(frame.encode())), rx))
    });
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Drive one job to completion, translating progress events into wire
/// frames. Closing the frame channel ends the response stream.
async fn run_job(
    state: AppState,
    input: TopicInput,
    format: ExportFormat,
    frames: mpsc::UnboundedSender<Frame>,
) {
    let (event_tx, mut event_rx) = progress::channel();
    let forward = frames.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let frame = match &event {
                ProgressEvent::Error { message } => Frame::Error(message.clone()),
                ProgressEvent::Cancelled => Frame::Cancelled(event.describe()),
                _ => Frame::Progress(event.describe()),
            };
            let _ = forward.send(frame);
        }
    });

    let topics = match ingest::parse_topics(input) {
        Ok(topics) => topics,
        Err(e) => {
            event_tx.send(ProgressEvent::Error {
                message: e.to_string(),
            });
            drop(event_tx);
            let _ = forwarder.await;
            return;
        }
    };
    info!(topics = topics.len(), format = format.as_str(), "starting batch job");

    let scheduler = BatchScheduler::new(state.backend.clone(), state.scheduler_config.clone());
    let outcome = scheduler.run(&topics, &event_tx, &state.cancel).await;
    drop(event_tx);
    let _ = forwarder.await;

    if outcome.status == RunStatus::Cancelled {
        // The Cancelled frame was already forwarded; completed posts are
        // discarded because the requested delivery never happens.
        return;
    }

    let terminal = match format {
        ExportFormat::GoogleSheets => match state.publisher.publish(&outcome.posts).await {
            Ok(url) => Frame::Sheets { url },
            Err(e) => {
                error!(error = %e, "sheet publishing failed");
                Frame::Error(e.to_string())
            }
        },
        _ => match export::export_posts(&outcome.posts, format) {
            Ok(file) => Frame::Data {
                filename: file.filename,
                mime: file.mime,
                payload: file.bytes,
            },
            Err(e) => {
                error!(error = %e, "export failed");
                Frame::Error(e.to_string())
            }
        },
    };
    let _ = frames.send(terminal);
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// Request cancellation of the active run.
pub async fn cancel_set(State(state): State<AppState>) -> impl IntoResponse {
    state.cancel.cancel();
    Json(json!({ "message": "Process cancelled" }))
}

/// Read the cancellation flag.
pub async fn cancel_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "cancelled": state.cancel.is_cancelled() }))
}

/// Clear the cancellation flag.
pub async fn cancel_reset(State(state): State<AppState>) -> impl IntoResponse {
    state.cancel.reset();
    Json(json!({ "message": "Cancellation reset" }))
}

/// Serve the example topic spreadsheet.
pub async fn sample_workbook() -> Response {
    match export::sample_workbook() {
        Ok(bytes) => (
            [
                (
                    header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"blog_ideas_example.xlsx\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to build sample workbook");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
