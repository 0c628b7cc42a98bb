//! Turns a [`ClientEvent`] stream into the canonical SSE HTTP response
//! (spec §6), following the teacher's manual-`Response`-builder pattern
//! rather than `axum::response::sse::Sse` so the wire bytes are exactly
//! `event: <name>\ndata: <json>\n\n` with no extra framing.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use conduit_orchestrator::ClientEvent;
use futures::{Stream, StreamExt};
use std::io;
use tokio_stream::wrappers::ReceiverStream;

pub fn sse_response(stream: ReceiverStream<ClientEvent>) -> Response {
    let body_stream = stream.map(|event| Ok::<_, io::Error>(event.to_bytes()));
    build_sse_response(StatusCode::OK, body_stream)
}

fn build_sse_response<S>(status: StatusCode, body_stream: S) -> Response
where
    S: Stream<Item = Result<axum::body::Bytes, io::Error>> + Send + 'static,
{
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to build SSE response");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to build response").into_response()
        })
}
