//! Incremental decoder and reader for the generation progress stream.
//!
//! The server delivers SSE-style messages over a chunked HTTP response:
//! JSON payloads prefixed with `data: ` and separated by a blank line.
//! [`SseDecoder`] is a pure buffer that turns arbitrary byte chunks into
//! whole payload strings; [`EventStream`] drives it over a live response.

use crate::api::{map_send_error, ApiClient};
use crate::document::GeneratedDocument;
use crate::error::{Error, Result};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const MESSAGE_DELIMITER: &[u8] = b"\n\n";
const DATA_PREFIX: &str = "data:";

/// One progress message from the generation stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressEvent {
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub result: Option<GeneratedDocument>,
}

impl ProgressEvent {
    /// Terminal events end the stream: a server-reported failure, or the
    /// completion message carrying the result.
    pub fn is_terminal(&self) -> bool {
        self.error || (self.progress >= 100 && self.result.is_some())
    }
}

/// Incremental splitter for SSE-style messages. Owns a byte buffer so a
/// message (or a multi-byte UTF-8 sequence) fragmented across reads is only
/// surfaced once it is complete.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every payload completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = find_delimiter(&self.buffer) {
            let message: Vec<u8> = self.buffer.drain(..pos + MESSAGE_DELIMITER.len()).collect();
            let message = &message[..pos];
            let text = String::from_utf8_lossy(message);
            let payload = strip_data_prefix(text.trim());
            if !payload.is_empty() {
                payloads.push(payload.to_string());
            }
        }
        payloads
    }

    /// Whatever is left after the stream closed. A well-behaved server ends
    /// every message with the delimiter, so this is normally empty.
    pub fn remainder(&self) -> String {
        String::from_utf8_lossy(&self.buffer).trim().to_string()
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(MESSAGE_DELIMITER.len())
        .position(|window| window == MESSAGE_DELIMITER)
}

fn strip_data_prefix(message: &str) -> &str {
    match message.strip_prefix(DATA_PREFIX) {
        Some(rest) => rest.trim_start(),
        None => message,
    }
}

/// Parse one payload; malformed messages are reported as `None` so the
/// caller can skip them without ending the stream.
pub fn parse_event(payload: &str) -> Option<ProgressEvent> {
    match serde_json::from_str::<ProgressEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Skipping malformed stream message: {e}");
            None
        }
    }
}

/// What the stream ended with.
#[derive(Debug)]
pub enum StreamEnd {
    /// Terminal success event; the generated document was captured.
    Completed(Box<GeneratedDocument>),
    /// Server-reported failure; the message is surfaced verbatim.
    Failed(String),
    /// The consumer cancelled; not an error, nothing is kept.
    Cancelled,
    /// The server closed the connection without a terminal event.
    Closed,
}

pub struct EventStream;

impl EventStream {
    /// Open `GET /api/wizard/generate/prota/stream?class_id=<id>` and pump
    /// events into `on_event` until a terminal event, cancellation, or
    /// connection close. Dropping the response on return aborts the
    /// transfer, so a terminal event also tears the stream down.
    pub async fn run<F>(
        client: &ApiClient,
        class_id: i64,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<StreamEnd>
    where
        F: FnMut(&ProgressEvent),
    {
        let path = format!("/api/wizard/generate/prota/stream?class_id={class_id}");
        let response = client
            .get(&path)?
            .send()
            .await
            .map_err(map_send_error)?;
        let response = client.check_status(response).await?;

        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Generation stream cancelled by consumer");
                    return Ok(StreamEnd::Cancelled);
                }
                chunk = body.next() => chunk,
            };

            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => return Err(Error::Network(e.to_string())),
                None => break,
            };

            for payload in decoder.feed(&bytes) {
                let Some(event) = parse_event(&payload) else {
                    continue;
                };
                on_event(&event);

                if event.error {
                    return Ok(StreamEnd::Failed(event.status));
                }
                if event.is_terminal() {
                    if let Some(result) = event.result {
                        return Ok(StreamEnd::Completed(Box::new(result)));
                    }
                }
            }
        }

        // Connection closed; try the unterminated tail before giving up.
        let tail = decoder.remainder();
        if !tail.is_empty() {
            if let Some(event) = parse_event(strip_data_prefix(&tail)) {
                on_event(&event);
                if event.error {
                    return Ok(StreamEnd::Failed(event.status));
                }
                if let Some(result) = event.result {
                    return Ok(StreamEnd::Completed(Box::new(result)));
                }
            }
        }
        Ok(StreamEnd::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_complete_message() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"progress\": 10, \"status\": \"mulai\"}\n\n");
        assert_eq!(payloads, vec!["{\"progress\": 10, \"status\": \"mulai\"}"]);
    }

    #[test]
    fn message_fragmented_across_chunks_parses_once_complete() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"prog").is_empty());
        assert!(decoder.feed(b"ress\": 42, \"status\"").is_empty());
        let payloads = decoder.feed(b": \"menyusun\"}\n\n");
        assert_eq!(payloads.len(), 1);
        let event = parse_event(&payloads[0]).unwrap();
        assert_eq!(event.progress, 42);
        assert_eq!(event.status, "menyusun");
    }

    #[test]
    fn multiple_messages_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"progress\": 1}\n\ndata: {\"progress\": 2}\n\n");
        assert_eq!(payloads.len(), 2);
        assert_eq!(parse_event(&payloads[1]).unwrap().progress, 2);
    }

    #[test]
    fn multibyte_utf8_split_across_reads() {
        let mut decoder = SseDecoder::new();
        let message = "data: {\"status\": \"évaluasi\"}\n\n".as_bytes();
        // split inside the two-byte 'é'
        let split = message.iter().position(|&b| b == 0xc3).unwrap() + 1;
        assert!(decoder.feed(&message[..split]).is_empty());
        let payloads = decoder.feed(&message[split..]);
        assert_eq!(payloads.len(), 1);
        assert_eq!(parse_event(&payloads[0]).unwrap().status, "évaluasi");
    }

    #[test]
    fn prefix_is_optional() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"{\"progress\": 5}\n\n");
        assert_eq!(parse_event(&payloads[0]).unwrap().progress, 5);
    }

    #[test]
    fn malformed_message_is_skipped_not_fatal() {
        assert!(parse_event("{not json").is_none());
        assert!(parse_event("{\"progress\": 7}").is_some());
    }

    #[test]
    fn error_event_is_terminal_without_result() {
        let event = parse_event(r#"{"error": true, "status": "Quota exceeded"}"#).unwrap();
        assert!(event.is_terminal());
        assert_eq!(event.status, "Quota exceeded");
    }

    #[test]
    fn full_progress_without_result_is_not_terminal() {
        let event = parse_event(r#"{"progress": 100, "status": "menyimpan"}"#).unwrap();
        assert!(!event.is_terminal());
    }

    #[test]
    fn terminal_success_carries_result() {
        let event = parse_event(
            r#"{"progress": 100, "status": "selesai", "result": {"data": {"items": []}, "msg": "ok"}}"#,
        )
        .unwrap();
        assert!(event.is_terminal());
        assert!(event.result.is_some());
    }

    #[test]
    fn remainder_holds_unterminated_tail() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"progress\": 99}").is_empty());
        assert_eq!(decoder.remainder(), "data: {\"progress\": 99}");
    }
}
