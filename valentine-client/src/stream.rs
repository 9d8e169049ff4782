//! Server-sent event streaming
//!
//! The database pushes changes to a followed location as `text/event-stream`.
//! [`EventStreamDecoder`] turns raw bytes into [`ServerEvent`]s, and
//! [`DatabaseEvent`] interprets them as database operations.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;

use crate::error::{ClientError, Result};

/// A single event as framed on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    /// Event name (`message` when the server did not name it)
    pub event: String,
    /// Data lines joined with `\n`
    pub data: String,
}

/// Incremental decoder for `text/event-stream` bodies
///
/// Bytes may be fed in arbitrary chunks; an event is emitted once the blank
/// line that terminates it has arrived.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes and returns every event it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            if let Some(event) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing event when the stream ends without a blank line
    pub fn finish(&mut self) -> Option<ServerEvent> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw);
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<ServerEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        // Comment line
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<ServerEvent> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }

        Some(ServerEvent {
            event: self.event.take().unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// A change notification from the database
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseEvent {
    /// The value at `path` (relative to the followed location) was replaced
    Put { path: String, data: Value },

    /// The children listed in `data` were replaced under `path`
    Patch { path: String, data: Value },

    /// Periodic no-op sent by the server
    KeepAlive,

    /// The server stopped the stream, usually because rules deny access
    Cancel,

    /// The auth token expired
    AuthRevoked,

    /// An event name this client does not know
    Other(String),
}

impl DatabaseEvent {
    /// Whether the stream is finished after this event
    pub fn is_terminal(&self) -> bool {
        matches!(self, DatabaseEvent::Cancel | DatabaseEvent::AuthRevoked)
    }
}

#[derive(Deserialize)]
struct ChangePayload {
    path: String,
    data: Value,
}

impl TryFrom<ServerEvent> for DatabaseEvent {
    type Error = ClientError;

    fn try_from(event: ServerEvent) -> Result<Self> {
        let parse = |data: &str| {
            serde_json::from_str::<ChangePayload>(data).map_err(|e| {
                ClientError::StreamError(format!("Malformed {} payload: {}", event.event, e))
            })
        };

        match event.event.as_str() {
            "put" => {
                let payload = parse(&event.data)?;
                Ok(DatabaseEvent::Put {
                    path: payload.path,
                    data: payload.data,
                })
            }
            "patch" => {
                let payload = parse(&event.data)?;
                Ok(DatabaseEvent::Patch {
                    path: payload.path,
                    data: payload.data,
                })
            }
            "keep-alive" => Ok(DatabaseEvent::KeepAlive),
            "cancel" => Ok(DatabaseEvent::Cancel),
            "auth_revoked" => Ok(DatabaseEvent::AuthRevoked),
            other => Ok(DatabaseEvent::Other(other.to_string())),
        }
    }
}

type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Decoded event stream of a followed database location
pub struct EventStream {
    chunks: ChunkStream,
    decoder: EventStreamDecoder,
    pending: VecDeque<ServerEvent>,
}

impl EventStream {
    /// Wraps a stream of raw body chunks
    pub fn new<S>(chunks: S) -> Self
    where
        S: Stream<Item = Result<Vec<u8>>> + Send + 'static,
    {
        Self {
            chunks: Box::pin(chunks),
            decoder: EventStreamDecoder::new(),
            pending: VecDeque::new(),
        }
    }

    /// Waits for the next event
    ///
    /// # Returns
    /// `None` once the server closes the connection
    pub async fn next_event(&mut self) -> Option<Result<DatabaseEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(DatabaseEvent::try_from(event));
            }

            match self.chunks.next().await {
                Some(Ok(bytes)) => self.pending.extend(self.decoder.feed(&bytes)),
                Some(Err(e)) => return Some(Err(e)),
                None => return self.decoder.finish().map(DatabaseEvent::try_from),
            }
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("pending", &self.pending.len())
            .finish()
    }
}
