/// Server-Sent Events decoding and Firebase stream event handling
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{SensorSnapshot, SnapshotEvent};

/// One dispatched event from a `text/event-stream` body
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental SSE decoder
///
/// Bytes may arrive split at any point, including inside a line or a UTF-8
/// sequence; only complete lines are interpreted. Frames end at a blank
/// line, and only frames carrying data are dispatched.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            let line = text.strip_suffix('\r').unwrap_or(text.as_ref());

            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            let event = self.event.take();
            if self.data.is_empty() {
                return None;
            }
            let data = std::mem::take(&mut self.data).join("\n");
            return Some(SseFrame {
                event: event.unwrap_or_else(|| "message".to_string()),
                data,
            });
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
            _ => {} // id and retry are not used
        }
        None
    }
}

/// Local copy of the data under the subscribed path
#[derive(Debug, Default)]
pub struct EventTree {
    root: Value,
}

impl EventTree {
    /// Replace the value at `path`, a null value deletes it
    pub fn put(&mut self, path: &str, data: Value) {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        set_at(&mut self.root, &segments, data);
        prune(&mut self.root);
    }

    /// Replace each child of `data` below `path`, leaving other children alone
    pub fn patch(&mut self, path: &str, data: Value) {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match data {
            Value::Object(children) => {
                for (key, child) in children {
                    let mut child_path = segments.clone();
                    child_path.push(&key);
                    set_at(&mut self.root, &child_path, child);
                }
            }
            other => set_at(&mut self.root, &segments, other),
        }
        prune(&mut self.root);
    }

    /// The event the current tree stands for
    pub fn to_event(&self) -> SnapshotEvent {
        if self.root.is_null() {
            SnapshotEvent::Empty
        } else {
            SnapshotEvent::Data(SensorSnapshot::from_value(&self.root))
        }
    }
}

fn set_at(node: &mut Value, segments: &[&str], data: Value) {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            *node = data;
            return;
        }
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(children) = node {
        let child = children.entry(first.to_string()).or_insert(Value::Null);
        set_at(child, rest, data);
    }
}

/// Drop nulls and empty objects, the database never stores either.
fn prune(node: &mut Value) {
    if let Value::Object(children) = node {
        for child in children.values_mut() {
            prune(child);
        }
        children.retain(|_, child| !child.is_null());
        if children.is_empty() {
            *node = Value::Null;
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    path: String,
    #[serde(default)]
    data: Value,
}

/// What a single stream event means for the subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The tree changed, forward this event
    Update(SnapshotEvent),
    /// Nothing to forward
    Ignored,
    /// The server ended the subscription
    Closed(String),
}

/// Apply one stream event to the tree.
///
/// # Errors
///
/// * `DashboardError::Payload` - a put or patch carried malformed JSON
pub fn handle_frame(tree: &mut EventTree, frame: &SseFrame) -> Result<FrameOutcome> {
    match frame.event.as_str() {
        "put" => {
            let payload: StreamPayload = serde_json::from_str(&frame.data)?;
            tree.put(&payload.path, payload.data);
            Ok(FrameOutcome::Update(tree.to_event()))
        }
        "patch" => {
            let payload: StreamPayload = serde_json::from_str(&frame.data)?;
            tree.patch(&payload.path, payload.data);
            Ok(FrameOutcome::Update(tree.to_event()))
        }
        "keep-alive" => Ok(FrameOutcome::Ignored),
        "cancel" | "auth_revoked" => Ok(FrameOutcome::Closed(close_reason(frame))),
        _ => Ok(FrameOutcome::Ignored),
    }
}

fn close_reason(frame: &SseFrame) -> String {
    match serde_json::from_str::<Value>(&frame.data) {
        Ok(Value::String(reason)) => format!("{}: {}", frame.event, reason),
        _ if frame.data.trim().is_empty() || frame.data.trim() == "null" => frame.event.clone(),
        _ => format!("{}: {}", frame.event, frame.data.trim()),
    }
}
