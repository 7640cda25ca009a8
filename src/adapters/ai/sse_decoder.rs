//! Server-Sent Events decoding for streamed assistant runs.
//!
//! Two stages:
//!
//! 1. [`SseDecoder`] buffers raw bytes and yields complete frames. Network
//!    chunks may split a frame, a line, or a UTF-8 sequence anywhere.
//! 2. [`RunEventMapper`] turns Assistants API frames into [`StreamEvent`]s,
//!    dropping the frames the chat core has no use for.

use serde::Deserialize;
use std::collections::HashSet;

use crate::domain::stream::{StreamEvent, TokenUsage};
use crate::ports::AIError;

/// One dispatched SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

/// Incremental line decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Dispatches a trailing frame not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            if let Some(frame) = self.process_line(line.trim_end_matches('\r')) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
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

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() && self.event.is_none() {
            return None;
        }
        let frame = SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        };
        Some(frame)
    }
}

// ----- Assistants API payloads -----

#[derive(Debug, Deserialize)]
struct RunObject {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<RunUsage>,
    #[serde(default)]
    last_error: Option<RunError>,
}

#[derive(Debug, Deserialize)]
struct RunUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct RunError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    delta: MessageDeltaBody,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    #[serde(default)]
    content: Vec<ContentDelta>,
}

#[derive(Debug, Deserialize)]
struct ContentDelta {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<TextDelta>,
}

#[derive(Debug, Deserialize)]
struct TextDelta {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StepDelta {
    delta: StepDeltaBody,
}

#[derive(Debug, Deserialize)]
struct StepDeltaBody {
    #[serde(default)]
    step_details: Option<StepDetails>,
}

#[derive(Debug, Deserialize)]
struct StepDetails {
    #[serde(default)]
    tool_calls: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorFrame {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<Box<ErrorFrame>>,
}

/// Maps Assistants API frames to chat stream events.
///
/// Holds the little state a run needs across frames: the model announced at
/// run creation and the tool calls already announced.
#[derive(Debug, Default)]
pub struct RunEventMapper {
    model: Option<String>,
    seen_tool_calls: HashSet<String>,
}

impl RunEventMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events carried by `frame`, in order. Unknown frames map
    /// to nothing.
    pub fn map(&mut self, frame: &SseFrame) -> Result<Vec<StreamEvent>, AIError> {
        let Some(name) = frame.event.as_deref() else {
            return Ok(Vec::new());
        };

        match name {
            "thread.run.created" | "thread.run.in_progress" => {
                let run: RunObject = parse(name, &frame.data)?;
                if run.model.is_some() {
                    self.model = run.model;
                }
                Ok(Vec::new())
            }
            "thread.message.created" => Ok(vec![StreamEvent::TextCreated]),
            "thread.message.delta" => {
                let delta: MessageDelta = parse(name, &frame.data)?;
                Ok(delta
                    .delta
                    .content
                    .into_iter()
                    .filter(|part| part.kind == "text")
                    .filter_map(|part| part.text.and_then(|t| t.value))
                    .filter(|value| !value.is_empty())
                    .map(|value| StreamEvent::TextDelta { value })
                    .collect())
            }
            "thread.run.step.delta" => {
                let delta: StepDelta = parse(name, &frame.data)?;
                let calls = delta
                    .delta
                    .step_details
                    .map(|d| d.tool_calls)
                    .unwrap_or_default();
                Ok(self.tool_call_events(calls))
            }
            "thread.run.completed" => {
                let run: RunObject = parse(name, &frame.data)?;
                let model = run
                    .model
                    .or_else(|| self.model.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                Ok(vec![StreamEvent::End {
                    model,
                    usage: run.usage.map(|u| TokenUsage {
                        prompt_tokens: u.prompt_tokens,
                        completion_tokens: u.completion_tokens,
                    }),
                }])
            }
            "thread.run.failed" => {
                let run: RunObject = parse(name, &frame.data)?;
                let (code, message) = run
                    .last_error
                    .map(|e| (e.code, e.message))
                    .unwrap_or_else(|| ("run_failed".to_string(), "run failed".to_string()));
                Ok(vec![StreamEvent::error(code, message)])
            }
            "thread.run.expired" => Ok(vec![StreamEvent::error("run_expired", "run expired")]),
            "thread.run.cancelled" => {
                Ok(vec![StreamEvent::error("run_cancelled", "run cancelled")])
            }
            "thread.run.incomplete" => {
                Ok(vec![StreamEvent::error("run_incomplete", "run ended incomplete")])
            }
            "thread.run.requires_action" => Ok(vec![StreamEvent::error(
                "requires_action",
                "run requires tool outputs, which are not supported",
            )]),
            "error" => {
                let (code, message) = error_fields(&frame.data);
                Ok(vec![StreamEvent::error(code, message)])
            }
            _ => Ok(Vec::new()),
        }
    }

    fn tool_call_events(&mut self, calls: Vec<serde_json::Value>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for (position, call) in calls.into_iter().enumerate() {
            let id = call.get("id").and_then(|v| v.as_str()).map(str::to_string);
            let index = call
                .get("index")
                .and_then(|v| v.as_u64())
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(position as u32);
            let kind = call
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("function")
                .to_string();

            if let Some(id) = &id {
                if self.seen_tool_calls.insert(id.clone()) {
                    events.push(StreamEvent::ToolCallCreated {
                        id: id.clone(),
                        kind: kind.clone(),
                    });
                }
            }

            let delta = call.get(&kind).cloned().unwrap_or(serde_json::Value::Null);
            if !delta.is_null() {
                events.push(StreamEvent::ToolCallDelta { id, index, delta });
            }
        }
        events
    }
}

fn parse<'a, T: Deserialize<'a>>(event: &str, data: &'a str) -> Result<T, AIError> {
    serde_json::from_str(data)
        .map_err(|e| AIError::parse(format!("malformed '{}' frame: {}", event, e)))
}

fn error_fields(data: &str) -> (String, String) {
    match serde_json::from_str::<ErrorFrame>(data) {
        Ok(frame) => {
            let inner = frame.error.map(|e| *e);
            let code = inner
                .as_ref()
                .and_then(|e| e.code.clone())
                .or(frame.code)
                .unwrap_or_else(|| "provider_error".to_string());
            let message = inner
                .and_then(|e| e.message)
                .or(frame.message)
                .unwrap_or_else(|| "provider reported an error".to_string());
            (code, message)
        }
        Err(_) => ("provider_error".to_string(), data.to_string()),
    }
}
