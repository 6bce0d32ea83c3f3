//! HomeFlow Shared Wire Types
//!
//! This crate provides the wire types and frame codec for communication
//! between the HomeFlow plugin and the assistant host process.

pub mod codec;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Marker appended after every JSON document on the stream
pub const TERMINATOR: &str = "<<END>>";

/// A single function invocation requested by the assistant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCall {
    /// Function name to dispatch (e.g. "run_scene")
    #[serde(default)]
    pub func: String,
    /// Function parameters; absent means no parameters
    #[serde(default)]
    pub params: serde_json::Map<String, Value>,
}

/// Top-level request envelope: an ordered batch of tool calls plus
/// opaque pass-through fields forwarded verbatim to handlers
#[derive(Debug, Clone, Default)]
pub struct CommandEnvelope {
    pub tool_calls: Vec<ToolCall>,
    pub context: Option<Value>,
    pub system_info: Option<Value>,
}

/// Errors that can occur interpreting a decoded frame as an envelope
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("tool_calls is missing or not a list")]
    ToolCallsNotAList,

    #[error("malformed tool call: {0}")]
    BadToolCall(#[from] serde_json::Error),
}

impl CommandEnvelope {
    /// Interpret a decoded JSON frame as a command envelope
    ///
    /// `tool_calls` must be present and must be an array; any other shape
    /// is a decode failure, never a panic.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            _ => return Err(EnvelopeError::ToolCallsNotAList),
        };

        let calls = match obj.remove("tool_calls") {
            Some(Value::Array(calls)) => calls,
            _ => return Err(EnvelopeError::ToolCallsNotAList),
        };

        let tool_calls = calls
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ToolCall>, _>>()?;

        Ok(Self {
            tool_calls,
            context: obj.remove("context"),
            system_info: obj.remove("system_info"),
        })
    }
}

/// Result of one dispatched tool call, written back as a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
}

impl Response {
    /// Create a success response
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Create a failure response
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
