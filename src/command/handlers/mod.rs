//! Command handlers for the plugin's function surface

mod ifttt_event;
mod lifecycle;
mod mobility;
mod scenes;

pub use ifttt_event::trigger_ifttt_event;
pub use lifecycle::{initialize, shutdown};
pub use mobility::{list_mobility_actions, run_mobility_action};
pub use scenes::{list_scenes, run_scene};

use crate::ifttt::{EventTrigger, TriggerError};
use crate::registry::ActionRegistry;
use homeflow_protocol::Response;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Context passed to command handlers
#[derive(Clone)]
pub struct HandlerContext {
    pub scenes: ActionRegistry,
    pub mobility_actions: ActionRegistry,
    pub trigger: Arc<dyn EventTrigger>,
}

/// One tool call's inputs as seen by a handler
pub struct HandlerRequest<'a> {
    pub params: &'a Map<String, Value>,
    /// Opaque pass-through from the envelope
    pub context: Option<&'a Value>,
    /// Opaque pass-through from the envelope
    pub system_info: Option<&'a Value>,
}

/// Extract a required string parameter; blank counts as missing
pub(crate) fn required_string(req: &HandlerRequest<'_>, name: &str) -> Option<String> {
    match req.params.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Extract an optional parameter; JSON null counts as absent
pub(crate) fn optional_value(req: &HandlerRequest<'_>, name: &str) -> Option<Value> {
    match req.params.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.clone()),
    }
}

pub(crate) fn missing_param(name: &str) -> Response {
    Response::failure(format!("❌ Missing required parameter `{name}`."))
}

/// Standard success line for a fired webhook
pub(crate) fn trigger_success(event: &str, status: u16) -> String {
    format!("✅ Triggered IFTTT event **{event}**.\nHTTP status: {status}")
}

/// Collapse a trigger failure into a user-facing response
pub(crate) fn trigger_failure(event: &str, err: TriggerError) -> Response {
    match err {
        TriggerError::MissingApiKey => Response::failure(
            "❌ IFTTT_API_KEY is not configured. Please edit config.json and set your Webhooks key.",
        ),
        other => Response::failure(format!(
            "❌ Failed to trigger IFTTT event **{event}**.\nError: `{other}`"
        )),
    }
}
