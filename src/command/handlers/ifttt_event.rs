//! Direct webhook trigger handler

use super::{
    missing_param, optional_value, required_string, trigger_failure, trigger_success,
    HandlerContext, HandlerRequest,
};
use crate::ifttt::TriggerValues;
use anyhow::Result;
use homeflow_protocol::Response;

/// Fire an arbitrary webhook event with optional ingredient values
pub async fn trigger_ifttt_event(
    ctx: &HandlerContext,
    req: &HandlerRequest<'_>,
) -> Result<Response> {
    let Some(event_name) = required_string(req, "event_name") else {
        return Ok(missing_param("event_name"));
    };
    let event_name = event_name.trim().to_string();

    let values = TriggerValues {
        value1: optional_value(req, "value1"),
        value2: optional_value(req, "value2"),
        value3: optional_value(req, "value3"),
    };

    match ctx.trigger.trigger(&event_name, values).await {
        Ok(status) => Ok(Response::ok(trigger_success(&event_name, status))),
        Err(err) => Ok(trigger_failure(&event_name, err)),
    }
}
