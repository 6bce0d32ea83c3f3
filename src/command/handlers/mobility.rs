//! EV/UAV mobility action handlers (run, list)
//!
//! Typical registry keys:
//!   - `start_ev_charging_home`
//!   - `ev_off_peak_schedule`
//!   - `uav_patrol_yard`
//!   - `uav_return_home`

use super::{
    missing_param, required_string, trigger_failure, trigger_success, HandlerContext,
    HandlerRequest,
};
use crate::ifttt::TriggerValues;
use crate::registry::Resolution;
use anyhow::Result;
use homeflow_protocol::Response;

/// Message prefix chosen by substring match on the resolved key
fn action_prefix(key: &str) -> &'static str {
    if key.contains("uav") || key.contains("drone") {
        "🛸 UAV/Drone action"
    } else if key.contains("ev") || key.contains("charging") || key.contains("vehicle") {
        "🚗 EV action"
    } else {
        "🚀 Mobility action"
    }
}

/// Listing icon, same domain rule as [`action_prefix`]
fn action_icon(key: &str) -> &'static str {
    if key.contains("uav") || key.contains("drone") {
        "🛸"
    } else if key.contains("ev") || key.contains("charging") || key.contains("vehicle") {
        "🚗"
    } else {
        "🚀"
    }
}

/// Run a configured EV/UAV mobility action by (possibly fuzzy) name
pub async fn run_mobility_action(
    ctx: &HandlerContext,
    req: &HandlerRequest<'_>,
) -> Result<Response> {
    let Some(action) = required_string(req, "action") else {
        return Ok(missing_param("action"));
    };

    let (key, event) = match ctx.mobility_actions.resolve(&action) {
        Resolution::Matched { key, event } => (key, event),
        Resolution::RegistryEmpty => {
            return Ok(Response::failure(
                "❌ No mobility actions configured yet. \
                 Please edit `config.json` and add entries under `MOBILITY_ACTIONS`.",
            ));
        }
        Resolution::NotFound { available } => {
            return Ok(Response::failure(format!(
                "❌ Mobility action **{}** is not configured.\nAvailable actions: {}.",
                action.trim(),
                available.join(", ")
            )));
        }
    };

    match ctx.trigger.trigger(&event, TriggerValues::none()).await {
        Ok(status) => Ok(Response::ok(format!(
            "{} **{key}** triggered (IFTTT event: `{event}`).\n{}",
            action_prefix(&key),
            trigger_success(&event, status)
        ))),
        Err(err) => Ok(trigger_failure(&event, err)),
    }
}

/// List configured mobility actions, or guidance when none exist
pub async fn list_mobility_actions(
    ctx: &HandlerContext,
    _req: &HandlerRequest<'_>,
) -> Result<Response> {
    if ctx.mobility_actions.is_empty() {
        return Ok(Response::ok(
            "ℹ️ No mobility actions are configured yet. \
             Edit `config.json` and add entries under `MOBILITY_ACTIONS` like:\n\
             ```json\n\
             \"MOBILITY_ACTIONS\": {\n  \
             \"start_ev_charging_home\": \"aerovolt_start_ev_charging_home\",\n  \
             \"uav_patrol_yard\": \"aerovolt_uav_patrol_yard\"\n}\n\
             ```",
        ));
    }

    let mut lines = vec!["✅ HomeFlow mobility actions (EV/UAV):".to_string()];
    for (name, event) in ctx.mobility_actions.entries_sorted() {
        lines.push(format!(
            "- {} **{name}** → IFTTT event `{event}`",
            action_icon(name)
        ));
    }
    Ok(Response::ok(lines.join("\n")))
}
