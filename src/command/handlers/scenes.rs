//! Home scene handlers (run, list)

use super::{
    missing_param, required_string, trigger_failure, trigger_success, HandlerContext,
    HandlerRequest,
};
use crate::ifttt::TriggerValues;
use crate::registry::Resolution;
use anyhow::Result;
use homeflow_protocol::Response;

/// Run a configured home scene by (possibly fuzzy) name
pub async fn run_scene(ctx: &HandlerContext, req: &HandlerRequest<'_>) -> Result<Response> {
    let Some(scene) = required_string(req, "scene") else {
        return Ok(missing_param("scene"));
    };

    let (key, event) = match ctx.scenes.resolve(&scene) {
        Resolution::Matched { key, event } => (key, event),
        Resolution::RegistryEmpty => {
            return Ok(Response::failure(
                "❌ No scenes configured yet. \
                 Please edit `config.json` and add entries under `SCENES`.",
            ));
        }
        Resolution::NotFound { available } => {
            return Ok(Response::failure(format!(
                "❌ Scene **{}** is not configured.\nAvailable scenes: {}.",
                scene.trim(),
                available.join(", ")
            )));
        }
    };

    match ctx.trigger.trigger(&event, TriggerValues::none()).await {
        Ok(status) => Ok(Response::ok(format!(
            "🏠 Scene **{key}** triggered (IFTTT event: `{event}`).\n{}",
            trigger_success(&event, status)
        ))),
        Err(err) => Ok(trigger_failure(&event, err)),
    }
}

/// List configured scenes, or guidance when none exist
pub async fn list_scenes(ctx: &HandlerContext, _req: &HandlerRequest<'_>) -> Result<Response> {
    if ctx.scenes.is_empty() {
        return Ok(Response::ok(
            "ℹ️ No scenes are configured yet. \
             Edit `config.json` and add entries under `SCENES` like:\n\
             ```json\n\
             \"SCENES\": {\n  \"study\": \"aerovolt_study\",\n  \"sleep\": \"aerovolt_sleep\"\n}\n\
             ```",
        ));
    }

    let mut lines = vec!["✅ HomeFlow scenes:".to_string()];
    for (name, event) in ctx.scenes.entries_sorted() {
        lines.push(format!("- **{name}** → IFTTT event `{event}`"));
    }
    Ok(Response::ok(lines.join("\n")))
}
