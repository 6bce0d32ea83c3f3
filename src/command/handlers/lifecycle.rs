//! Initialize and shutdown handlers

use super::{HandlerContext, HandlerRequest};
use anyhow::Result;
use homeflow_protocol::Response;
use tracing::{debug, info};

/// Warm-up hook: report what is configured
pub async fn initialize(ctx: &HandlerContext, req: &HandlerRequest<'_>) -> Result<Response> {
    debug!(
        "Initialize requested (context: {}, system_info: {})",
        req.context.is_some(),
        req.system_info.is_some()
    );

    let scene_list = if ctx.scenes.is_empty() {
        "no scenes configured".to_string()
    } else {
        ctx.scenes.keys_sorted().join(", ")
    };
    let mobility_list = if ctx.mobility_actions.is_empty() {
        "no mobility actions configured".to_string()
    } else {
        ctx.mobility_actions.keys_sorted().join(", ")
    };

    Ok(Response::ok(format!(
        "HomeFlow initialized.\n- Scenes: {} ({})\n- Mobility actions (EV/UAV): {} ({})",
        ctx.scenes.len(),
        scene_list,
        ctx.mobility_actions.len(),
        mobility_list
    )))
}

/// Terminal acknowledgement; the session loop exits after this response
pub async fn shutdown(_ctx: &HandlerContext, _req: &HandlerRequest<'_>) -> Result<Response> {
    info!("Shutdown requested by assistant");
    Ok(Response::ok("HomeFlow shutting down."))
}
