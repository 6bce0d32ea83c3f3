//! Command router - resolves a function name and dispatches to its handler
//!
//! This boundary is the system's single point of crash prevention: any
//! fault raised inside a handler is caught here and converted into a
//! failure response, so a bad command can never take the session loop down.

use super::handlers::{self, HandlerContext, HandlerRequest};
use crate::config::PluginConfig;
use crate::ifttt::EventTrigger;
use homeflow_protocol::{Response, ToolCall};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// The closed set of functions the plugin exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Initialize,
    Shutdown,
    RunScene,
    TriggerIftttEvent,
    ListScenes,
    RunMobilityAction,
    ListMobilityActions,
}

impl Function {
    /// Parse a wire function name; unknown names stay unrouted
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "shutdown" => Some(Self::Shutdown),
            "run_scene" => Some(Self::RunScene),
            "trigger_ifttt_event" => Some(Self::TriggerIftttEvent),
            "list_scenes" => Some(Self::ListScenes),
            "run_mobility_action" => Some(Self::RunMobilityAction),
            "list_mobility_actions" => Some(Self::ListMobilityActions),
            _ => None,
        }
    }
}

/// Outcome of one dispatched tool call
#[derive(Debug)]
pub struct Dispatch {
    pub response: Response,
    /// True after a `shutdown` call: flush the response, then stop reading
    pub shutdown: bool,
}

/// Routes tool calls to handlers; built once at startup, immutable after
pub struct Router {
    ctx: HandlerContext,
}

impl Router {
    pub fn new(config: &PluginConfig, trigger: Arc<dyn EventTrigger>) -> Self {
        Self {
            ctx: HandlerContext {
                scenes: config.scenes.clone(),
                mobility_actions: config.mobility_actions.clone(),
                trigger,
            },
        }
    }

    /// Dispatch one tool call, producing exactly one response
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        context: Option<&Value>,
        system_info: Option<&Value>,
    ) -> Dispatch {
        let Some(function) = Function::parse(&call.func) else {
            warn!("Unknown function requested: {}", call.func);
            return Dispatch {
                response: Response::failure(format!("❌ Unknown function `{}`.", call.func)),
                shutdown: false,
            };
        };

        let req = HandlerRequest {
            params: &call.params,
            context,
            system_info,
        };

        let result = match function {
            Function::Initialize => handlers::initialize(&self.ctx, &req).await,
            Function::Shutdown => handlers::shutdown(&self.ctx, &req).await,
            Function::RunScene => handlers::run_scene(&self.ctx, &req).await,
            Function::TriggerIftttEvent => handlers::trigger_ifttt_event(&self.ctx, &req).await,
            Function::ListScenes => handlers::list_scenes(&self.ctx, &req).await,
            Function::RunMobilityAction => handlers::run_mobility_action(&self.ctx, &req).await,
            Function::ListMobilityActions => {
                handlers::list_mobility_actions(&self.ctx, &req).await
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(err) => fault_response(&call.func, &err),
        };

        let shutdown = function == Function::Shutdown;
        if shutdown {
            info!("Terminal shutdown dispatched");
        }

        Dispatch { response, shutdown }
    }
}

/// Convert a handler fault into a failure response; never propagates
fn fault_response(func: &str, err: &anyhow::Error) -> Response {
    error!("Error executing function {}: {:#}", func, err);
    Response::failure(format!(
        "❌ Internal error while executing `{func}`: `{err}`"
    ))
}
