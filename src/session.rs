//! Session loop: read one framed command, dispatch its tool calls in order,
//! write one framed response per call
//!
//! Strictly sequential: a slow webhook call delays everything behind it.
//! Frames that fail to decode produce no response (the peer resends);
//! only an explicit `shutdown` call ends the loop.

use crate::command::Router;
use homeflow_protocol::codec::{self, FrameDecoder};
use homeflow_protocol::{CommandEnvelope, Response};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

/// Loop control after one frame is handled
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

/// One request/response session over a byte stream pair
pub struct Session<R, W> {
    reader: R,
    writer: W,
    router: Router,
    decoder: FrameDecoder,
    read_buf: Vec<u8>,
    /// Set once the reader hits end of stream
    eof: bool,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(router: Router, reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            router,
            decoder: FrameDecoder::new(),
            read_buf: vec![0u8; 4096],
            eof: false,
        }
    }

    /// Run until shutdown or end of stream
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let Some(frame) = self.next_frame().await else {
                info!("Input stream ended");
                return Ok(());
            };

            if self.handle_frame(frame).await? == Flow::Shutdown {
                return Ok(());
            }
        }
    }

    /// Read the next decodable frame, skipping malformed ones
    ///
    /// Returns `None` at end of stream, after a best-effort parse of any
    /// leftover unterminated bytes (a peer may close without the final
    /// terminator).
    async fn next_frame(&mut self) -> Option<Value> {
        loop {
            match self.decoder.decode_next() {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(e) => {
                    // Skipped, no response; the frame was consumed so the
                    // stream stays in sync
                    error!("Failed to decode command frame: {}", e);
                    continue;
                }
            }

            if self.eof {
                return match self.decoder.finish() {
                    Ok(leftover) => leftover,
                    Err(e) => {
                        error!("Failed to decode trailing bytes: {}", e);
                        None
                    }
                };
            }

            match self.reader.read(&mut self.read_buf).await {
                Ok(0) => self.eof = true,
                Ok(n) => self.decoder.extend(&self.read_buf[..n]),
                Err(e) => {
                    error!("Read error on input stream: {}", e);
                    self.eof = true;
                }
            }
        }
    }

    /// Dispatch every tool call in one envelope, writing one response each
    async fn handle_frame(&mut self, frame: Value) -> anyhow::Result<Flow> {
        info!("Received command: {}", frame);

        let envelope = match CommandEnvelope::from_value(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Malformed envelope is skipped without a response
                error!("Invalid command: {}", e);
                return Ok(Flow::Continue);
            }
        };

        for call in &envelope.tool_calls {
            let dispatch = self
                .router
                .dispatch(call, envelope.context.as_ref(), envelope.system_info.as_ref())
                .await;

            self.write_response(&dispatch.response).await?;

            if dispatch.shutdown {
                info!("Exiting after shutdown");
                return Ok(Flow::Shutdown);
            }
        }

        Ok(Flow::Continue)
    }

    async fn write_response(&mut self, response: &Response) -> anyhow::Result<()> {
        debug!(
            "Sending response: success={} message={:?}",
            response.success, response.message
        );
        let encoded = codec::encode_frame(response);
        self.writer.write_all(&encoded).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginConfig;
    use crate::ifttt::{EventTrigger, TriggerError, TriggerValues};
    use async_trait::async_trait;
    use homeflow_protocol::TERMINATOR;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts trigger calls, always reports success
    struct CountingTrigger {
        calls: AtomicUsize,
    }

    impl CountingTrigger {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventTrigger for CountingTrigger {
        async fn trigger(&self, _: &str, _: TriggerValues) -> Result<u16, TriggerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(200)
        }
    }

    fn test_router(trigger: Arc<dyn EventTrigger>) -> Router {
        let config = PluginConfig::from_json_str(
            r#"{
                "IFTTT_API_KEY": "test-key",
                "SCENES": {"study": "aerovolt_study"},
                "MOBILITY_ACTIONS": {"uav_patrol_yard": "aerovolt_uav_patrol_yard"}
            }"#,
        )
        .expect("valid config");
        Router::new(&config, trigger)
    }

    fn frame(value: serde_json::Value) -> String {
        format!("{value}{TERMINATOR}")
    }

    async fn run_session(input: &str, trigger: Arc<dyn EventTrigger>) -> Vec<Response> {
        let mut output = Vec::new();
        let mut session = Session::new(test_router(trigger), input.as_bytes(), &mut output);
        session.run().await.expect("session should not fail");
        decode_responses(&output)
    }

    fn decode_responses(bytes: &[u8]) -> Vec<Response> {
        let mut decoder = FrameDecoder::new();
        decoder.extend(bytes);
        let mut responses = Vec::new();
        while let Some(value) = decoder.decode_next().expect("well-formed output") {
            responses.push(serde_json::from_value(value).expect("response shape"));
        }
        assert_eq!(decoder.buffer_len(), 0, "trailing bytes in output");
        responses
    }

    #[tokio::test]
    async fn test_one_response_per_tool_call_in_order() {
        let trigger = CountingTrigger::new();
        let input = frame(json!({
            "tool_calls": [
                {"func": "initialize"},
                {"func": "run_scene", "params": {"scene": "study"}},
                {"func": "list_scenes"}
            ]
        }));

        let responses = run_session(&input, trigger.clone()).await;
        assert_eq!(responses.len(), 3);
        assert!(responses[0].message.contains("initialized"));
        assert!(responses[1].message.starts_with("🏠 Scene **study**"));
        assert!(responses[2].message.contains("HomeFlow scenes"));
        assert_eq!(trigger.count(), 1);
    }

    #[tokio::test]
    async fn test_envelopes_processed_in_arrival_order() {
        let trigger = CountingTrigger::new();
        let input = format!(
            "{}{}",
            frame(json!({"tool_calls": [{"func": "list_scenes"}]})),
            frame(json!({"tool_calls": [{"func": "list_mobility_actions"}]})),
        );

        let responses = run_session(&input, trigger).await;
        assert_eq!(responses.len(), 2);
        assert!(responses[0].message.contains("scenes"));
        assert!(responses[1].message.contains("mobility actions"));
    }

    #[tokio::test]
    async fn test_malformed_json_frame_skipped_silently() {
        let trigger = CountingTrigger::new();
        let input = format!(
            "{{oops{TERMINATOR}{}",
            frame(json!({"tool_calls": [{"func": "initialize"}]}))
        );

        let responses = run_session(&input, trigger).await;
        // No response for the bad frame; the next one is processed
        assert_eq!(responses.len(), 1);
        assert!(responses[0].success);
    }

    #[tokio::test]
    async fn test_malformed_envelope_zero_responses() {
        let trigger = CountingTrigger::new();
        let input = format!(
            "{}{}",
            frame(json!({"tool_calls": "not-a-list"})),
            frame(json!({"tool_calls": [{"func": "initialize"}]})),
        );

        let responses = run_session(&input, trigger).await;
        assert_eq!(responses.len(), 1);
        assert!(responses[0].message.contains("initialized"));
    }

    #[tokio::test]
    async fn test_unknown_function_then_loop_continues() {
        let trigger = CountingTrigger::new();
        let input = format!(
            "{}{}",
            frame(json!({"tool_calls": [{"func": "bogus"}]})),
            frame(json!({"tool_calls": [{"func": "initialize"}]})),
        );

        let responses = run_session(&input, trigger).await;
        assert_eq!(responses.len(), 2);
        assert!(!responses[0].success);
        assert!(responses[0].message.contains("bogus"));
        assert!(responses[1].success);
    }

    #[tokio::test]
    async fn test_shutdown_is_terminal_mid_envelope() {
        let trigger = CountingTrigger::new();
        let input = format!(
            "{}{}",
            frame(json!({
                "tool_calls": [
                    {"func": "shutdown"},
                    {"func": "run_scene", "params": {"scene": "study"}}
                ]
            })),
            frame(json!({"tool_calls": [{"func": "initialize"}]})),
        );

        let responses = run_session(&input, trigger.clone()).await;
        // Exactly one response: the shutdown ack. Later tool calls in the
        // envelope and later frames are never executed.
        assert_eq!(responses.len(), 1);
        assert!(responses[0].success);
        assert!(responses[0].message.contains("shutting down"));
        assert_eq!(trigger.count(), 0);
    }

    #[tokio::test]
    async fn test_unterminated_final_frame_is_processed() {
        let trigger = CountingTrigger::new();
        // Peer closed without the terminator: best-effort parse at EOF
        let input = json!({"tool_calls": [{"func": "initialize"}]}).to_string();

        let responses = run_session(&input, trigger).await;
        assert_eq!(responses.len(), 1);
        assert!(responses[0].message.contains("initialized"));
    }

    #[tokio::test]
    async fn test_empty_stream_ends_cleanly() {
        let trigger = CountingTrigger::new();
        let responses = run_session("", trigger).await;
        assert!(responses.is_empty());
    }
}
