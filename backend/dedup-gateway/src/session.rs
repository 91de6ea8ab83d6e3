//! The Session Loop: one Actix actor per WebSocket connection.
//!
//! Grounded in the teacher's `StreamChatActor`
//! (`backend/user-service/src/services/streaming/ws.rs`), but where that
//! actor fires-and-forgets via `actix_rt::spawn`, this one suspends the
//! mailbox with `ctx.wait` so frame N finishes before frame N+1 is read —
//! the per-session FIFO rule the protocol depends on.

use std::time::Instant;

use actix::{fut, Actor, ActorContext, ActorFutureExt, AsyncContext, StreamHandler};
use actix_web_actors::ws;
use dedup_processor::ProcessOutcome;

use crate::app_state::AppState;
use crate::event;
use crate::metrics;

pub struct GatewaySession {
    state: AppState,
    peer: String,
}

impl GatewaySession {
    pub fn new(state: AppState, peer: String) -> Self {
        Self { state, peer }
    }
}

impl Actor for GatewaySession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            instance_id = %self.state.instance_id,
            peer = %self.peer,
            "session started"
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(peer = %self.peer, "session stopped");
    }
}

fn outcome_label(outcome: ProcessOutcome) -> &'static str {
    match outcome {
        ProcessOutcome::Persisted => "persisted",
        ProcessOutcome::DuplicateSkipped => "duplicate_skipped",
        ProcessOutcome::RetryableFailure => "retryable_failure",
        ProcessOutcome::FatalFailure => "fatal_failure",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_process_outcome_has_a_metric_label() {
        assert_eq!(outcome_label(ProcessOutcome::Persisted), "persisted");
        assert_eq!(outcome_label(ProcessOutcome::DuplicateSkipped), "duplicate_skipped");
        assert_eq!(outcome_label(ProcessOutcome::RetryableFailure), "retryable_failure");
        assert_eq!(outcome_label(ProcessOutcome::FatalFailure), "fatal_failure");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GatewaySession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                let record = match event::decode(&text) {
                    Ok(record) => record,
                    Err(err) => {
                        tracing::warn!(peer = %self.peer, error = %err, "dropping invalid frame");
                        return;
                    }
                };

                let processor = self.state.processor.clone();
                let event_id = record.event_id.clone();
                let start = Instant::now();

                let fut = async move {
                    let outcome = processor.process(&record).await;
                    (outcome, event_id, start.elapsed())
                };

                ctx.wait(fut::wrap_future(fut).map(|(outcome, event_id, elapsed), _act: &mut Self, ctx: &mut ws::WebsocketContext<Self>| {
                    let label = outcome_label(outcome);
                    metrics::observe_process(label, elapsed);

                    let ack = serde_json::json!({
                        "type": "ack",
                        "event_id": event_id,
                        "outcome": label,
                    });
                    ctx.text(ack.to_string());
                }));
            }
            Ok(ws::Message::Ping(payload)) => ctx.pong(&payload),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                tracing::warn!(peer = %self.peer, "continuation frame unsupported, closing");
                ctx.stop();
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!(peer = %self.peer, "binary frame unsupported, closing");
                ctx.stop();
            }
            Ok(ws::Message::Nop) => {}
            Err(err) => {
                tracing::error!(peer = %self.peer, error = %err, "websocket protocol error");
                ctx.stop();
            }
        }
    }
}
