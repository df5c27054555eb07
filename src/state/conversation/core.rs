use super::state::{ActiveTurn, ChatConversation, ChatStreamUpdate};
use super::streaming::{emit_update, TurnProgress};
use crate::api::client::ByteStream;
use crate::api::logging::emit_interrupt_failure;
use crate::api::stream::StreamParser;
use crate::state::message::{Message, TurnState};
use crate::types::{AnswerRequest, ChatRequest};
use anyhow::Result;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub(super) const STOPPED_NOTICE: &str = "Generation stopped by user.";

enum TurnEnd {
    /// `[DONE]` sentinel or natural end-of-stream.
    Completed,
    /// Turn suspended on an `ask_user_question` block.
    Suspended,
    /// A protocol `error` event was folded; state already updated.
    ErrorFolded,
    /// The byte stream itself failed mid-read.
    TransportError(String),
    Cancelled,
}

impl ChatConversation {
    /// Start a new turn. Rejected without any state change unless the
    /// conversation is idle; the caller keeps `cancel` to stop the turn from
    /// another task.
    pub async fn send_message(
        &mut self,
        text: String,
        cancel: CancellationToken,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) -> Result<bool> {
        if self.turn != TurnState::Idle {
            return Ok(false);
        }

        let user_id = self.next_id();
        self.messages.push(Message::user(user_id, text.clone()));
        let assistant_id = self.next_id();
        self.messages
            .push(Message::assistant_placeholder(assistant_id));
        self.turn = TurnState::Streaming;
        self.last_error = None;
        self.active = Some(ActiveTurn {
            cancel: cancel.clone(),
        });

        let request = ChatRequest {
            agent_id: self.agent_id.clone(),
            message: text,
            session_id: self.session_id.clone(),
            enable_skills: self.features.enable_skills,
            enable_mcp: self.features.enable_mcp,
        };
        let client = Arc::clone(&self.client);
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = client.chat_stream(&request) => Some(opened),
        };
        self.consume_stream(opened, cancel, updates).await;
        Ok(true)
    }

    /// Resume a turn that suspended on an `ask_user_question` block. A
    /// missing pending question or a mismatched `tool_use_id` is a no-op.
    pub async fn submit_answers(
        &mut self,
        tool_use_id: &str,
        answers: BTreeMap<String, String>,
        cancel: CancellationToken,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) -> Result<bool> {
        let matches_pending = self
            .pending_question
            .as_ref()
            .is_some_and(|pending| pending.tool_use_id == tool_use_id);
        if !matches_pending {
            return Ok(false);
        }
        // A question only ever arrives on an established session.
        let Some(session_id) = self.session_id.clone() else {
            return Ok(false);
        };

        self.pending_question = None;
        let assistant_id = self.next_id();
        self.messages
            .push(Message::assistant_placeholder(assistant_id));
        self.turn = TurnState::Streaming;
        self.last_error = None;
        self.active = Some(ActiveTurn {
            cancel: cancel.clone(),
        });

        let request = AnswerRequest {
            agent_id: self.agent_id.clone(),
            session_id,
            tool_use_id: tool_use_id.to_string(),
            answers,
            enable_skills: self.features.enable_skills,
            enable_mcp: self.features.enable_mcp,
        };
        let client = Arc::clone(&self.client);
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = client.answer_stream(&request) => Some(opened),
        };
        self.consume_stream(opened, cancel, updates).await;
        Ok(true)
    }

    async fn consume_stream(
        &mut self,
        opened: Option<Result<ByteStream>>,
        cancel: CancellationToken,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) {
        let mut stream = match opened {
            Some(Ok(stream)) => stream,
            Some(Err(error)) => {
                // Transport failure before the first frame takes the same
                // exit as a protocol error event.
                self.active = None;
                self.fail_turn(error.to_string(), updates);
                return;
            }
            None => {
                self.active = None;
                self.finish_cancelled(updates).await;
                return;
            }
        };

        let mut parser = StreamParser::new();
        let end = 'read: loop {
            let maybe_chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'read TurnEnd::Cancelled,
                maybe_chunk = stream.next() => maybe_chunk,
            };
            let chunk = match maybe_chunk {
                Some(Ok(chunk)) => chunk,
                // An abort surfaces as a read error; it is not a failure.
                Some(Err(_)) if cancel.is_cancelled() => break 'read TurnEnd::Cancelled,
                Some(Err(error)) => break 'read TurnEnd::TransportError(error.to_string()),
                None => break 'read TurnEnd::Completed,
            };

            for event in parser.process(&chunk) {
                // Frames raced in after a cancel request are discarded.
                if cancel.is_cancelled() {
                    break 'read TurnEnd::Cancelled;
                }
                match self.apply_event(event, updates) {
                    TurnProgress::Continue => {}
                    TurnProgress::Suspend => break 'read TurnEnd::Suspended,
                    TurnProgress::EndTurn => break 'read TurnEnd::ErrorFolded,
                }
            }
            if parser.is_done() {
                break 'read TurnEnd::Completed;
            }
        };

        // Abort the request before any follow-up call.
        drop(stream);
        self.active = None;

        match end {
            TurnEnd::Completed => {
                self.turn = TurnState::Idle;
                emit_update(updates, ChatStreamUpdate::TurnFinished);
            }
            TurnEnd::Suspended => {
                // apply_event already moved to AwaitingAnswer.
            }
            TurnEnd::ErrorFolded => {}
            TurnEnd::TransportError(message) => {
                self.fail_turn(message, updates);
            }
            TurnEnd::Cancelled => {
                self.finish_cancelled(updates).await;
            }
        }
    }

    /// End the turn with a visible error; the conversation stays usable.
    pub(super) fn fail_turn(
        &mut self,
        message: String,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) {
        self.push_notice_block(format!("Error: {message}"), updates);
        self.last_error = Some(message.clone());
        self.turn = TurnState::Idle;
        emit_update(updates, ChatStreamUpdate::TurnError { message });
    }

    async fn finish_cancelled(
        &mut self,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) {
        if let Some(session_id) = self.session_id.clone() {
            // Best-effort server-side interrupt; the stream may already have
            // finished on its own.
            if let Err(error) = self.client.interrupt(&session_id).await {
                emit_interrupt_failure(&session_id, &error);
            }
        }
        self.push_notice_block(STOPPED_NOTICE.to_string(), updates);
        self.turn = TurnState::Idle;
        emit_update(updates, ChatStreamUpdate::Stopped);
    }
}
