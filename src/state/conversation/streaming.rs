use super::state::{ChatConversation, ChatStreamUpdate};
use crate::state::message::{PendingQuestion, TurnState};
use crate::types::{ContentBlock, StreamEvent};
use tokio::sync::mpsc;

/// What the stream loop should do after folding one event.
pub(super) enum TurnProgress {
    Continue,
    /// Stop reading: the turn is parked until answers are submitted.
    Suspend,
    /// Stop reading: the turn ended (error already applied).
    EndTurn,
}

impl ChatConversation {
    /// Fold one decoded event onto the conversation, in arrival order. This
    /// is the whole reducer; the transport loop never mutates state itself.
    pub(super) fn apply_event(
        &mut self,
        event: StreamEvent,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) -> TurnProgress {
        match event {
            StreamEvent::SessionStart { session_id } => {
                if let Some(session_id) = session_id {
                    self.store_session_id(session_id, updates);
                }
                TurnProgress::Continue
            }
            StreamEvent::Assistant { content, model } => {
                for block in content {
                    self.append_block(block, updates);
                }
                if model.is_some() {
                    if let Some(message) = self.current_assistant_mut() {
                        message.model = model;
                    }
                }
                TurnProgress::Continue
            }
            StreamEvent::AskUserQuestion {
                tool_use_id,
                questions,
            } => {
                self.append_block(
                    ContentBlock::AskUserQuestion {
                        tool_use_id: tool_use_id.clone(),
                        questions: questions.clone(),
                    },
                    updates,
                );
                let pending = PendingQuestion {
                    tool_use_id,
                    questions,
                };
                self.pending_question = Some(pending.clone());
                self.turn = TurnState::AwaitingAnswer;
                emit_update(updates, ChatStreamUpdate::QuestionPosed(pending));
                TurnProgress::Suspend
            }
            StreamEvent::Result(result) => {
                if let Some(session_id) = result.session_id {
                    self.store_session_id(session_id, updates);
                }
                TurnProgress::Continue
            }
            StreamEvent::Error(error) => {
                self.fail_turn(error.display_message(), updates);
                TurnProgress::EndTurn
            }
            StreamEvent::Unknown => TurnProgress::Continue,
        }
    }

    /// Last-write-wins: a later event may reassign the id, e.g. when the
    /// backend resumes under a fresh session.
    fn store_session_id(
        &mut self,
        session_id: String,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) {
        if self.session_id.as_deref() == Some(session_id.as_str()) {
            return;
        }
        self.session_id = Some(session_id.clone());
        emit_update(updates, ChatStreamUpdate::SessionStarted { session_id });
    }

    /// Append one content block to the message the turn is streaming into.
    /// Consecutive text blocks merge; the rendered text is identical either
    /// way, and the transcript stays compact.
    pub(super) fn append_block(
        &mut self,
        block: ContentBlock,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) {
        let Some(message) = self.current_assistant_mut() else {
            return;
        };
        match block {
            ContentBlock::Text { text } => {
                if let Some(ContentBlock::Text { text: existing }) = message.content.last_mut() {
                    existing.push_str(&text);
                } else {
                    message.content.push(ContentBlock::Text { text: text.clone() });
                }
                emit_update(updates, ChatStreamUpdate::TextDelta { delta: text });
            }
            other => {
                message.content.push(other.clone());
                emit_update(updates, ChatStreamUpdate::BlockStarted { block: other });
            }
        }
    }

    /// Append a standalone synthetic text block (stop notice, error text).
    /// Never merged into streamed text, so it stays identifiable.
    pub(super) fn push_notice_block(
        &mut self,
        text: String,
        updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    ) {
        let Some(message) = self.current_assistant_mut() else {
            return;
        };
        let block = ContentBlock::Text { text };
        message.content.push(block.clone());
        emit_update(updates, ChatStreamUpdate::BlockStarted { block });
    }
}

pub(super) fn emit_update(
    updates: Option<&mpsc::UnboundedSender<ChatStreamUpdate>>,
    update: ChatStreamUpdate,
) {
    if let Some(tx) = updates {
        let _ = tx.send(update);
    }
}
