use crate::types::{ContentBlock, Question};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn contribution in the transcript. Content grows in place while the
/// owning turn streams; messages are never deleted individually, only the
/// whole conversation is cleared.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub content: Vec<ContentBlock>,
    pub created_at: SystemTime,
    pub model: Option<String>,
}

impl Message {
    pub fn user(id: u64, text: String) -> Self {
        Self {
            id,
            role: Role::User,
            content: vec![ContentBlock::Text { text }],
            created_at: SystemTime::now(),
            model: None,
        }
    }

    pub fn assistant_placeholder(id: u64) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: Vec::new(),
            created_at: SystemTime::now(),
            model: None,
        }
    }

    /// Concatenation of all text blocks, in arrival order.
    pub fn rendered_text(&self) -> String {
        let mut out = String::new();
        for block in &self.content {
            if let ContentBlock::Text { text } = block {
                out.push_str(text);
            }
        }
        out
    }
}

/// Where the conversation is inside the current turn.
///
/// Error outcomes do not get their own state: an `error` event or transport
/// failure ends the turn and returns to `Idle` with the message in the
/// transcript, so the conversation is always immediately usable again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Streaming,
    AwaitingAnswer,
}

/// The one outstanding `ask_user_question` block, if any. Exists exactly
/// until answers for its `tool_use_id` are submitted or the conversation is
/// reset.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuestion {
    pub tool_use_id: String,
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_text_skips_non_text_blocks() {
        let mut message = Message::assistant_placeholder(1);
        message.content.push(ContentBlock::Text {
            text: "Hi ".to_string(),
        });
        message.content.push(ContentBlock::ToolUse {
            id: "toolu_1".to_string(),
            name: "Bash".to_string(),
            input: serde_json::json!({"command": "ls"}),
        });
        message.content.push(ContentBlock::Text {
            text: "there".to_string(),
        });

        assert_eq!(message.rendered_text(), "Hi there");
    }

    #[test]
    fn test_user_message_carries_single_text_block() {
        let message = Message::user(7, "hello".to_string());
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content.len(), 1);
        assert_eq!(message.rendered_text(), "hello");
    }
}
