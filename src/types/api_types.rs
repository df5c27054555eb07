use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One typed unit of assistant output inside a message.
///
/// Wire shape uses a `type` discriminator. The backend emits camelCase field
/// names (`toolUseId`, `isError`) in some events and snake_case in others, so
/// both spellings are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default = "default_json_object")]
        input: serde_json::Value,
    },
    ToolResult {
        #[serde(rename = "toolUseId", alias = "tool_use_id")]
        tool_use_id: String,
        #[serde(default)]
        content: Option<String>,
        #[serde(default, rename = "isError", alias = "is_error")]
        is_error: bool,
    },
    AskUserQuestion {
        #[serde(rename = "toolUseId", alias = "tool_use_id")]
        tool_use_id: String,
        #[serde(default)]
        questions: Vec<Question>,
    },
}

fn default_json_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default, rename = "multiSelect", alias = "multi_select")]
    pub multi_select: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// One decoded frame of the chat stream.
///
/// Closed set of known event types; anything else lands in `Unknown` so a
/// newer backend does not break older clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    SessionStart {
        #[serde(default, rename = "sessionId", alias = "session_id")]
        session_id: Option<String>,
    },
    Assistant {
        #[serde(default)]
        content: Vec<ContentBlock>,
        #[serde(default)]
        model: Option<String>,
    },
    AskUserQuestion {
        #[serde(rename = "toolUseId", alias = "tool_use_id")]
        tool_use_id: String,
        #[serde(default)]
        questions: Vec<Question>,
    },
    Result(TurnResult),
    Error(ErrorEvent),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TurnResult {
    #[serde(default, rename = "sessionId", alias = "session_id")]
    pub session_id: Option<String>,
    #[serde(default, rename = "durationMs", alias = "duration_ms")]
    pub duration_ms: Option<u64>,
    #[serde(default, rename = "totalCostUsd", alias = "total_cost_usd")]
    pub total_cost_usd: Option<f64>,
    #[serde(default, rename = "numTurns", alias = "num_turns")]
    pub num_turns: Option<u32>,
    #[serde(default, rename = "skillName", alias = "skill_name")]
    pub skill_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "suggestedAction", alias = "suggested_action")]
    pub suggested_action: Option<String>,
}

impl ErrorEvent {
    /// Best human-readable message: `message`, then `error`, then `detail`.
    pub fn display_message(&self) -> String {
        [&self.message, &self.error, &self.detail]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| "The agent reported an unspecified error.".to_string())
    }
}

/// Body of `POST /api/chat/stream`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub agent_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub enable_skills: bool,
    pub enable_mcp: bool,
}

/// Body of `POST /api/chat/answer`, resuming a turn suspended on an
/// `ask_user_question` block. `answers` maps question text to answer text.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRequest {
    pub agent_id: String,
    pub session_id: String,
    pub tool_use_id: String,
    pub answers: BTreeMap<String, String>,
    pub enable_skills: bool,
    pub enable_mcp: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterruptResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    #[serde(default, rename = "agentId", alias = "agent_id")]
    pub agent_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default, rename = "lastAccessedAt", alias = "last_accessed_at")]
    pub last_accessed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_start_accepts_both_id_spellings() {
        let camel: StreamEvent =
            serde_json::from_str(r#"{"type":"session_start","sessionId":"s1"}"#).unwrap();
        let snake: StreamEvent =
            serde_json::from_str(r#"{"type":"session_start","session_id":"s1"}"#).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(
            camel,
            StreamEvent::SessionStart {
                session_id: Some("s1".to_string())
            }
        );
    }

    #[test]
    fn test_unknown_event_type_is_tolerated() {
        let event: StreamEvent =
            serde_json::from_str(r#"{"type":"telemetry","payload":{"x":1}}"#).unwrap();
        assert_eq!(event, StreamEvent::Unknown);
    }

    #[test]
    fn test_tool_use_without_input_defaults_to_empty_object() {
        let block: ContentBlock =
            serde_json::from_str(r#"{"type":"tool_use","id":"toolu_1","name":"Bash"}"#).unwrap();
        match block {
            ContentBlock::ToolUse { input, .. } => assert_eq!(input, serde_json::json!({})),
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn test_ask_user_question_event_parses_questions() {
        let raw = r#"{
            "type": "ask_user_question",
            "toolUseId": "toolu_q1",
            "questions": [{
                "question": "Which region?",
                "header": "Region",
                "options": [
                    {"label": "us-east-1", "description": "N. Virginia"},
                    {"label": "eu-west-1", "description": "Ireland"}
                ],
                "multiSelect": false
            }]
        }"#;
        let event: StreamEvent = serde_json::from_str(raw).unwrap();
        match event {
            StreamEvent::AskUserQuestion {
                tool_use_id,
                questions,
            } => {
                assert_eq!(tool_use_id, "toolu_q1");
                assert_eq!(questions.len(), 1);
                assert_eq!(questions[0].options[1].label, "eu-west-1");
                assert!(!questions[0].multi_select);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_result_event_session_id_snake_case() {
        // The backend emits `session_id` on result events but `sessionId` on
        // session_start; both must resolve to the same field.
        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"result","session_id":"s9","duration_ms":120,"num_turns":2}"#,
        )
        .unwrap();
        match event {
            StreamEvent::Result(result) => {
                assert_eq!(result.session_id.as_deref(), Some("s9"));
                assert_eq!(result.duration_ms, Some(120));
                assert_eq!(result.num_turns, Some(2));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_error_event_message_preference_order() {
        let only_detail = ErrorEvent {
            detail: Some("stack".into()),
            ..Default::default()
        };
        assert_eq!(only_detail.display_message(), "stack");

        let full = ErrorEvent {
            error: Some("boom".into()),
            message: Some("Agent execution failed".into()),
            detail: Some("stack".into()),
            ..Default::default()
        };
        assert_eq!(full.display_message(), "Agent execution failed");

        assert_eq!(
            ErrorEvent::default().display_message(),
            "The agent reported an unspecified error."
        );
    }

    #[test]
    fn test_session_summary_and_interrupt_response_decode() {
        let sessions: Vec<SessionSummary> = serde_json::from_str(
            r#"[{"id":"s1","agentId":"default","title":"Python script for data analysis","createdAt":"2025-01-01T10:30:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(sessions[0].id, "s1");
        assert_eq!(sessions[0].agent_id, "default");
        assert!(sessions[0].last_accessed_at.is_none());

        let response: InterruptResponse =
            serde_json::from_str(r#"{"success":true,"message":"Session interrupted successfully"}"#)
                .unwrap();
        assert!(response.success);
    }

    #[test]
    fn test_chat_request_omits_absent_session_id() {
        let request = ChatRequest {
            agent_id: "default".into(),
            message: "hello".into(),
            session_id: None,
            enable_skills: false,
            enable_mcp: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("session_id").is_none());
        assert_eq!(value["enable_mcp"], serde_json::json!(true));
    }
}
