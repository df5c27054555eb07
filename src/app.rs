use crate::config::Config;
use crate::state::{AnswerDraft, ChatConversation, ChatStreamUpdate, PendingQuestion};
use crate::types::ContentBlock;
use crate::ui::render::{QuestionModalView, QuestionOptionRow};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const WELCOME_MESSAGE: &str =
    "Hello, I'm your AI agent. How can I assist you today? Enable skills or MCP for advanced tasks.";

/// Work items for the conversation worker. A stop is not a command: it must
/// land while the worker is busy driving a stream, so it travels through
/// [`StopSignal`] instead of the queue.
#[derive(Debug)]
pub enum ChatCommand {
    Send(String),
    Answer {
        tool_use_id: String,
        answers: BTreeMap<String, String>,
    },
    NewChat,
}

/// Shared slot holding the cancellation token of the turn in flight.
#[derive(Clone, Default)]
pub struct StopSignal(Arc<Mutex<Option<CancellationToken>>>);

impl StopSignal {
    fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.0.lock().unwrap() = Some(token.clone());
        token
    }

    fn clear(&self) {
        self.0.lock().unwrap().take();
    }

    /// Cancel the turn in flight, if any. Returns whether one was armed.
    pub fn trigger(&self) -> bool {
        match self.0.lock().unwrap().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Owns the conversation and processes commands serially, which is what
/// enforces the single-writer rule for conversation state.
pub async fn run_chat_worker(
    mut conversation: ChatConversation,
    mut commands: mpsc::UnboundedReceiver<ChatCommand>,
    updates: mpsc::UnboundedSender<ChatStreamUpdate>,
    stop: StopSignal,
) {
    while let Some(command) = commands.recv().await {
        match command {
            ChatCommand::Send(text) => {
                let token = stop.arm();
                let _ = conversation.send_message(text, token, Some(&updates)).await;
                stop.clear();
            }
            ChatCommand::Answer {
                tool_use_id,
                answers,
            } => {
                let token = stop.arm();
                let _ = conversation
                    .submit_answers(&tool_use_id, answers, token, Some(&updates))
                    .await;
                stop.clear();
            }
            ChatCommand::NewChat => {
                conversation.reset(Some(WELCOME_MESSAGE));
            }
        }
    }
}

/// Interactive state for the question modal: one focused question at a time,
/// a cursor over its options plus a trailing custom free-text row.
pub struct AnswerOverlay {
    draft: AnswerDraft,
    question_index: usize,
    cursor: usize,
    editing_custom: bool,
}

impl AnswerOverlay {
    pub fn new(pending: &PendingQuestion) -> Self {
        Self {
            draft: AnswerDraft::new(pending),
            question_index: 0,
            cursor: 0,
            editing_custom: false,
        }
    }

    fn option_count(&self) -> usize {
        self.draft
            .questions()
            .get(self.question_index)
            .map(|question| question.options.len())
            .unwrap_or(0)
    }

    fn on_custom_row(&self) -> bool {
        self.cursor == self.option_count()
    }

    pub fn move_up(&mut self) {
        self.editing_custom = false;
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.editing_custom = false;
        self.cursor = (self.cursor + 1).min(self.option_count());
    }

    pub fn next_question(&mut self) {
        let count = self.draft.questions().len();
        if count == 0 {
            return;
        }
        self.question_index = (self.question_index + 1) % count;
        self.cursor = 0;
        self.editing_custom = false;
    }

    /// Space on an option toggles it; on the custom row it enters free-text
    /// mode.
    pub fn toggle_focused(&mut self) {
        if self.on_custom_row() {
            self.draft.toggle_custom(self.question_index);
            self.editing_custom = self.draft.custom_text(self.question_index).is_some();
            return;
        }
        let Some(question) = self.draft.questions().get(self.question_index) else {
            return;
        };
        let Some(option) = question.options.get(self.cursor) else {
            return;
        };
        let label = option.label.clone();
        self.draft.toggle_option(self.question_index, &label);
    }

    pub fn is_editing_custom(&self) -> bool {
        self.editing_custom
    }

    pub fn input_char(&mut self, ch: char) {
        if !self.editing_custom {
            return;
        }
        let mut text = self
            .draft
            .custom_text(self.question_index)
            .unwrap_or_default()
            .to_string();
        text.push(ch);
        self.draft.set_custom_text(self.question_index, text);
    }

    pub fn backspace(&mut self) {
        if !self.editing_custom {
            return;
        }
        let mut text = self
            .draft
            .custom_text(self.question_index)
            .unwrap_or_default()
            .to_string();
        text.pop();
        self.draft.set_custom_text(self.question_index, text);
    }

    pub fn stop_editing(&mut self) {
        self.editing_custom = false;
    }

    /// Validated submission payload, or None while incomplete.
    pub fn submission(&self) -> Option<(String, BTreeMap<String, String>)> {
        let answers = self.draft.finalize()?;
        Some((self.draft.tool_use_id().to_string(), answers))
    }

    pub fn view(&self) -> Option<QuestionModalView> {
        let question = self.draft.questions().get(self.question_index)?;
        let options = question
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| QuestionOptionRow {
                label: option.label.clone(),
                description: option.description.clone(),
                selected: self.draft.is_selected(self.question_index, &option.label),
                focused: index == self.cursor,
            })
            .collect();
        Some(QuestionModalView {
            header: question.header.clone(),
            question: question.question.clone(),
            progress: format!(
                "Question {} of {}",
                self.question_index + 1,
                self.draft.questions().len()
            ),
            multi_select: question.multi_select,
            options,
            custom_text: self
                .draft
                .custom_text(self.question_index)
                .unwrap_or_default()
                .to_string(),
            custom_active: self.draft.custom_text(self.question_index).is_some(),
            custom_focused: self.on_custom_row(),
            editing_custom: self.editing_custom,
            complete: self.draft.finalize().is_some(),
        })
    }
}

/// Frontend-side fold of stream updates into printable transcript lines.
/// The worker owns the conversation; this mirror only ever appends.
pub struct ChatApp {
    agent_id: String,
    transcript: Vec<String>,
    session_id: Option<String>,
    busy: bool,
    awaiting_answer: bool,
    overlay: Option<AnswerOverlay>,
    assistant_line_open: bool,
}

impl ChatApp {
    pub fn new(config: &Config) -> Self {
        let mut app = Self {
            agent_id: config.agent_id.clone(),
            transcript: Vec::new(),
            session_id: None,
            busy: false,
            awaiting_answer: false,
            overlay: None,
            assistant_line_open: false,
        };
        app.seed_welcome();
        app
    }

    fn seed_welcome(&mut self) {
        self.push_lines(WELCOME_MESSAGE);
        self.transcript.push(String::new());
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn overlay(&self) -> Option<&AnswerOverlay> {
        self.overlay.as_ref()
    }

    pub fn overlay_mut(&mut self) -> Option<&mut AnswerOverlay> {
        self.overlay.as_mut()
    }

    /// Called when the user submits the modal; the caller sends the returned
    /// payload to the worker.
    pub fn take_overlay_submission(&mut self) -> Option<(String, BTreeMap<String, String>)> {
        let submission = self.overlay.as_ref()?.submission()?;
        self.overlay = None;
        self.awaiting_answer = false;
        self.busy = true;
        self.assistant_line_open = false;
        Some(submission)
    }

    pub fn status_line(&self) -> String {
        let mode = if self.busy {
            "streaming"
        } else if self.awaiting_answer {
            "awaiting answer"
        } else {
            "ready"
        };
        let session = self.session_id.as_deref().unwrap_or("-");
        format!(
            "achat  agent:{}  session:{}  mode:{}  (ctrl-c stop/quit, ctrl-n new chat)",
            self.agent_id, session, mode
        )
    }

    pub fn note_user_message(&mut self, text: &str) {
        for (index, line) in text.lines().enumerate() {
            let prefix = if index == 0 { "> " } else { "  " };
            self.transcript.push(format!("{prefix}{line}"));
        }
        self.busy = true;
        self.assistant_line_open = false;
    }

    pub fn start_new_chat(&mut self) {
        self.transcript.clear();
        self.session_id = None;
        self.busy = false;
        self.awaiting_answer = false;
        self.overlay = None;
        self.assistant_line_open = false;
        self.seed_welcome();
    }

    pub fn apply_update(&mut self, update: ChatStreamUpdate) {
        match update {
            ChatStreamUpdate::SessionStarted { session_id } => {
                self.session_id = Some(session_id);
            }
            ChatStreamUpdate::TextDelta { delta } => self.append_delta(&delta),
            ChatStreamUpdate::BlockStarted { block } => {
                self.assistant_line_open = false;
                self.push_block_line(&block);
            }
            ChatStreamUpdate::QuestionPosed(pending) => {
                self.overlay = Some(AnswerOverlay::new(&pending));
                self.awaiting_answer = true;
                self.busy = false;
            }
            ChatStreamUpdate::TurnError { .. } => {
                // The error text itself arrived as a notice block.
                self.busy = false;
                self.assistant_line_open = false;
                self.transcript.push(String::new());
            }
            ChatStreamUpdate::Stopped => {
                self.busy = false;
                self.assistant_line_open = false;
                self.transcript.push(String::new());
            }
            ChatStreamUpdate::TurnFinished => {
                self.busy = false;
                self.assistant_line_open = false;
                self.transcript.push(String::new());
            }
        }
    }

    fn append_delta(&mut self, delta: &str) {
        let mut parts = delta.split('\n');
        let first = parts.next().unwrap_or_default();
        if self.assistant_line_open {
            if let Some(last) = self.transcript.last_mut() {
                last.push_str(first);
            }
        } else {
            self.transcript.push(first.to_string());
            self.assistant_line_open = true;
        }
        for part in parts {
            self.transcript.push(part.to_string());
        }
    }

    fn push_block_line(&mut self, block: &ContentBlock) {
        match block {
            ContentBlock::Text { text } => self.push_lines(text),
            ContentBlock::ToolUse { name, input, .. } => {
                let preview = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());
                self.transcript.push(format!("[tool] {name} {preview}"));
            }
            ContentBlock::ToolResult {
                content, is_error, ..
            } => {
                let marker = if *is_error { "tool error" } else { "tool result" };
                let body = content.as_deref().unwrap_or("");
                self.transcript.push(format!("[{marker}] {body}"));
            }
            ContentBlock::AskUserQuestion { questions, .. } => {
                for question in questions {
                    self.transcript.push(format!("[question] {}", question.question));
                }
            }
        }
    }

    fn push_lines(&mut self, text: &str) {
        for line in text.lines() {
            self.transcript.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Question, QuestionOption};

    fn sample_config() -> Config {
        Config {
            base_url: "http://localhost:8000".to_string(),
            agent_id: "default".to_string(),
            enable_skills: false,
            enable_mcp: false,
        }
    }

    fn sample_pending() -> PendingQuestion {
        PendingQuestion {
            tool_use_id: "toolu_q1".to_string(),
            questions: vec![Question {
                question: "Which database?".to_string(),
                header: "Database".to_string(),
                options: vec![
                    QuestionOption {
                        label: "Postgres".to_string(),
                        description: "relational".to_string(),
                    },
                    QuestionOption {
                        label: "Redis".to_string(),
                        description: "key-value".to_string(),
                    },
                ],
                multi_select: false,
            }],
        }
    }

    #[test]
    fn test_text_deltas_fold_into_one_transcript_line() {
        let mut app = ChatApp::new(&sample_config());
        app.note_user_message("hello");
        let base_lines = app.transcript().len();

        app.apply_update(ChatStreamUpdate::TextDelta {
            delta: "Hi ".to_string(),
        });
        app.apply_update(ChatStreamUpdate::TextDelta {
            delta: "there".to_string(),
        });

        assert_eq!(app.transcript().len(), base_lines + 1);
        assert_eq!(app.transcript().last().map(String::as_str), Some("Hi there"));
    }

    #[test]
    fn test_question_update_opens_overlay_and_submission_closes_it() {
        let mut app = ChatApp::new(&sample_config());
        app.note_user_message("set up storage");
        app.apply_update(ChatStreamUpdate::QuestionPosed(sample_pending()));
        assert!(app.overlay().is_some());
        assert!(!app.is_busy());

        assert!(
            app.take_overlay_submission().is_none(),
            "incomplete draft must not submit"
        );
        assert!(app.overlay().is_some());

        app.overlay_mut().unwrap().toggle_focused();
        let (tool_use_id, answers) = app
            .take_overlay_submission()
            .expect("answered draft submits");
        assert_eq!(tool_use_id, "toolu_q1");
        assert_eq!(answers["Which database?"], "Postgres");
        assert!(app.overlay().is_none());
        assert!(app.is_busy());
    }

    #[test]
    fn test_overlay_custom_row_accepts_typed_answer() {
        let mut overlay = AnswerOverlay::new(&sample_pending());
        overlay.move_down();
        overlay.move_down();
        overlay.toggle_focused();
        assert!(overlay.is_editing_custom());

        for ch in "DynamoDB".chars() {
            overlay.input_char(ch);
        }
        let (_, answers) = overlay.submission().expect("custom answer completes");
        assert_eq!(answers["Which database?"], "DynamoDB");
    }

    #[test]
    fn test_status_line_tracks_mode() {
        let mut app = ChatApp::new(&sample_config());
        assert!(app.status_line().contains("mode:ready"));
        app.note_user_message("hi");
        assert!(app.status_line().contains("mode:streaming"));
        app.apply_update(ChatStreamUpdate::TurnFinished);
        assert!(app.status_line().contains("mode:ready"));
    }
}
