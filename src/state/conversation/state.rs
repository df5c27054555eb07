use crate::api::BackendClient;
use crate::config::Config;
use crate::state::message::{Message, PendingQuestion, Role, TurnState};
use crate::types::ContentBlock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Progress notifications emitted while a turn streams. Everything here is
/// derivable from the conversation state afterwards; the channel exists so a
/// frontend can follow along without polling.
#[derive(Debug, Clone)]
pub enum ChatStreamUpdate {
    SessionStarted { session_id: String },
    TextDelta { delta: String },
    BlockStarted { block: ContentBlock },
    QuestionPosed(PendingQuestion),
    TurnError { message: String },
    Stopped,
    TurnFinished,
}

/// Auxiliary backend capabilities toggled per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureFlags {
    pub enable_skills: bool,
    pub enable_mcp: bool,
}

impl FeatureFlags {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enable_skills: config.enable_skills,
            enable_mcp: config.enable_mcp,
        }
    }
}

/// Handle for the turn currently consuming a stream. Created when the turn
/// starts, cleared when it ends; its token is the one cancellation authority
/// for the turn.
pub(super) struct ActiveTurn {
    pub(super) cancel: CancellationToken,
}

/// The in-memory transcript and turn state machine for one chat with one
/// agent. All mutation happens on the single task driving a turn; at most
/// one turn can be streaming or awaiting an answer at a time.
pub struct ChatConversation {
    pub(super) client: Arc<BackendClient>,
    pub(super) agent_id: String,
    pub(super) features: FeatureFlags,
    pub(super) messages: Vec<Message>,
    pub(super) session_id: Option<String>,
    pub(super) turn: TurnState,
    pub(super) pending_question: Option<PendingQuestion>,
    pub(super) active: Option<ActiveTurn>,
    pub(super) last_error: Option<String>,
    pub(super) next_message_id: u64,
}

impl ChatConversation {
    pub fn new(client: BackendClient, agent_id: impl Into<String>, features: FeatureFlags) -> Self {
        Self {
            client: Arc::new(client),
            agent_id: agent_id.into(),
            features,
            messages: Vec::new(),
            session_id: None,
            turn: TurnState::Idle,
            pending_question: None,
            active: None,
            last_error: None,
            next_message_id: 0,
        }
    }

    pub fn with_welcome(
        client: BackendClient,
        agent_id: impl Into<String>,
        features: FeatureFlags,
        welcome: &str,
    ) -> Self {
        let mut conversation = Self::new(client, agent_id, features);
        conversation.reset(Some(welcome));
        conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn
    }

    pub fn pending_question(&self) -> Option<&PendingQuestion> {
        self.pending_question.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Token of the in-flight turn, if one is streaming.
    pub fn cancel_handle(&self) -> Option<CancellationToken> {
        self.active.as_ref().map(|active| active.cancel.clone())
    }

    /// Discard the whole transcript and start over, optionally reseeding a
    /// synthetic welcome message. Any in-flight turn is cancelled.
    pub fn reset(&mut self, welcome: Option<&str>) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
        self.active = None;
        self.messages.clear();
        self.session_id = None;
        self.pending_question = None;
        self.last_error = None;
        self.turn = TurnState::Idle;
        self.next_message_id = 0;

        if let Some(welcome) = welcome {
            let id = self.next_id();
            let mut message = Message::assistant_placeholder(id);
            message.content.push(ContentBlock::Text {
                text: welcome.to_string(),
            });
            self.messages.push(message);
        }
    }

    pub(super) fn next_id(&mut self) -> u64 {
        self.next_message_id += 1;
        self.next_message_id
    }

    /// The assistant message the current turn streams into. During a turn
    /// the placeholder is always the last transcript entry, so no scan is
    /// needed.
    pub(super) fn current_assistant_mut(&mut self) -> Option<&mut Message> {
        self.messages
            .last_mut()
            .filter(|message| message.role == Role::Assistant)
    }
}
