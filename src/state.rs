pub mod answers;
pub mod conversation;
pub mod message;

pub use answers::AnswerDraft;
pub use conversation::{ChatConversation, ChatStreamUpdate, FeatureFlags};
pub use message::{Message, PendingQuestion, Role, TurnState};
