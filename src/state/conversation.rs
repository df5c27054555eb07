mod core;
mod state;
mod streaming;


pub use state::{ChatConversation, ChatStreamUpdate, FeatureFlags};
