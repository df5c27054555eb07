mod api_types;

pub use api_types::{
    AnswerRequest, ChatRequest, ContentBlock, ErrorEvent, InterruptResponse, Question,
    QuestionOption, SessionSummary, StreamEvent, TurnResult,
};
