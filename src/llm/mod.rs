// src/llm/mod.rs

pub mod cohere;
pub mod provider;

pub use cohere::CohereProvider;
pub use provider::{ChatProvider, ChatReply, ChatRequest, PromptTruncation};
