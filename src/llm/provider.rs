// src/llm/provider.rs
// Chat provider abstraction - the grader talks to this, not to a vendor SDK

use serde::Serialize;

use crate::chunker::Snippet;
use crate::conversation::ChatMessage;
use crate::errors::GraderResult;

/// How the API may shorten the prompt when it exceeds the model context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PromptTruncation {
    Auto,
    Off,
}

/// One chat call: prior history, the new message and grounding documents.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub api_key: &'a str,
    pub message: &'a str,
    pub history: &'a [ChatMessage],
    pub documents: &'a [Snippet],
    pub preamble: &'a str,
    pub prompt_truncation: PromptTruncation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
}

/// Implement this to plug in another hosted model.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, request: &ChatRequest<'_>) -> GraderResult<ChatReply>;
    fn model_name(&self) -> &str;
}
