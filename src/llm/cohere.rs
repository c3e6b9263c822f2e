// src/llm/cohere.rs
// Cohere v1 chat endpoint over reqwest

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::provider::{ChatProvider, ChatReply, ChatRequest, PromptTruncation};
use crate::config::LlmConfig;
use crate::conversation::{ChatMessage, Role};
use crate::errors::{GraderError, GraderResult};

const DEFAULT_MODEL_LABEL: &str = "cohere-default";

pub struct CohereProvider {
    base_url: String,
    model: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CohereChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    message: &'a str,
    chat_history: Vec<CohereMessage<'a>>,
    documents: Vec<CohereDocument<'a>>,
    preamble: &'a str,
    prompt_truncation: PromptTruncation,
}

#[derive(Serialize)]
struct CohereMessage<'a> {
    role: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct CohereDocument<'a> {
    title: &'a str,
    snippet: &'a str,
}

#[derive(Deserialize)]
struct CohereChatResponse {
    text: String,
}

#[derive(Deserialize)]
struct CohereErrorBody {
    message: String,
}

impl<'a> From<&'a ChatMessage> for CohereMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        let role = match msg.role {
            Role::User => "USER",
            Role::Assistant => "CHATBOT",
        };
        Self {
            role,
            message: &msg.text,
        }
    }
}

impl<'a> CohereChatRequest<'a> {
    fn build(model: Option<&'a str>, request: &'a ChatRequest<'a>) -> Self {
        Self {
            model,
            message: request.message,
            chat_history: request.history.iter().map(CohereMessage::from).collect(),
            documents: request
                .documents
                .iter()
                .map(|s| CohereDocument {
                    title: &s.title,
                    snippet: &s.text,
                })
                .collect(),
            preamble: request.preamble,
            prompt_truncation: request.prompt_truncation,
        }
    }
}

impl CohereProvider {
    pub fn new(config: &LlmConfig) -> GraderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GraderError::Config(format!("Cannot build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            client,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat", self.base_url)
    }
}

/// Maps a non-success status to the matching error kind.
fn status_error(status: StatusCode, body: &str) -> GraderError {
    let detail = serde_json::from_str::<CohereErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GraderError::Unauthenticated(format!("API key rejected: {}", detail))
        }
        _ => GraderError::Upstream(format!("{} - {}", status, detail)),
    }
}

#[async_trait::async_trait]
impl ChatProvider for CohereProvider {
    async fn chat(&self, request: &ChatRequest<'_>) -> GraderResult<ChatReply> {
        debug!(
            model = %self.model_name(),
            history = request.history.len(),
            documents = request.documents.len(),
            message_len = request.message.len(),
            "Sending chat request"
        );

        let body = CohereChatRequest::build(self.model.as_deref(), request);
        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(request.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GraderError::Upstream(format!("Cannot reach {}: {}", self.base_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Chat API returned an error");
            return Err(status_error(status, &text));
        }

        let reply: CohereChatResponse = response
            .json()
            .await
            .map_err(|e| GraderError::InvalidResponse(e.to_string()))?;

        info!(model = %self.model_name(), reply_len = reply.text.len(), "Chat reply received");
        Ok(ChatReply { text: reply.text })
    }

    fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL_LABEL)
    }
}
