// src/api/handlers.rs
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{generate_request_id, AppState, API_KEY_HEADER};
use crate::conversation::Conversation;
use crate::errors::GraderError;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Deserialize)]
pub struct ChatBody {
    /// Conversation so far, as returned by the previous call.
    #[serde(default)]
    pub messages: Conversation,
    pub prompt: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub request_id: String,
    pub reply: String,
    pub messages: Conversation,
}

#[derive(Serialize)]
struct DocumentSummary<'a> {
    source: &'a str,
    pages: usize,
    snippets: usize,
    titles: Vec<&'a str>,
}

// === Handlers ===

pub async fn index_page() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

pub async fn new_conversation() -> HttpResponse {
    HttpResponse::Ok().json(Conversation::with_greeting())
}

pub async fn chat(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ChatBody>,
) -> Result<HttpResponse, GraderError> {
    let request_id = generate_request_id();
    let api_key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let ChatBody { mut messages, prompt } = body.into_inner();
    info!(
        request_id = %request_id,
        history = messages.len(),
        prompt_len = prompt.len(),
        user_key = api_key.is_some(),
        "Chat request"
    );

    let reply = state
        .grader
        .grade(&mut messages, &prompt, api_key.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(ChatResponse {
        request_id,
        reply,
        messages,
    }))
}

pub async fn list_documents(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let library = state.grader.library();
    let documents: Vec<DocumentSummary> = library
        .documents
        .iter()
        .map(|d| DocumentSummary {
            source: &d.source,
            pages: d.pages,
            snippets: d.snippets.len(),
            titles: d.snippets.iter().map(|s| s.title.as_str()).collect(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "chunk_size": library.chunk_size,
        "total_snippets": library.snippet_count(),
        "documents": documents,
    })))
}
