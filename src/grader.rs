// src/grader.rs
// One grading turn: conversation + essay + reference snippets -> model feedback

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::chunker::Snippet;
use crate::conversation::Conversation;
use crate::errors::{GraderError, GraderResult};
use crate::llm::{ChatProvider, ChatRequest, PromptTruncation};
use crate::monitoring::metrics;
use crate::pdf::ReferenceLibrary;

pub const DEFAULT_PREAMBLE: &str = "You are the AP Grader Bot. You help people by grading their work \
according to College Board's Advanced Placement test guidelines and rubrics.
Using the essay prompt document and the rubric document provided to you, you will grade the input, \
which is the student's essay, on a scale of 0-6.
No points are deducted for an answer, but they may only be added if they fulfill the requirements \
in the rubric according to the documents.
Respond with advice on what the student should add and remove from their essay, as well as how they \
can improve the essay to meet the requirements of getting all the points on the rubric.
Finish with some words of encouragement and some more remarks about their essay to help the student improve it.
";

/// Reads a preamble override, falling back to [`DEFAULT_PREAMBLE`].
pub fn load_preamble(path: Option<&Path>) -> GraderResult<String> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|e| {
                GraderError::Config(format!("Cannot read preamble file {}: {}", p.display(), e))
            })?;
            if text.trim().is_empty() {
                return Err(GraderError::Config(format!("Preamble file {} is empty", p.display())));
            }
            Ok(text)
        }
        None => Ok(DEFAULT_PREAMBLE.to_string()),
    }
}

/// Shared, read-only grading service. Conversation state is always passed in.
pub struct Grader {
    library: Arc<ReferenceLibrary>,
    snippets: Vec<Snippet>,
    provider: Arc<dyn ChatProvider>,
    preamble: String,
    default_api_key: Option<String>,
}

impl Grader {
    pub fn new(
        library: ReferenceLibrary,
        provider: Arc<dyn ChatProvider>,
        preamble: String,
        default_api_key: Option<String>,
    ) -> Self {
        let snippets = library.snippets();
        Self {
            library: Arc::new(library),
            snippets,
            provider,
            preamble,
            default_api_key,
        }
    }

    pub fn library(&self) -> &ReferenceLibrary {
        &self.library
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn has_default_key(&self) -> bool {
        self.default_api_key.is_some()
    }

    /// Grades `essay` and records the exchange in `conversation`.
    ///
    /// The history sent upstream is the conversation as it stood before this
    /// turn. On any error the conversation is left unchanged.
    pub async fn grade(
        &self,
        conversation: &mut Conversation,
        essay: &str,
        api_key: Option<&str>,
    ) -> GraderResult<String> {
        metrics::GRADING_REQUESTS_TOTAL.inc();
        let start = Instant::now();

        let result = self.send(conversation, essay, api_key).await;
        metrics::observe_grading_latency_ms(start.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(reply) => {
                conversation.record_turn(essay, reply.clone());
                info!(
                    turns = conversation.len(),
                    reply_len = reply.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Essay graded"
                );
                Ok(reply)
            }
            Err(e) => {
                metrics::GRADING_FAILURES_TOTAL
                    .with_label_values(&[e.kind()])
                    .inc();
                warn!(error = %e, "Grading failed");
                Err(e)
            }
        }
    }

    async fn send(
        &self,
        conversation: &Conversation,
        essay: &str,
        api_key: Option<&str>,
    ) -> GraderResult<String> {
        if essay.trim().is_empty() {
            return Err(GraderError::InvalidArgument("essay must not be empty".to_string()));
        }

        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or(self.default_api_key.as_deref())
            .ok_or_else(|| {
                GraderError::Unauthenticated("Please add your Cohere API key to continue.".to_string())
            })?;

        let request = ChatRequest {
            api_key,
            message: essay,
            history: conversation.messages(),
            documents: &self.snippets,
            preamble: &self.preamble,
            prompt_truncation: PromptTruncation::Auto,
        };
        let reply = self.provider.chat(&request).await?;
        Ok(reply.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::PageSource;
    use crate::conversation::{ChatMessage, Role};
    use crate::llm::ChatReply;
    use crate::pdf::PdfDocument;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        seen: Mutex<Vec<(String, String, usize, usize)>>,
        fail_with: Option<fn() -> GraderError>,
    }

    #[async_trait::async_trait]
    impl ChatProvider for RecordingProvider {
        async fn chat(&self, request: &ChatRequest<'_>) -> GraderResult<ChatReply> {
            self.seen.lock().unwrap().push((
                request.api_key.to_string(),
                request.message.to_string(),
                request.history.len(),
                request.documents.len(),
            ));
            if let Some(make_err) = self.fail_with {
                return Err(make_err());
            }
            Ok(ChatReply {
                text: format!("Score: 4/6 for {} chars", request.message.len()),
            })
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn library() -> ReferenceLibrary {
        let prompt = PdfDocument::from_pages("lang.pdf", vec!["p".repeat(1200)]);
        let rubric = PdfDocument::from_pages("RUBRIC.pdf", vec!["r".repeat(300)]);
        let sources: [&dyn PageSource; 2] = [&prompt, &rubric];
        ReferenceLibrary::from_sources(&sources, 1000).unwrap()
    }

    fn grader(provider: Arc<RecordingProvider>, key: Option<&str>) -> Grader {
        Grader::new(library(), provider, DEFAULT_PREAMBLE.to_string(), key.map(String::from))
    }

    #[tokio::test]
    async fn test_grade_records_turn() {
        let provider = Arc::new(RecordingProvider::default());
        let grader = grader(provider.clone(), Some("config-key"));
        let mut conv = Conversation::with_greeting();

        let reply = grader.grade(&mut conv, "My essay.", None).await.unwrap();

        assert_eq!(reply, "Score: 4/6 for 9 chars");
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.messages()[1], ChatMessage::user("My essay."));
        assert_eq!(conv.messages()[2].role, Role::Assistant);

        let seen = provider.seen.lock().unwrap();
        // history excludes the essay being graded; all 3 snippets are sent
        assert_eq!(seen[0], ("config-key".to_string(), "My essay.".to_string(), 1, 3));
    }

    #[tokio::test]
    async fn test_request_key_overrides_config_key() {
        let provider = Arc::new(RecordingProvider::default());
        let grader = grader(provider.clone(), Some("config-key"));
        let mut conv = Conversation::new();

        grader.grade(&mut conv, "essay", Some("user-key")).await.unwrap();
        assert_eq!(provider.seen.lock().unwrap()[0].0, "user-key");
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthenticated() {
        let provider = Arc::new(RecordingProvider::default());
        let grader = grader(provider.clone(), None);
        let mut conv = Conversation::with_greeting();

        let err = grader.grade(&mut conv, "essay", Some("  ")).await.unwrap_err();

        assert!(matches!(err, GraderError::Unauthenticated(_)));
        assert_eq!(conv, Conversation::with_greeting());
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_essay_is_rejected() {
        let provider = Arc::new(RecordingProvider::default());
        let grader = grader(provider, Some("k"));
        let mut conv = Conversation::new();

        let err = grader.grade(&mut conv, " \n ", None).await.unwrap_err();
        assert!(matches!(err, GraderError::InvalidArgument(_)));
        assert!(conv.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_conversation_untouched() {
        let provider = Arc::new(RecordingProvider {
            fail_with: Some(|| GraderError::Upstream("503".into())),
            ..Default::default()
        });
        let grader = grader(provider, Some("k"));
        let mut conv = Conversation::with_greeting();

        let err = grader.grade(&mut conv, "essay", None).await.unwrap_err();
        assert_eq!(err.kind(), "upstream");
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn test_load_preamble() {
        assert_eq!(load_preamble(None).unwrap(), DEFAULT_PREAMBLE);

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "Be brief.").unwrap();
        assert_eq!(load_preamble(Some(file.path())).unwrap(), "Be brief.");

        std::fs::write(file.path(), "  ").unwrap();
        assert!(load_preamble(Some(file.path())).is_err());
    }
}
