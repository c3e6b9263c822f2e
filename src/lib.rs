pub mod api;
pub mod chunker;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod grader;
pub mod llm;
pub mod monitoring;
pub mod pdf;

pub use chunker::{chunk_document, chunk_pages, PageSource, Snippet};
pub use conversation::{ChatMessage, Conversation, Role};
pub use errors::{GraderError, GraderResult};
pub use grader::Grader;
