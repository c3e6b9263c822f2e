// src/config.rs
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::chunker::DEFAULT_CHUNK_SIZE;
use crate::errors::{GraderError, GraderResult};

pub const DEFAULT_REFERENCE_DOCS: &str = "docs/lang.pdf,docs/RUBRIC.pdf";
pub const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.ai";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub reference_docs: Vec<PathBuf>,
    pub chunk_size: usize,
    pub llm: LlmConfig,
}

/// Chat API settings. The key may be absent; requests then need one of their own.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: Option<String>,
    pub timeout: Duration,
    pub preamble_file: Option<PathBuf>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("preamble_file", &self.preamble_file)
            .finish()
    }
}

impl ApiConfig {
    pub fn from_env() -> GraderResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> GraderResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("GRADER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match get("GRADER_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| GraderError::Config(format!("GRADER_PORT must be a valid u16, got '{}'", raw)))?,
            None => 8501,
        };

        let reference_docs = parse_doc_list(&get("REFERENCE_DOCS").unwrap_or_else(|| DEFAULT_REFERENCE_DOCS.to_string()));
        if reference_docs.is_empty() {
            return Err(GraderError::Config("REFERENCE_DOCS lists no documents".to_string()));
        }

        let chunk_size = match get("CHUNK_SIZE") {
            Some(raw) => parse_chunk_size(&raw)?,
            None => DEFAULT_CHUNK_SIZE,
        };

        let timeout_secs = match get("COHERE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                GraderError::Config(format!("COHERE_TIMEOUT_SECS must be a number of seconds, got '{}'", raw))
            })?,
            None => 60,
        };

        let llm = LlmConfig {
            api_key: get("COHERE_API_KEY"),
            base_url: get("COHERE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COHERE_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: get("COHERE_MODEL"),
            timeout: Duration::from_secs(timeout_secs),
            preamble_file: get("GRADER_PREAMBLE_FILE").map(PathBuf::from),
        };

        Ok(Self {
            host,
            port,
            reference_docs,
            chunk_size,
            llm,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_doc_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Parses a chunk size, rejecting zero and negative values.
pub fn parse_chunk_size(raw: &str) -> GraderResult<usize> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| GraderError::InvalidArgument(format!("chunk size must be an integer, got '{}'", raw)))?;
    if value <= 0 {
        return Err(GraderError::InvalidArgument(format!(
            "chunk size must be positive, got {}",
            value
        )));
    }
    usize::try_from(value)
        .map_err(|_| GraderError::InvalidArgument(format!("chunk size {} is too large", value)))
}
