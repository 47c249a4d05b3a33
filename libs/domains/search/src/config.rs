use core_config::{ConfigError, FromEnv, env_flag, env_parse_or};
use std::time::Duration;

use crate::providers::OpenAIConfig;
use crate::rag::DEFAULT_RERANK_TIMEOUT;

pub const DEFAULT_SIMILARITY_FLOOR: f32 = 0.3;
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8000;
pub const DEFAULT_CANDIDATE_CAP: u64 = 1000;
pub const DEFAULT_BACKFILL_BATCH_SIZE: u64 = 50;

/// Semantic search tuning, loaded from the environment
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// `None` disables every embedding dependent operation
    pub openai: Option<OpenAIConfig>,
    /// Candidates scoring at or below this are dropped
    pub similarity_floor: f32,
    /// Embedding input is cut to this many characters
    pub max_input_chars: usize,
    /// Upper bound on candidates fetched per search
    pub candidate_cap: u64,
    /// Pause between provider calls during a backfill
    pub backfill_delay: Duration,
    pub backfill_batch_size: u64,
    /// Deadline for a single search or RAG search
    pub request_timeout: Duration,
    pub rerank_enabled: bool,
    /// Reranks slower than this fall back to vector order
    pub rerank_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            openai: None,
            similarity_floor: DEFAULT_SIMILARITY_FLOOR,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            backfill_delay: Duration::from_millis(100),
            backfill_batch_size: DEFAULT_BACKFILL_BATCH_SIZE,
            request_timeout: Duration::from_secs(30),
            rerank_enabled: true,
            rerank_timeout: DEFAULT_RERANK_TIMEOUT,
        }
    }
}

impl SearchConfig {
    pub fn embeddings_enabled(&self) -> bool {
        self.openai.is_some()
    }
}

impl FromEnv for SearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let similarity_floor = env_parse_or("SEARCH_SIMILARITY_FLOOR", DEFAULT_SIMILARITY_FLOOR)?;
        if !(-1.0..=1.0).contains(&similarity_floor) {
            return Err(ConfigError::InvalidValue {
                key: "SEARCH_SIMILARITY_FLOOR".to_string(),
                details: format!("{} is outside [-1, 1]", similarity_floor),
            });
        }

        let max_input_chars = env_parse_or("EMBEDDING_MAX_INPUT_CHARS", DEFAULT_MAX_INPUT_CHARS)?;
        let candidate_cap = env_parse_or("SEARCH_CANDIDATE_CAP", DEFAULT_CANDIDATE_CAP)?;
        let backfill_batch_size =
            env_parse_or("BACKFILL_BATCH_SIZE", DEFAULT_BACKFILL_BATCH_SIZE)?;

        for (key, value) in [
            ("EMBEDDING_MAX_INPUT_CHARS", max_input_chars as u64),
            ("SEARCH_CANDIDATE_CAP", candidate_cap),
            ("BACKFILL_BATCH_SIZE", backfill_batch_size),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    details: "must be greater than zero".to_string(),
                });
            }
        }

        Ok(Self {
            openai: OpenAIConfig::from_env()?,
            similarity_floor,
            max_input_chars,
            candidate_cap,
            backfill_delay: Duration::from_millis(env_parse_or("BACKFILL_DELAY_MS", 100u64)?),
            backfill_batch_size,
            request_timeout: Duration::from_secs(env_parse_or("SEARCH_REQUEST_TIMEOUT_SECS", 30u64)?),
            rerank_enabled: env_flag("RAG_RERANK_ENABLED", true)?,
            rerank_timeout: Duration::from_secs(env_parse_or(
                "RAG_RERANK_TIMEOUT_SECS",
                DEFAULT_RERANK_TIMEOUT.as_secs(),
            )?),
        })
    }
}
