//! Outbound model providers: text embeddings and chat completions.

mod chat;
mod embedding;
mod openai;

pub use chat::{ChatCompletionProvider, ChatMessage, ChatRequest, ChatRole};
pub use embedding::EmbeddingProvider;
pub use openai::{OpenAIConfig, OpenAIProvider};

#[cfg(test)]
pub use chat::MockChatCompletionProvider;
#[cfg(test)]
pub use embedding::MockEmbeddingProvider;
