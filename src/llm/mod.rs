pub mod openai_compatible;
pub mod provider;
pub mod types;

pub use openai_compatible::OpenAiCompatibleProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest};
