//! Text generation capability used by the minutes and summary stages.

use anyhow::Result;
use async_trait::async_trait;

pub mod openai_chat;

pub use openai_chat::OpenAIChatGenerator;

/// Turns a system instruction plus user content into generated text.
///
/// Implementations must be deterministic for identical input (temperature 0).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, system_prompt: &str, user_content: &str) -> Result<String>;
}
