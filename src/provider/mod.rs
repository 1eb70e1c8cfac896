//! External categorization service.
//!
//! [`CategorizationProvider`] is the seam the retry driver calls through:
//! [`GenaiProvider`] talks to a chat-completion API, [`OfflineProvider`]
//! answers locally, and `ScriptedProvider` replays canned replies in tests.

mod error;
mod llm;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod offline;
pub mod prompt;


use async_trait::async_trait;

pub use error::{ProviderError, ProviderResult};
pub use llm::GenaiProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::{Reply, ScriptedProvider};
pub use offline::OfflineProvider;
pub use prompt::{Prompt, PromptTemplate};

/// Sends one categorization prompt and returns the raw answer text.
#[async_trait]
pub trait CategorizationProvider: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> ProviderResult<String>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
