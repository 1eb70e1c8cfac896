use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, ModelIden};
use tracing::{debug, instrument};

use super::{CategorizationProvider, Prompt, ProviderError, ProviderResult};

const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 20;
const TOP_P: f64 = 0.1;

/// Chat-completion provider over `genai`.
#[derive(Clone)]
pub struct GenaiProvider {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl std::fmt::Debug for GenaiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiProvider")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiProvider {
    /// Provider that reads its key from the environment variable `api_key_env`.
    pub fn new(model: impl Into<String>, api_key_env: impl Into<String>) -> Self {
        let env_name: String = api_key_env.into();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_env(env_name.clone())))
            },
        );
        let client = Client::builder().with_auth_resolver(auth_resolver).build();
        Self::with_client(client, model)
    }

    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions::default()
                .with_temperature(TEMPERATURE)
                .with_max_tokens(MAX_TOKENS)
                .with_top_p(TOP_P),
        }
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CategorizationProvider for GenaiProvider {
    #[instrument(skip(self, prompt), fields(model = %self.model, title = prompt.title()))]
    async fn complete(&self, prompt: &Prompt) -> ProviderResult<String> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(prompt.system()),
            ChatMessage::user(prompt.user()),
        ]);

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&self.options))
            .await
            .map_err(|e| ProviderError::request(e.to_string()))?;

        let text = response
            .first_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ProviderError::EmptyResponse)?;
        debug!(response = text, "Provider answered");
        Ok(text.to_string())
    }

    fn name(&self) -> &'static str {
        "genai"
    }
}
