use async_trait::async_trait;

use super::{CategorizationProvider, Prompt, ProviderResult};
use crate::taxonomy::FallbackTable;

/// Credential-free provider that answers from the keyword fallback table.
///
/// Used when the service is disabled (`CATWISE_MOCK_PROVIDER`), so the HTTP
/// surface and the cache tiers can be exercised without network access.
#[derive(Debug, Clone)]
pub struct OfflineProvider {
    table: FallbackTable,
}

impl OfflineProvider {
    pub fn new(table: FallbackTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl CategorizationProvider for OfflineProvider {
    async fn complete(&self, prompt: &Prompt) -> ProviderResult<String> {
        Ok(self.table.classify(prompt.title()).to_string())
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}
