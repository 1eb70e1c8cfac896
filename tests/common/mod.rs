//! Shared harness for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use catwise::config::Tier;
use catwise::embedding::MockEmbedder;
use catwise::gateway::{HandlerState, create_router_with_state};
use catwise::pipeline::{Pipeline, PipelineBuilder};
use catwise::provider::ScriptedProvider;
use catwise::retry::RetryPolicy;
use catwise::storage::NvmeCacheStore;
use serde::Deserialize;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TEST_EMBEDDING_DIM: usize = 4;

/// Builder preset for tests: scripted provider, no retry pauses.
pub fn builder(provider: &Arc<ScriptedProvider>) -> PipelineBuilder {
    Pipeline::builder()
        .provider(provider.clone())
        .retry_policy(RetryPolicy::default().without_pauses())
}

/// Pipeline over an on-disk exact cache rooted at `dir`.
pub fn persistent_pipeline(dir: &Path, provider: &Arc<ScriptedProvider>) -> Pipeline {
    let store = NvmeCacheStore::new(dir.join("category_cache"));
    store.ensure_storage_path().expect("storage path");
    builder(provider)
        .store(Arc::new(store))
        .without_confidence()
        .build()
        .expect("pipeline")
}

pub fn titles(raw: &[&str]) -> Vec<Option<String>> {
    raw.iter().map(|t| Some(t.to_string())).collect()
}

pub struct TestServerConfig {
    pub tier: Tier,
    pub provider: Arc<ScriptedProvider>,
    pub embedder: Option<Arc<MockEmbedder>>,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            tier: Tier::Tier4,
            provider: Arc::new(ScriptedProvider::new()),
            embedder: None,
        }
    }
}

pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    _storage: TempDir,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serves the gateway on an ephemeral port.
pub async fn spawn_test_server(config: TestServerConfig) -> anyhow::Result<TestServer> {
    let storage = TempDir::new()?;
    let store = NvmeCacheStore::new(storage.path().join("category_cache"));
    store.ensure_storage_path()?;

    let mut builder = builder(&config.provider).store(Arc::new(store));
    let embedder_mode = match config.embedder {
        Some(embedder) => {
            builder = builder.embedder(embedder);
            "real"
        }
        None => {
            builder = builder.without_confidence();
            "stub"
        }
    };
    let pipeline = Arc::new(builder.build()?);

    let state = HandlerState::new(pipeline, config.tier, storage.path().to_path_buf())
        .with_embedder_mode(embedder_mode);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        addr,
        handle,
        _storage: storage,
    })
}

#[derive(Debug, Deserialize)]
pub struct HealthBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadyComponents {
    pub http: String,
    pub storage: String,
    pub embedder_mode: String,
    pub confidence: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadyBody {
    pub status: String,
    pub components: ReadyComponents,
}

impl ReadyBody {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

pub struct TestClient {
    base: String,
    http: reqwest::Client,
}

impl TestClient {
    pub fn new(base: String) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    pub async fn health(&self) -> reqwest::Result<HealthBody> {
        self.http
            .get(format!("{}/healthz", self.base))
            .send()
            .await?
            .json()
            .await
    }

    pub async fn ready(&self) -> reqwest::Result<ReadyBody> {
        self.http
            .get(format!("{}/ready", self.base))
            .send()
            .await?
            .json()
            .await
    }

    /// Posts a batch; returns the JSON body and the status code.
    pub async fn categorize(
        &self,
        body: serde_json::Value,
    ) -> reqwest::Result<(serde_json::Value, u16)> {
        let response = self
            .http
            .post(format!("{}/v1/categorize", self.base))
            .json(&body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.json().await?;
        Ok((body, status))
    }
}
