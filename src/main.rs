//! Catwise HTTP server entrypoint.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use catwise::cache::SimilarityIndex;
use catwise::config::Config;
use catwise::embedding::{MiniLmConfig, MiniLmEmbedder, TitleEmbedder};
use catwise::gateway::{HandlerState, create_router_with_state};
use catwise::pipeline::Pipeline;
use catwise::provider::{CategorizationProvider, GenaiProvider, OfflineProvider};
use catwise::retry::RetryPolicy;
use catwise::storage::NvmeCacheStore;
use catwise::taxonomy::{FallbackTable, Taxonomy};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!(
        r#"
  catwise {}
  product titles in, taxonomy pairs out
"#,
        env!("CARGO_PKG_VERSION")
    );

    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        tier = config.tier.as_str(),
        "Catwise starting"
    );

    std::fs::create_dir_all(&config.storage_path)?;
    let store = NvmeCacheStore::new(config.cache_dir());
    store.ensure_storage_path()?;

    let (embedder_config, embedder_mode) = if let Some(path) = &config.model_path {
        (MiniLmConfig::new(path.clone()), "real")
    } else {
        tracing::warn!("No CATWISE_MODEL_PATH configured, running embedder in stub mode");
        (MiniLmConfig::stub(), "stub")
    };
    let embedder = Arc::new(MiniLmEmbedder::load(embedder_config)?);
    let dim = embedder.embedding_dim();

    let taxonomy = Arc::new(Taxonomy::standard());

    let snapshot_path = config.similarity_snapshot_path();
    let similarity = match SimilarityIndex::load(&snapshot_path, dim, &taxonomy) {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!("Failed to load similarity snapshot: {}. Starting empty.", e);
            SimilarityIndex::new(dim)
        }
    };

    let provider: Arc<dyn CategorizationProvider> = if config.mock_provider {
        tracing::warn!("CATWISE_MOCK_PROVIDER set, answering from the keyword fallback table");
        Arc::new(OfflineProvider::new(FallbackTable::standard(&taxonomy)?))
    } else {
        Arc::new(GenaiProvider::new(
            config.llm_model.clone(),
            config.api_key_env.clone(),
        ))
    };

    let retry = RetryPolicy::default()
        .with_max_attempts(config.max_attempts)
        .with_request_timeout(config.request_timeout);

    let pipeline = Arc::new(
        Pipeline::builder()
            .taxonomy(taxonomy)
            .store(Arc::new(store))
            .exact_capacity(config.l1_capacity)
            .embedder(embedder)
            .similarity_index(Arc::new(similarity))
            .similarity_threshold(config.similarity_threshold)
            .provider(provider)
            .retry_policy(retry)
            .build()?,
    );

    let state = HandlerState::new(pipeline.clone(), config.tier, config.storage_path.clone())
        .with_embedder_mode(embedder_mode);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pipeline, snapshot_path))
        .await?;

    tracing::info!("Catwise shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("CATWISE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(_) => return 1,
    };

    rt.block_on(async {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        {
            Ok(client) => client,
            Err(_) => return 1,
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal(pipeline: Arc<Pipeline>, snapshot_path: PathBuf) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    tracing::info!("Saving similarity snapshot...");
    if let Err(e) = pipeline.save_similarity(&snapshot_path) {
        tracing::error!("Failed to save similarity snapshot: {}", e);
    } else {
        tracing::info!("Similarity snapshot saved.");
    }
}
