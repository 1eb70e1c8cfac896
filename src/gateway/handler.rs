use std::collections::BTreeMap;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::Tier;
use crate::confidence::ClusterAnalysis;
use crate::constants::{CATWISE_STATUS_CATEGORIZED, CATWISE_STATUS_HEADER};
use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::pipeline::{CategorizationResult, Method};

/// Largest batch accepted in one request.
pub const MAX_TITLES_PER_REQUEST: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    /// Raw titles; `null` entries are categorized as an unknown product.
    pub titles: Vec<Option<String>>,

    #[serde(default)]
    pub tier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub id: String,
    pub tier: Tier,
    pub total: usize,
    pub results: Vec<CategorizationResult>,
    pub method_counts: BTreeMap<Method, usize>,
    pub valid_count: usize,
    /// Results per attempts used, keyed by attempt count.
    pub attempts: BTreeMap<u32, usize>,
    pub low_confidence_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clusters: Option<ClusterAnalysis>,
}

#[instrument(skip_all, fields(titles = tracing::field::Empty, tier = tracing::field::Empty))]
pub async fn categorize_handler(
    State(state): State<HandlerState>,
    Json(request): Json<CategorizeRequest>,
) -> Result<Response, GatewayError> {
    tracing::Span::current().record("titles", request.titles.len());
    if request.titles.len() > MAX_TITLES_PER_REQUEST {
        return Err(GatewayError::InvalidRequest(format!(
            "at most {MAX_TITLES_PER_REQUEST} titles per request, got {}",
            request.titles.len()
        )));
    }

    let tier = match request.tier.as_deref() {
        Some(name) => name.parse::<Tier>()?,
        None => state.default_tier,
    };
    tracing::Span::current().record("tier", tier.as_str());

    let run = state
        .pipeline
        .run(&request.titles, tier.config(), None)
        .await;
    let method_counts = run.method_counts();
    let valid_count = run.valid_count();
    let low_confidence_count = run.low_confidence_count();
    info!(
        total = run.results.len(),
        valid = valid_count,
        low_confidence = low_confidence_count,
        ?method_counts,
        "Categorized batch"
    );

    let body = CategorizeResponse {
        id: uuid::Uuid::new_v4().to_string(),
        tier,
        total: run.results.len(),
        attempts: run.attempt_counts(),
        results: run.results,
        method_counts,
        valid_count,
        low_confidence_count,
        clusters: run.analysis,
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        CATWISE_STATUS_HEADER,
        HeaderValue::from_static(CATWISE_STATUS_CATEGORIZED),
    );
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}
