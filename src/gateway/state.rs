use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Tier;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct HandlerState {
    pub pipeline: Arc<Pipeline>,

    /// Tier used when a request names none.
    pub default_tier: Tier,

    pub storage_path: PathBuf,

    /// `"real"` or `"stub"`, reported by `/ready`.
    pub embedder_mode: &'static str,
}

impl HandlerState {
    pub fn new(pipeline: Arc<Pipeline>, default_tier: Tier, storage_path: PathBuf) -> Self {
        Self {
            pipeline,
            default_tier,
            storage_path,
            embedder_mode: "real",
        }
    }

    pub fn with_embedder_mode(mut self, mode: &'static str) -> Self {
        self.embedder_mode = mode;
        self
    }
}
