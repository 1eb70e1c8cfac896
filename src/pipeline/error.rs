use thiserror::Error;

use crate::storage::StorageError;
use crate::taxonomy::TaxonomyError;

/// Failures while assembling a [`super::Pipeline`].
///
/// A built pipeline never fails a run; these only surface at startup.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no categorization provider configured")]
    MissingProvider,

    #[error("taxonomy tables invalid: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
