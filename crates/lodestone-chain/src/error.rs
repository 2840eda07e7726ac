//! Chain-layer error taxonomy (spec §4.A "Failure semantics").

use lodestone_types::error::{Categorized, ErrorCategory};
use std::ops::Range;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    /// A block-range slice failed its final retry attempt. The caller
    /// (an indexer) may resume at `range.start`.
    #[error("rpc call failed for range {range:?}: {cause}")]
    Rpc { range: Range<u64>, cause: String },

    #[error("timestamp->block binary search exhausted retries, falling back to estimate: {0}")]
    TimestampSearchDegraded(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("feature not available on this chain: {0:?}")]
    FeatureUnavailable(lodestone_types::feature::ChainFeature),
}

impl Categorized for ChainError {
    fn category(&self) -> ErrorCategory {
        match self {
            ChainError::Rpc { .. } => ErrorCategory::TransientRpc,
            ChainError::TimestampSearchDegraded(_) => ErrorCategory::TransientRpc,
            ChainError::Decode(_) => ErrorCategory::DecodeSchema,
            ChainError::FeatureUnavailable(_) => ErrorCategory::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
