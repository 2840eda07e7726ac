//! Indexer error taxonomy: wraps chain and storage errors, adds decode
//! failures local to this crate (spec §7 taxonomy items 1-3).

use lodestone_types::error::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error(transparent)]
    Chain(#[from] lodestone_chain::error::ChainError),

    #[error(transparent)]
    Db(#[from] lodestone_db::DbError),

    #[error("malformed event in tx {tx_hash}: {reason}")]
    Decode { tx_hash: String, reason: String },

    /// An off-chain companion read failed (game API, HTTP snapshot feed).
    #[error("external read failed: {0}")]
    External(String),
}

impl Categorized for IndexerError {
    fn category(&self) -> ErrorCategory {
        match self {
            IndexerError::Chain(e) => e.category(),
            IndexerError::Db(e) => e.category(),
            IndexerError::Decode { .. } => ErrorCategory::DecodeSchema,
            IndexerError::External(_) => ErrorCategory::TransientRpc,
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
