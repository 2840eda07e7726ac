use lodestone_types::error::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Db(#[from] lodestone_db::DbError),

    #[error(transparent)]
    Chain(#[from] lodestone_chain::error::ChainError),

    #[error(transparent)]
    Indexer(#[from] lodestone_indexers::IndexerError),

    #[error("pool {0} not found")]
    PoolNotFound(i64),
}

impl Categorized for AnalyticsError {
    fn category(&self) -> ErrorCategory {
        match self {
            AnalyticsError::Db(e) => e.category(),
            AnalyticsError::Chain(e) => e.category(),
            AnalyticsError::Indexer(e) => e.category(),
            AnalyticsError::PoolNotFound(_) => ErrorCategory::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
