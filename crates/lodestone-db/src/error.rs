//! Storage-layer error taxonomy.

use lodestone_types::error::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("unique-key conflict on {0}, treated as a no-op")]
    UniquenessConflict(&'static str),

    #[error("row not found")]
    NotFound,

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl Categorized for DbError {
    fn category(&self) -> ErrorCategory {
        match self {
            DbError::UniquenessConflict(_) => ErrorCategory::UniquenessConflict,
            DbError::NotFound => ErrorCategory::Internal,
            DbError::Sqlx(_) | DbError::Migrate(_) | DbError::InvariantViolation(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
