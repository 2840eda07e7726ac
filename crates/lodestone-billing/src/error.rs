//! Billing error taxonomy (spec §7 items 5-6: deposit mismatch, internal
//! crediting failure).

use lodestone_types::error::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error(transparent)]
    Db(#[from] lodestone_db::DbError),

    #[error("transfer does not match any outstanding deposit request: {0}")]
    NoMatch(String),
}

impl Categorized for BillingError {
    fn category(&self) -> ErrorCategory {
        match self {
            BillingError::Db(e) => e.category(),
            BillingError::NoMatch(_) => ErrorCategory::DepositMismatch,
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
