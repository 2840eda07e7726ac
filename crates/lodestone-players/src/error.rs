use lodestone_types::error::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum PlayersError {
    #[error(transparent)]
    Db(#[from] lodestone_db::DbError),

    #[error("player {0} not found")]
    PlayerNotFound(i64),
}

impl Categorized for PlayersError {
    fn category(&self) -> ErrorCategory {
        match self {
            PlayersError::Db(e) => e.category(),
            PlayersError::PlayerNotFound(_) => ErrorCategory::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayersError>;
