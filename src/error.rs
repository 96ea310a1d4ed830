use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinderError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid collection config: {0}")]
    Config(#[from] serde_json::Error),

    /// Note-type or field bookkeeping disagrees with the stored rows.
    #[error("Schema inconsistency: {0}")]
    Schema(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type FinderResult<T> = Result<T, FinderError>;
