use thiserror::Error;

/// Error surface shared by every trait in this crate. Concrete
/// implementations in `draw-core` map their backend errors (sqlx, redis,
/// reqwest) onto these variants; callers only ever see this enum.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ContractError>;
