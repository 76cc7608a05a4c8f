use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("model error: {0}")]
    Model(#[from] draw_model::ModelError),

    #[error("store error: {0}")]
    Store(#[from] draw_contracts::ContractError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
