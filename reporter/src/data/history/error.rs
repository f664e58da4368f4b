//! History store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History store configuration error: {0}")]
    Config(String),

    #[error("History store connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid history key: {0}")]
    InvalidKey(String),

    #[error("No metric history stored under {key}")]
    NotFound { key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}
