use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum FilterError {
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing source id")]
    MissingSource,
    #[error("missing filter method")]
    MissingMethod,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
