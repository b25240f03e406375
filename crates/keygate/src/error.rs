//! error types for keygate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // === parameter errors ===
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("secret is not below the field modulus")]
    SecretOutOfRange,

    // === reconstruction errors ===
    #[error("insufficient shares: have {have}, need {need}")]
    InsufficientShares { have: usize, need: usize },

    #[error("duplicate share index: {0}")]
    DuplicateIndex(u32),

    #[error("invalid share format")]
    InvalidShareFormat,

    // === quorum errors ===
    #[error("voter not in authority allowlist: {0}")]
    UnauthorizedVoter(String),

    #[error("request closed for voting: {0}")]
    RequestClosed(String),

    #[error("storage error: {0}")]
    Storage(String),

    // === configuration ===
    #[error("config error: {0}")]
    Config(String),
}
