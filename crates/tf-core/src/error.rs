//! Shared error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need it.

use thiserror::Error;

/// The base error type for `tf-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `tf-core`.
pub type CoreResult<T> = Result<T, CoreError>;
