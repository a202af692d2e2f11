//! Error types for tabcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tabcalc-core
#[derive(Debug, Error)]
pub enum Error {
    /// Cell id text is not `table:row:column`
    #[error("Invalid cell id: {0}")]
    InvalidCellId(String),
}
