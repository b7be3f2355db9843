use thiserror::Error;

use crate::models::hydraulic::hpg::core::CurveError;

/// Errors raised while reading or writing a performance graph file.
///
/// Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error")]
    Io(#[from] std::io::Error),

    #[error("missing `HPG` header line")]
    MissingHeader,

    #[error("line {line}: invalid header entry `{entry}`")]
    InvalidHeader { line: usize, entry: String },

    #[error("line {line}: malformed row")]
    InvalidRow { line: usize },

    #[error("line {line}: invalid curve block")]
    InvalidBlock { line: usize },

    #[error("node id `{id}` cannot be stored: it is empty or contains whitespace")]
    InvalidNodeId { id: String },

    #[error("curves are not strictly increasing in flow magnitude")]
    NonMonotonicFlow(#[from] CurveError),
}
