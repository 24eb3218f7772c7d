//! The error taxonomy shared by every engine crate.

use std::path::PathBuf;

/// Errors surfaced by the bit stream, BWT, MTF, Huffman, and Vitter engines.
///
/// Engines never retry and never promise a well-formed partial output after
/// an error; they return as soon as a contract is violated and let the
/// caller (ultimately `jpack`'s CLI boundary) decide how to report it.
#[derive(Debug, thiserror::Error)]
pub enum JpackError {
    /// The bit source yielded fewer bits than a contracted read demanded.
    #[error("truncated input while reading {context}")]
    Truncated { context: &'static str },

    /// Structurally present but semantically invalid data: a block header
    /// with no following content, invalid hex in a header, or a tree
    /// decoder that reached an inconsistent state.
    #[error("malformed input: {reason}")]
    Malformed { reason: String },

    /// The input file named on the command line does not exist.
    #[error("input file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// An underlying I/O failure not otherwise classified above.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The CLI arguments themselves are invalid (wrong mode, wrong arg count).
    #[error("usage error: {message}")]
    UsageError { message: String },
}

impl JpackError {
    pub fn truncated(context: &'static str) -> Self {
        JpackError::Truncated { context }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        JpackError::Malformed {
            reason: reason.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        JpackError::UsageError {
            message: message.into(),
        }
    }
}

pub type JpackResult<T> = Result<T, JpackError>;
