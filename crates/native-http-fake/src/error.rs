//! Fake networking error

use native_http::Token;
use thiserror::Error;

/// Fake networking error
#[derive(Debug, Error)]
pub enum Error {
    /// The token was never handed out
    #[error("Unknown token: {0}")]
    UnknownToken(Token),
    /// The request at this position was never issued
    #[error("No request at index {0}")]
    NoRequest(usize),
}
