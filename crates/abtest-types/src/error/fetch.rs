//! Remote fetch errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a `Fetcher` reports back to the sync engine.
///
/// The engine treats every variant the same way (backoff + logging); the
/// variants only exist so diagnostics say what actually went wrong.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum FetchError {
    /// Connection, timeout, or other transport failure
    #[error("transport error: {message}")]
    Transport {
        /// Transport-level description
        message: String,
    },

    /// Server answered with a non-success HTTP status
    #[error("server returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Envelope decoded but `ret != 1` or `data` was missing
    #[error("unexpected response (ret={ret}): {msg}")]
    UnexpectedResponse {
        /// `ret` field of the envelope
        ret: i64,
        /// `msg` field of the envelope
        msg: String,
    },

    /// Body could not be decoded
    #[error("decode error: {message}")]
    Decode {
        /// Decoder description
        message: String,
    },
}

impl FetchError {
    /// Create a decode error from a serde_json error.
    pub fn from_json_error(e: &serde_json::Error) -> Self {
        Self::Decode { message: e.to_string() }
    }
}
