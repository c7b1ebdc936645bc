//! Error types for the HTTP fetcher.

use abtest_types::FetchError;
use thiserror::Error;

/// Errors that can occur while talking to the config server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Failed to build the HTTP client.
    #[error("Connection setup failed: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned a body that is not a config-list envelope.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Server returned a non-2xx status.
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },
}

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ServerError { status, message } => Self::Status { status, message },
            ClientError::InvalidResponse(message) => Self::Decode { message },
            ClientError::Request(e) if e.is_decode() => Self::Decode { message: e.to_string() },
            ClientError::Request(e) => Self::Transport { message: e.to_string() },
            ClientError::Connection(message) => Self::Transport { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_status() {
        let err = ClientError::ServerError { status: 503, message: "busy".into() };
        assert_eq!(FetchError::from(err), FetchError::Status { status: 503, message: "busy".into() });
    }

    #[test]
    fn test_invalid_response_maps_to_decode() {
        let err = ClientError::InvalidResponse("expected value".into());
        assert!(matches!(FetchError::from(err), FetchError::Decode { .. }));
    }
}
