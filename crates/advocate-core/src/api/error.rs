use thiserror::Error;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request: {0}")]
    EncodingFailed(String),

    #[error("Failed to decode response: {0}")]
    DecodingFailed(String),

    #[error("Client error: {status}")]
    ClientError { status: u16, body: String },

    #[error("Server error: {status}")]
    ServerError { status: u16 },

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unknown network error")]
    Unknown,
}

impl NetworkError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify a non-success status code.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            400..=499 => NetworkError::ClientError {
                status,
                body: Self::truncate_body(body),
            },
            500..=599 => NetworkError::ServerError { status },
            _ => NetworkError::UnexpectedStatus(status),
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            NetworkError::ClientError { .. }
                | NetworkError::InvalidUrl(_)
                | NetworkError::EncodingFailed(_)
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::ClientError { status, .. } | NetworkError::ServerError { status } => {
                Some(*status)
            }
            NetworkError::UnexpectedStatus(status) => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for end users, without technical detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::InvalidUrl(_)
            | NetworkError::InvalidResponse(_)
            | NetworkError::EncodingFailed(_)
            | NetworkError::DecodingFailed(_)
            | NetworkError::UnexpectedStatus(_)
            | NetworkError::Unknown => {
                "Unable to connect to the server. Please check your internet connection and try again."
            }
            NetworkError::ClientError { .. } => {
                "There was a problem with your request. Please try again."
            }
            NetworkError::ServerError { .. } => {
                "The server is temporarily unavailable. Please try again later."
            }
            NetworkError::RequestFailed(_) => {
                "Connection failed. Please check your internet connection."
            }
        }
    }
}
