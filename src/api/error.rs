use thiserror::Error;

/// Failure of a single backend call. `Display` is what the user sees.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `body` is the response text
    #[error("{body}")]
    Status { status: u16, body: String },

    #[error("invalid response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl ApiError {
    /// Build a status error, falling back to the status line for empty bodies
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body
        };
        ApiError::Status { status, body }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode { .. } => None,
        }
    }
}
