use reqwest::StatusCode;
use thiserror::Error;

use crate::forms::FormError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the bearer token. The local session has already been cleared.
    #[error("session expired or invalid, please log in again")]
    Unauthorized,

    #[error("forbidden: {}", .message.as_deref().unwrap_or("insufficient permissions"))]
    Forbidden { message: Option<String> },

    #[error("not found: {}", .message.as_deref().unwrap_or("resource does not exist"))]
    NotFound { message: Option<String> },

    #[error("server returned {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        status: StatusCode,
        message: Option<String>,
    },

    #[error(transparent)]
    Validation(#[from] FormError),

    #[error("not logged in")]
    NotAuthenticated,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ClientError {
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden { message },
            StatusCode::NOT_FOUND => ClientError::NotFound { message },
            _ => ClientError::Api { status, message },
        }
    }

    /// Message the server attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Forbidden { message }
            | ClientError::NotFound { message }
            | ClientError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ClientError::Forbidden { .. })
    }
}
