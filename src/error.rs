//! Client error types

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from talking to the marketplace backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or undecodable body
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The operation needs a bearer token and none is held; nothing was sent
    #[error("Authentication required")]
    AuthRequired,

    /// 401 from the backend
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 415 from the backend
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Any other non-success status
    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading an attachment from disk failed
    #[error("Failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Text shown to the user for a failed operation.
    ///
    /// 401 and 415 get fixed wording; everything else surfaces the server's
    /// message when there is one and `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::AuthRequired => "You must be logged in to do that.".to_string(),
            Self::Unauthorized(_) => "Authentication failed. Please try logging in again.".to_string(),
            Self::UnsupportedMediaType(_) => {
                "Unsupported media type. Please check your file formats.".to_string()
            }
            Self::Forbidden(msg) | Self::NotFound(msg) if !msg.is_empty() => msg.clone(),
            Self::Api {
                message: Some(msg), ..
            } => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    /// True when the caller should be sent back to sign in.
    pub fn needs_sign_in(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::Unauthorized(_))
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_wording_for_401_and_415() {
        let unauthorized = ClientError::Unauthorized("Token has expired!".into());
        assert_eq!(
            unauthorized.user_message("fallback"),
            "Authentication failed. Please try logging in again."
        );
        assert!(unauthorized.needs_sign_in());

        let media = ClientError::UnsupportedMediaType(String::new());
        assert!(media.user_message("fallback").starts_with("Unsupported media type"));
        assert!(!media.needs_sign_in());
    }

    #[test]
    fn server_message_or_fallback() {
        let with_message = ClientError::Api {
            status: StatusCode::BAD_REQUEST,
            message: Some("Either a file or an external URL must be provided".into()),
        };
        assert_eq!(
            with_message.user_message("generic"),
            "Either a file or an external URL must be provided"
        );

        let without = ClientError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(without.user_message("generic"), "generic");
        assert_eq!(ClientError::NotFound(String::new()).user_message("generic"), "generic");
    }
}
