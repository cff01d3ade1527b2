//! Error types for board operations.

use thiserror::Error;

/// Result type alias for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;

/// Main error type for board operations.
#[derive(Error, Debug)]
pub enum BoardError {
    /// The session cannot authenticate the requested operation
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The remote board has no article with this id
    #[error("Article {id} not found")]
    NotFound { id: u64 },

    /// Network failure or non-success status from the session
    #[error("Transport error fetching {url}: {message}")]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// An expected element, attribute or token is missing from a page
    #[error("Malformed page: {0}")]
    MalformedPage(String),

    /// A URL could not be parsed or does not identify an article
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl BoardError {
    /// Creates a new authentication error.
    pub fn authentication<T: ToString>(msg: T) -> Self {
        Self::Authentication(msg.to_string())
    }

    /// Creates a new malformed-page error.
    pub fn malformed<T: ToString>(msg: T) -> Self {
        Self::MalformedPage(msg.to_string())
    }

    /// Creates a transport error for `url`.
    pub fn transport<T: ToString>(url: &str, status: Option<u16>, msg: T) -> Self {
        Self::Transport {
            url: url.to_string(),
            status,
            message: msg.to_string(),
        }
    }

    /// HTTP status carried by a transport error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<url::ParseError> for BoardError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
