//! Error types for the Tika client.
//!
//! Every fallible operation in this crate returns [`TikaError`]. The variants
//! follow the failure taxonomy of a client that both supervises a server
//! process and talks to it over HTTP:
//!
//! - `Validation` / `UnsupportedVersion` - configuration problems (bad URL,
//!   missing archive, unknown server version)
//! - `Startup` - the server process could not be spawned or never became
//!   ready; carries the captured stderr of the process
//! - `Request` / `Transport` - a request could not be built, or could not be
//!   delivered (connection refused, DNS, timeouts)
//! - `Client` - the server answered with a non-2xx status; the status code and
//!   response body are preserved in [`ClientError`]
//! - `Decoding` - the server answered with a body of unexpected shape
//!
//! `TikaError::Io` (from `std::io::Error`) always bubbles up unchanged.
//!
//! # Example
//!
//! ```rust
//! use tika::{TikaError, Result};
//!
//! fn check_port(port: u16) -> Result<u16> {
//!     if port == 0 {
//!         return Err(TikaError::validation("port must be non-zero"));
//!     }
//!     Ok(port)
//! }
//!
//! assert!(check_port(0).is_err());
//! ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `TikaError`.
pub type Result<T> = std::result::Result<T, TikaError>;

/// Maximum number of characters of a response body shown in error messages.
const BODY_SNIPPET_CHARS: usize = 512;

/// Error returned when the server responds with a status outside `200..=299`.
///
/// The full body is kept in `body`; only the display form is shortened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response code {status_code}{}", body_suffix(.body))]
pub struct ClientError {
    /// HTTP status code returned by the server.
    pub status_code: u16,
    /// Response body, read even though the request failed.
    pub body: String,
}

impl ClientError {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}

fn body_suffix(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((cut, _)) => format!(": {}...", &trimmed[..cut]),
        None => format!(": {}", trimmed),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\nserver stderr:\n{}", trimmed)
    }
}

/// Main error type for all Tika client operations.
#[derive(Debug, Error)]
pub enum TikaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported Tika version: {0}")]
    UnsupportedVersion(String),

    #[error("Startup error: {message}{}", stderr_suffix(.stderr))]
    Startup {
        message: String,
        stderr: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Request error: {message}")]
    Request {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Decoding error: {message}")]
    Decoding {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    Checksum {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

impl From<serde_json::Error> for TikaError {
    fn from(err: serde_json::Error) -> Self {
        TikaError::Decoding {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for TikaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TikaError::Request {
                message: err.to_string(),
                source: Some(Box::new(err)),
            }
        } else if err.is_decode() {
            TikaError::Decoding {
                message: err.to_string(),
                source: Some(Box::new(err)),
            }
        } else {
            TikaError::Transport {
                message: err.to_string(),
                source: Some(Box::new(err)),
            }
        }
    }
}

/// Generates `name(message)` and `name_with_source(message, source)` for a
/// `{ message, source }` variant.
macro_rules! message_variant_ctors {
    ($ctor:ident => $variant:ident) => {
        pastey::paste! {
            #[doc = "`TikaError::" $variant "` with only a message."]
            pub fn $ctor(message: impl Into<String>) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "`TikaError::" $variant "` wrapping the error that caused it."]
            pub fn [<$ctor _with_source>](
                message: impl Into<String>,
                source: impl std::error::Error + Send + Sync + 'static,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl TikaError {
    message_variant_ctors!(validation => Validation);
    message_variant_ctors!(request => Request);
    message_variant_ctors!(transport => Transport);
    message_variant_ctors!(decoding => Decoding);

    /// Create a Startup error carrying the server's captured stderr.
    pub fn startup<S: Into<String>>(message: S, stderr: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
            stderr: stderr.into(),
            source: None,
        }
    }

    /// Status code of a non-2xx response, if this error is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TikaError::Client(err) => Some(err.status_code),
            _ => None,
        }
    }

    /// The [`ClientError`] behind this error, if the server answered non-2xx.
    pub fn as_client_error(&self) -> Option<&ClientError> {
        match self {
            TikaError::Client(err) => Some(err),
            _ => None,
        }
    }
}
