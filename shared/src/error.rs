//! Error types for the AI gateway.

use std::fmt;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One of the two concurrent sub-calls made by the combined endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Text,
    Search,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Text => f.write_str("text"),
            Leg::Search => f.write_str("search"),
        }
    }
}

/// Errors that can occur while serving gateway requests.
#[derive(Error, Debug)]
pub enum Error {
    /// Client input was malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider was selected without the settings it needs
    #[error("Configuration error: {0}")]
    Config(String),

    /// An upstream call failed, timed out, or returned an unparseable body
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An upstream failure inside one leg of the combined endpoint
    #[error("{leg} leg failed: {source}")]
    LegFailed {
        leg: Leg,
        #[source]
        source: Box<Error>,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Tag an error with the combined-endpoint leg it came from.
    pub fn in_leg(self, leg: Leg) -> Self {
        Error::LegFailed {
            leg,
            source: Box::new(self),
        }
    }

    /// The failing leg, when this error came out of the combined endpoint.
    pub fn leg(&self) -> Option<Leg> {
        match self {
            Error::LegFailed { leg, .. } => Some(*leg),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Upstream(format!("request timed out: {}", e))
        } else {
            Error::Upstream(e.to_string())
        }
    }
}
