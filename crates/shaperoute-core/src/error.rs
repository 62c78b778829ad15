//! Error handling for the shape route client
//!
//! Provides the error types used at every boundary of the application:
//! - Client errors (route backend and geocoder calls)
//! - Save errors (writing a downloaded track to disk)
//!
//! All error types use `thiserror` for ergonomic error handling. None of them
//! is fatal: the orchestrator logs them, raises a notice, and returns to idle.

use thiserror::Error;

/// Errors from a remote call made by the client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Transport failure: connection refused, DNS, reset, TLS.
    #[error("Network error: {reason}")]
    Network {
        /// Description of the transport failure.
        reason: String,
    },

    /// The response arrived but was not what the client expects.
    #[error("Protocol error: {reason}")]
    Protocol {
        /// What was wrong with the response.
        reason: String,
    },

    /// The geocoder produced no result for the query.
    #[error("No location found for '{query}'")]
    Lookup {
        /// The text that was searched for.
        query: String,
    },
}

impl ClientError {
    /// Create a network error from any displayable cause
    pub fn network(reason: impl std::fmt::Display) -> Self {
        ClientError::Network {
            reason: reason.to_string(),
        }
    }

    /// Create a protocol error from any displayable cause
    pub fn protocol(reason: impl std::fmt::Display) -> Self {
        ClientError::Protocol {
            reason: reason.to_string(),
        }
    }

    /// Create a lookup error for a query with no match
    pub fn lookup(query: impl Into<String>) -> Self {
        ClientError::Lookup {
            query: query.into(),
        }
    }

    /// Check if this is a transport failure
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network { .. })
    }

    /// Check if this is a malformed or rejected response
    pub fn is_protocol(&self) -> bool {
        matches!(self, ClientError::Protocol { .. })
    }
}

/// Errors while persisting a downloaded track file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    /// The user dismissed the save dialog.
    #[error("Save cancelled")]
    Cancelled,

    /// Writing the file failed.
    #[error("Failed to write {path}: {reason}")]
    Write {
        /// Destination path.
        path: String,
        /// The reason the write failed.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::network("connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
        assert!(err.is_network());

        let err = ClientError::protocol("missing field `symbols`");
        assert_eq!(err.to_string(), "Protocol error: missing field `symbols`");
        assert!(err.is_protocol());

        let err = ClientError::lookup("Atlantis");
        assert_eq!(err.to_string(), "No location found for 'Atlantis'");
    }
}
