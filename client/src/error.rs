//! Error handling for the harvest client
//!
//! The `Display` text of every variant is what the page shows as the inline
//! error under the action that failed.

use shared::{HarvestAction, HarvestStatus, WeightError};
use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    // Pre-flight errors, raised before any request is sent
    #[error("{0}")]
    Validation(String),

    #[error("Cannot {action} a harvest that is {status}")]
    InvalidTransition {
        status: HarvestStatus,
        action: HarvestAction,
    },

    #[error("No harvest is loaded")]
    NotLoaded,

    // Request errors
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A weight submission failed part way through the sequential loop.
    /// Strains in `recorded` were persisted and are not rolled back.
    #[error("Saving weights for strain {failed_strain} failed: {source}")]
    PartialWeights {
        recorded: Vec<i64>,
        failed_strain: i64,
        #[source]
        source: Box<ClientError>,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::PartialWeights { source, .. } => source.status(),
            _ => None,
        }
    }

    /// True when the error was raised before any request went out
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            ClientError::Validation(_) | ClientError::InvalidTransition { .. } | ClientError::NotLoaded
        )
    }
}

impl From<WeightError> for ClientError {
    fn from(err: WeightError) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Configuration(err.to_string())
    }
}

/// Result type alias for client calls
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_weights_message_and_status() {
        let err = ClientError::PartialWeights {
            recorded: vec![1],
            failed_strain: 2,
            source: Box::new(ClientError::Api {
                status: 422,
                message: "Dry weight exceeds wet weight".to_string(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "Saving weights for strain 2 failed: Dry weight exceeds wet weight"
        );
        assert_eq!(err.status(), Some(422));
        assert!(!err.is_preflight());
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ClientError::InvalidTransition {
            status: HarvestStatus::Curing,
            action: HarvestAction::StartDrying,
        };
        assert_eq!(err.to_string(), "Cannot start_drying a harvest that is curing");
        assert!(err.is_preflight());
    }
}
