//! Error types for the RFP manager

use thiserror::Error;
use uuid::Uuid;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, RfpError>;

/// RFP manager errors
#[derive(Debug, Error)]
pub enum RfpError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("RFP in status {status} cannot be compared; send it to vendors first")]
    NotComparable { status: String },

    #[error("Need at least 1 parsed proposal for comparison ({available} available, {parsed} parsed)")]
    NoParsedProposals { available: usize, parsed: usize },

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Recommendation policy error: {0}")]
    Policy(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RfpError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn vendor_not_found(id: Uuid) -> Self {
        Self::not_found("vendor", id)
    }

    pub fn rfp_not_found(id: Uuid) -> Self {
        Self::not_found("rfp", id)
    }

    pub fn proposal_not_found(id: Uuid) -> Self {
        Self::not_found("proposal", id)
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Whether the caller sent something unusable, as opposed to a backend fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidInput(_)
                | Self::Conflict(_)
                | Self::InvalidTransition { .. }
                | Self::NotComparable { .. }
                | Self::NoParsedProposals { .. }
        )
    }
}
