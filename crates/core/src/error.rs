use thiserror::Error;

pub type EngineResult<T> = Result<T, AttributionError>;

#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("Malformed purchase timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Incomplete sale data, missing: {}", missing.join(", "))]
    IncompleteSaleData { missing: Vec<String> },

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AttributionError {
    /// True for faults caused by the submitted message rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedTimestamp(_) | Self::IncompleteSaleData { .. }
        )
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedTimestamp(_) => "malformed_timestamp",
            Self::IncompleteSaleData { .. } => "incomplete_sale_data",
            Self::CollaboratorUnavailable(_) => "collaborator_unavailable",
            Self::Config(_) => "config_error",
            Self::Serialization(_) | Self::Internal(_) => "internal_error",
        }
    }
}
