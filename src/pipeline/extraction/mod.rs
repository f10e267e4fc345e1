pub mod capability;
pub mod ollama;
pub mod ollama_types;
pub mod orchestrator;
pub mod pdf;
pub mod prompt;

pub use capability::*;
pub use ollama::*;
pub use orchestrator::*;
pub use pdf::*;
pub use prompt::*;

use std::time::Duration;

use thiserror::Error;

use crate::models::CandidateSchemaError;

/// The only ways an extraction run can fail. A candidate that fails
/// validation is not one of them: it is silently dropped.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported media type '{0}': expected an image or a PDF")]
    UnsupportedMediaType(String),

    #[error("Extraction capability failed: {0}")]
    CapabilityTransport(CapabilityError),

    #[error("Malformed candidate from extraction capability: {0}")]
    MalformedCandidateSchema(String),
}

impl From<CapabilityError> for ExtractionError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::ContractViolation(detail) => Self::MalformedCandidateSchema(detail),
            other => Self::CapabilityTransport(other),
        }
    }
}

impl From<CandidateSchemaError> for ExtractionError {
    fn from(err: CandidateSchemaError) -> Self {
        Self::MalformedCandidateSchema(err.to_string())
    }
}

/// Faults raised by an extraction or conversation capability.
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Model provider is not reachable at {0}")]
    Connection(String),

    #[error("Model provider returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Cannot read document: {0}")]
    Document(String),

    #[error("Capability broke its output contract: {0}")]
    ContractViolation(String),

    #[error("Proposal channel closed before the capability finished")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_violation_maps_to_malformed_schema() {
        let err: ExtractionError = CapabilityError::ContractViolation("no tool call".into()).into();
        assert!(matches!(err, ExtractionError::MalformedCandidateSchema(ref d) if d == "no tool call"));
    }

    #[test]
    fn transport_faults_map_to_capability_transport() {
        for fault in [
            CapabilityError::Connection("http://localhost:11434".into()),
            CapabilityError::Provider {
                status: 500,
                body: "boom".into(),
            },
            CapabilityError::Timeout(Duration::from_secs(5)),
            CapabilityError::Document("truncated".into()),
        ] {
            let err: ExtractionError = fault.into();
            assert!(matches!(err, ExtractionError::CapabilityTransport(_)), "{err}");
        }
    }

    #[test]
    fn timeout_message_keeps_sub_second_precision() {
        assert_eq!(
            CapabilityError::Timeout(Duration::from_millis(250)).to_string(),
            "Request timed out after 250ms"
        );
        assert_eq!(
            CapabilityError::Timeout(Duration::from_secs(120)).to_string(),
            "Request timed out after 120s"
        );
    }

    #[test]
    fn schema_error_maps_to_malformed_schema() {
        let err: ExtractionError = CandidateSchemaError::MissingField("value").into();
        assert!(matches!(err, ExtractionError::MalformedCandidateSchema(_)));
    }
}
