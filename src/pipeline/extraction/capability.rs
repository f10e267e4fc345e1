//! The seam between the orchestrator and whatever model reads documents.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use super::prompt::{build_extraction_system_prompt, record_pii_tool};
use super::CapabilityError;
use crate::models::SourceDocument;

/// A function the capability is instructed to call once per finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the call arguments.
    pub parameters: serde_json::Value,
}

/// Everything the capability is told about the task.
///
/// Calling `tool` is mandatory: every reply must carry at least one call. A
/// reply with none is a contract violation, never "zero findings".
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionDirective {
    pub system_prompt: String,
    pub tool: ToolDefinition,
}

impl ExtractionDirective {
    /// The PII directive: category list, a per-category hint, the empty-value
    /// convention, and the `record_pii` tool.
    pub fn standard() -> Self {
        Self {
            system_prompt: build_extraction_system_prompt(),
            tool: record_pii_tool(),
        }
    }
}

impl Default for ExtractionDirective {
    fn default() -> Self {
        Self::standard()
    }
}

/// Where a capability hands over the raw arguments of each tool call.
///
/// Arguments are passed through untouched; schema checks happen on the
/// orchestrator side. Not `Clone`: the run ends when the capability returns,
/// and a submit after that fails with [`CapabilityError::ChannelClosed`].
#[derive(Debug)]
pub struct ProposalSender {
    inner: mpsc::Sender<serde_json::Value>,
}

impl ProposalSender {
    pub fn new(inner: mpsc::Sender<serde_json::Value>) -> Self {
        Self { inner }
    }

    /// Fails with [`CapabilityError::ChannelClosed`] once the orchestrator has
    /// stopped listening (for example after a malformed proposal).
    pub async fn submit(&self, arguments: serde_json::Value) -> Result<(), CapabilityError> {
        self.inner
            .send(arguments)
            .await
            .map_err(|_| CapabilityError::ChannelClosed)
    }
}

/// A model that reads a document and proposes PII findings.
///
/// Implementations submit one proposal per finding, in the order they emit
/// them, and return once the document is exhausted. Returning is the
/// terminal signal: proposals must be submitted before `propose` resolves.
/// Returning `Err` after some proposals were submitted fails the whole run.
#[async_trait]
pub trait ExtractionCapability: Send + Sync {
    async fn propose(
        &self,
        document: &SourceDocument,
        directive: &ExtractionDirective,
        proposals: ProposalSender,
    ) -> Result<(), CapabilityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_directive_requires_tool_use() {
        let directive = ExtractionDirective::standard();
        assert_eq!(directive.tool.name, "record_pii");
        assert!(!directive.system_prompt.is_empty());
    }

    #[tokio::test]
    async fn submit_after_receiver_dropped_reports_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = ProposalSender::new(tx);
        let err = sender.submit(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, CapabilityError::ChannelClosed));
    }
}
