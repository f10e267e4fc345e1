use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

use super::capability::{ExtractionCapability, ExtractionDirective, ProposalSender};
use super::{CapabilityError, ExtractionError};
use crate::config::DEFAULT_EXTRACTION_TIMEOUT_SECS;
use crate::models::{ExtractionResult, PiiCandidate, SourceDocument};
use crate::pipeline::filter::CandidateFilter;
use crate::pipeline::validation::ValidationRules;

/// Proposals buffered between the capability and the filter. Small on
/// purpose: the capability waits while the filter catches up.
const PROPOSAL_BUFFER: usize = 16;

/// Runs one capability over one document and keeps the valid findings.
///
/// Holds no per-run state, so a single extractor can serve concurrent runs.
pub struct PiiExtractor {
    capability: Arc<dyn ExtractionCapability>,
    rules: Arc<ValidationRules>,
    directive: ExtractionDirective,
    timeout: Duration,
    deduplicate: bool,
}

impl PiiExtractor {
    pub fn new(capability: Arc<dyn ExtractionCapability>, rules: Arc<ValidationRules>) -> Self {
        Self {
            capability,
            rules,
            directive: ExtractionDirective::standard(),
            timeout: Duration::from_secs(DEFAULT_EXTRACTION_TIMEOUT_SECS),
            deduplicate: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_deduplication(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// Classify `bytes` by `media_type` and extract PII from it.
    ///
    /// Anything other than an image or a PDF is rejected before the
    /// capability is touched.
    pub async fn extract_pii(
        &self,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        self.extract_named(bytes, media_type, None).await
    }

    /// [`extract_pii`](Self::extract_pii) for an upload that carries a file
    /// name. The name only labels the run in logs.
    pub async fn extract_named(
        &self,
        bytes: Vec<u8>,
        media_type: &str,
        file_name: Option<&str>,
    ) -> Result<ExtractionResult, ExtractionError> {
        let Some(mut document) = SourceDocument::classify(bytes, media_type) else {
            tracing::warn!(media_type, file_name, "Rejected unsupported media type");
            return Err(ExtractionError::UnsupportedMediaType(media_type.to_string()));
        };
        if let Some(name) = file_name {
            document = document.with_name(name);
        }
        self.extract(&document).await
    }

    /// Extract PII from an already classified document.
    ///
    /// Either every proposal was seen and the filtered result is returned, or
    /// the run failed and nothing is returned. Partial results never escape.
    pub async fn extract(&self, document: &SourceDocument) -> Result<ExtractionResult, ExtractionError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "extract_pii",
            run_id = %run_id,
            media_type = %document.media_type(),
            file_name = document.name(),
        );

        async move {
            let started = Instant::now();
            tracing::info!(kind = document.kind().as_str(), bytes = document.bytes().len(), "PII extraction started");

            let outcome = match tokio::time::timeout(self.timeout, self.run(document)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ExtractionError::CapabilityTransport(CapabilityError::Timeout(self.timeout))),
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                Ok(result) => tracing::info!(records = result.len(), elapsed_ms, "PII extraction completed"),
                Err(e) => tracing::warn!(error = %e, elapsed_ms, "PII extraction failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, document: &SourceDocument) -> Result<ExtractionResult, ExtractionError> {
        let (tx, mut rx) = mpsc::channel(PROPOSAL_BUFFER);
        let mut filter = if self.deduplicate {
            CandidateFilter::deduplicating(&self.rules)
        } else {
            CandidateFilter::new(&self.rules)
        };

        let mut capability = self
            .capability
            .propose(document, &self.directive, ProposalSender::new(tx));
        let mut finished = false;

        // Proposals are drained before the capability's completion is looked
        // at, so every proposal sent before a fault is still seen (and then
        // discarded along with the run).
        loop {
            tokio::select! {
                biased;

                proposal = rx.recv() => match proposal {
                    Some(arguments) => {
                        let candidate = PiiCandidate::from_tool_arguments(&arguments)?;
                        filter.accept(candidate);
                    }
                    None => break,
                },

                outcome = &mut capability, if !finished => {
                    outcome?;
                    finished = true;
                    // Keep what is buffered, refuse anything later.
                    rx.close();
                }
            }
        }

        // The sender can be dropped before the capability returns.
        if !finished {
            capability.await?;
        }

        let stats = filter.stats();
        tracing::debug!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            duplicates = stats.duplicates,
            "Candidate filter finished"
        );
        Ok(filter.finish())
    }
}
