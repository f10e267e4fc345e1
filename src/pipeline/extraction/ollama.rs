use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;

use super::capability::{ExtractionCapability, ExtractionDirective, ProposalSender};
use super::ollama_types::{
    ChatMessage, ChatRequest, ChatResponse, ChatResponseMessage, GenerationOptions, ToolSpec,
};
use super::pdf::{read_pdf_pages, PdfPage};
use super::prompt::{build_pdf_user_prompt, IMAGE_USER_PROMPT};
use super::CapabilityError;
use crate::models::{SourceDocument, SourceKind};

/// Async HTTP client for a local Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, CapabilityError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CapabilityError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One non-streaming `/api/chat` round trip.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponseMessage, CapabilityError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::ResponseParsing(e.to_string()))?;

        Ok(parsed.message)
    }

    fn map_send_error(&self, e: reqwest::Error) -> CapabilityError {
        if e.is_connect() {
            CapabilityError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            CapabilityError::Timeout(self.timeout)
        } else {
            CapabilityError::HttpClient(e.to_string())
        }
    }
}

/// Extraction capability backed by an Ollama tool-calling model.
pub struct OllamaCapability {
    client: OllamaClient,
    model: String,
}

impl OllamaCapability {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

}

#[async_trait]
impl ExtractionCapability for OllamaCapability {
    async fn propose(
        &self,
        document: &SourceDocument,
        directive: &ExtractionDirective,
        proposals: ProposalSender,
    ) -> Result<(), CapabilityError> {
        let user_message = document_message(document).await?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(&directive.system_prompt), user_message],
            tools: vec![ToolSpec::function(&directive.tool)],
            stream: false,
            options: Some(GenerationOptions::deterministic()),
        };

        tracing::debug!(model = %self.model, "Requesting PII tool calls");
        let reply = self.client.chat(&request).await?;

        for arguments in tool_arguments(reply, directive)? {
            proposals.submit(arguments).await?;
        }
        Ok(())
    }
}

/// The user turn carrying the document.
async fn document_message(document: &SourceDocument) -> Result<ChatMessage, CapabilityError> {
    let encode = |bytes: &[u8]| base64::engine::general_purpose::STANDARD.encode(bytes);

    match document.kind() {
        SourceKind::Image => {
            Ok(ChatMessage::user(IMAGE_USER_PROMPT).with_images(vec![encode(document.bytes())]))
        }
        SourceKind::Pdf => {
            let bytes = document.bytes().to_vec();
            let pages = tokio::task::spawn_blocking(move || read_pdf_pages(&bytes))
                .await
                .map_err(|e| CapabilityError::Document(format!("PDF reader task failed: {e}")))??;
            pdf_message(&pages, encode)
        }
    }
}

fn pdf_message(
    pages: &[PdfPage],
    encode: impl Fn(&[u8]) -> String,
) -> Result<ChatMessage, CapabilityError> {
    let texts: Vec<(u32, String)> = pages
        .iter()
        .filter(|p| p.has_text())
        .map(|p| (p.number, p.text.clone()))
        .collect();
    let scans: Vec<(u32, &[u8])> = pages
        .iter()
        .filter_map(|p| p.scan.as_deref().map(|scan| (p.number, scan)))
        .collect();

    if texts.is_empty() && scans.is_empty() {
        return Err(CapabilityError::Document(
            "PDF has neither a text layer nor a readable page scan".into(),
        ));
    }

    let scan_pages: Vec<u32> = scans.iter().map(|(n, _)| *n).collect();
    let images = scans.iter().map(|&(_, bytes)| encode(bytes)).collect();
    Ok(ChatMessage::user(build_pdf_user_prompt(&texts, &scan_pages)).with_images(images))
}

/// Arguments of every call to the directive's tool, in reply order.
///
/// Calls to other functions are ignored. A reply without a single matching
/// call breaks the contract.
pub fn tool_arguments(
    reply: ChatResponseMessage,
    directive: &ExtractionDirective,
) -> Result<Vec<serde_json::Value>, CapabilityError> {
    let mut arguments = Vec::new();
    for call in reply.tool_calls {
        if call.function.name != directive.tool.name {
            tracing::warn!(tool = %call.function.name, "Ignoring call to unknown tool");
            continue;
        }
        arguments.push(call.function.arguments);
    }

    if arguments.is_empty() {
        return Err(CapabilityError::ContractViolation(format!(
            "reply contained no '{}' tool call",
            directive.tool.name
        )));
    }
    Ok(arguments)
}
