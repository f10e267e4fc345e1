use async_trait::async_trait;

use super::ConversationalCapability;
use crate::models::ChatTurn;
use crate::pipeline::extraction::ollama_types::{ChatMessage, ChatRequest};
use crate::pipeline::extraction::{CapabilityError, OllamaClient};

pub const COMPLIANCE_SYSTEM_PROMPT: &str = r#"
You are a friendly compliance assistant. You help people understand data
protection and compliance topics (GDPR, HIPAA, PCI DSS and similar
frameworks) in plain language, with practical examples.

GUIDELINES:
1. Keep a natural, conversational tone. Greet the user at the start of a
   new conversation.
2. Explain concepts simply and suggest concrete next steps when asked.
3. Earlier turns may contain the results of scanning an uploaded file, in
   the form "File: {FILE_NAME}; Found PII: {DETAILS}", where DETAILS is a
   semicolon-separated list of "{TYPE}, {VALUE}, Page {PAGE}". When the user
   asks what PII a file contained, answer from those results.
4. You do not give legal advice. Point to a qualified professional for
   decisions with legal consequences.
5. End with an invitation for follow-up questions.
"#;

/// Chat capability backed by an Ollama model.
pub struct OllamaConversation {
    client: OllamaClient,
    model: String,
}

impl OllamaConversation {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

/// System prompt, then the prior turns in order, then the new user message.
pub fn build_chat_request(model: &str, prior_turns: &[ChatTurn], new_text: &str) -> ChatRequest {
    let mut messages = Vec::with_capacity(prior_turns.len() + 2);
    messages.push(ChatMessage::system(COMPLIANCE_SYSTEM_PROMPT));
    messages.extend(prior_turns.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(new_text));

    ChatRequest {
        model: model.to_string(),
        messages,
        tools: Vec::new(),
        stream: false,
        options: None,
    }
}

#[async_trait]
impl ConversationalCapability for OllamaConversation {
    async fn reply(&self, prior_turns: &[ChatTurn], new_text: &str) -> Result<String, CapabilityError> {
        let request = build_chat_request(&self.model, prior_turns, new_text);
        let reply = self.client.chat(&request).await?;
        Ok(reply.content)
    }
}
