//! LLM Collaborator Interface
//!
//! The core depends on a single external operation: hand the model a prompt,
//! get text back. `OpenAiChatClient` implements it for any OpenAI-compatible
//! API (Groq exposes one). Model selection and timeout are fixed at
//! construction and stable across a session.

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "You are an educational assistant that builds personalized learning paths.";

/// Errors from the model invocation boundary. All of them are retryable by
/// re-triggering the stage action; none are recovered automatically.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider request failed: {0}")]
    Provider(String),
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),
}

/// A generic client for invoking the LLM with a single prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends the prompt and returns the raw text of the model's reply.
    async fn invoke(&self, prompt: &str) -> Result<String, LlmError>;
}

/// An implementation of `LlmClient` for any OpenAI-compatible chat API.
pub struct OpenAiChatClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiChatClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL for the provider.
    /// * `model` - Chat model identifier (e.g. "llama-3.1-8b-instant").
    /// * `timeout` - Upper bound on each call; a hang surfaces as
    ///   [`LlmError::Timeout`] instead of blocking the session forever.
    pub fn new(config: OpenAIConfig, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            timeout,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn invoke(&self, prompt: &str) -> Result<String, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(|e| LlmError::Provider(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| LlmError::Provider(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        debug!(model = %self.model, prompt_len = prompt.len(), "invoking chat completion");

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))?
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
