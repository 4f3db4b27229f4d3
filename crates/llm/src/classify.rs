use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dugout_core::{Config, IntentKind};
use serde::Deserialize;
use tracing::{debug, info};

use crate::provider::{LlmError, LlmProvider, Message};

/// Placeholder in the template that gets replaced with the catalog vocabulary.
pub const VOCABULARY_PLACEHOLDER: &str = "<<<vocabulary>>>";

/// Best-effort intent classification for utterances the rule table could
/// not place. Implementations may be slow or fail; callers bound them with a
/// timeout and treat any error as `UNKNOWN`.
#[async_trait]
pub trait IntentFallback: Send + Sync {
    async fn classify(&self, utterance: &str, vocabulary: &str) -> Result<IntentKind, ClassifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("malformed classifier output: {reason}")]
    Malformed { reason: String, raw_response: String },
    #[error("prompt template error: {0}")]
    Template(String),
}

#[derive(Debug, Deserialize)]
struct IntentReply {
    intent: String,
}

/// Fallback classifier that asks a chat model for `{"intent": "..."}`.
pub struct LlmIntentClassifier {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    /// System prompt template loaded at construction time.
    system_prompt_template: String,
}

impl LlmIntentClassifier {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt_template: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            system_prompt_template,
        }
    }

    /// Build from config: loads the template from `LLM_PROMPT_PATH` and
    /// creates the provider selected by `LLM_PROVIDER`.
    pub fn from_config(config: &Config) -> Result<Self, ClassifyError> {
        let template = load_template(&config.llm.prompt_path)?;
        let provider = crate::providers::create_provider(
            &config.llm,
            &config.ollama,
            config.engine.classifier_timeout(),
        )?;
        info!(provider = provider.name(), "LLM intent fallback ready");
        Ok(Self::new(
            provider,
            template,
            config.llm.temperature,
            config.llm.max_tokens,
        ))
    }

    fn messages(&self, utterance: &str, vocabulary: &str) -> Vec<Message> {
        let system_prompt = self
            .system_prompt_template
            .replace(VOCABULARY_PLACEHOLDER, vocabulary);
        let user_prompt = format!(
            "Classify this question:\n\n{}\n\nRespond ONLY with a JSON object like {{\"intent\": \"RANKING\"}}.",
            utterance
        );
        vec![Message::system(system_prompt), Message::user(user_prompt)]
    }
}

#[async_trait]
impl IntentFallback for LlmIntentClassifier {
    async fn classify(&self, utterance: &str, vocabulary: &str) -> Result<IntentKind, ClassifyError> {
        debug!(provider = self.provider.name(), "Classifying with LLM: {}", utterance);

        let response = self
            .provider
            .complete(self.messages(utterance, vocabulary), self.temperature, self.max_tokens)
            .await?;

        debug!("LLM response: {}", response);
        parse_intent(&response)
    }
}

/// Parse a model reply into the closed intent set.
///
/// Accepts a JSON object (optionally fenced) or, failing that, a reply that
/// is nothing but an intent name.
pub fn parse_intent(response: &str) -> Result<IntentKind, ClassifyError> {
    let json_str = extract_json(response);

    let label = match serde_json::from_str::<IntentReply>(json_str) {
        Ok(reply) => reply.intent,
        Err(_) => response
            .trim()
            .trim_matches(|c: char| c == '"' || c == '`' || c == '.')
            .to_string(),
    };

    label.parse::<IntentKind>().map_err(|e| ClassifyError::Malformed {
        reason: e.to_string(),
        raw_response: response.to_string(),
    })
}

/// Load a prompt template from disk, failing eagerly with a clear message.
pub fn load_template(path: &Path) -> Result<String, ClassifyError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ClassifyError::Template(format!(
            "failed to read prompt template at {}: {e}",
            path.display()
        ))
    })?;

    let count = content.matches(VOCABULARY_PLACEHOLDER).count();
    if count != 1 {
        return Err(ClassifyError::Template(format!(
            "prompt template at {} must contain exactly one '{VOCABULARY_PLACEHOLDER}' placeholder, found {count}",
            path.display()
        )));
    }

    Ok(content)
}

/// Extract JSON from an LLM response, handling markdown code blocks.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_tick = &trimmed[start + 3..];
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }

    trimmed
}
