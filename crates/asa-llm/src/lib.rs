//! Claude API integration for the session analyzer.
//!
//! Classifies user prompts into semantic categories. The analyzer core
//! treats this as a black-box mapping from prompt text to labels: every
//! failure mode here degrades to [`Classification::unclassified`] rather
//! than aborting the run.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use asa_core::semantic::{Classification, ExtractedPrompt, PromptCategory};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const CLASSIFY_MAX_TOKENS: u32 = 2048;
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Prompts classified per LLM request.
pub const CLASSIFY_BATCH_SIZE: usize = 20;

/// Character budget per prompt entry (message plus context combined).
const MAX_PROMPT_CHARS: usize = 3000;

/// Maximum categories accepted per prompt.
const MAX_CATEGORIES: usize = 3;

/// LLM client errors.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provided API key was invalid.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Claude API client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
pub struct Client {
    http: reqwest::Client,
    api_key: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(LlmError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(LlmError::ClientBuild)?;

        Ok(Self { http, api_key })
    }

    /// Classify prompts in batches.
    ///
    /// Always returns one [`Classification`] per input prompt, in input
    /// order. Batches that fail (request, API, or parse errors) degrade to
    /// unclassified entries; they never abort the run.
    pub async fn classify_prompts(
        &self,
        model: &str,
        prompts: &[ExtractedPrompt],
    ) -> Vec<Classification> {
        let mut results = Vec::with_capacity(prompts.len());

        for batch in prompts.chunks(CLASSIFY_BATCH_SIZE) {
            match self.classify_batch(model, batch).await {
                Ok(batch_results) => results.extend(batch_results),
                Err(err) => {
                    tracing::warn!(
                        batch_size = batch.len(),
                        error = %err,
                        "classification batch failed; marking prompts unclassified"
                    );
                    results.extend(std::iter::repeat_n(
                        Classification::unclassified(),
                        batch.len(),
                    ));
                }
            }
        }

        results
    }

    async fn classify_batch(
        &self,
        model: &str,
        batch: &[ExtractedPrompt],
    ) -> Result<Vec<Classification>, LlmError> {
        let request = MessageRequest {
            model: model.to_string(),
            max_tokens: CLASSIFY_MAX_TOKENS,
            temperature: CLASSIFY_TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: build_classification_prompt(batch),
            }],
        };

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_api_error(&body).unwrap_or_else(|| LlmError::Api {
                message: format!("status {status}: {body}"),
            }));
        }

        let payload: MessageResponse = serde_json::from_str(&body)
            .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;
        let text = extract_text(payload.content)?;
        parse_assignments(&text, batch.len())
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

fn extract_text(blocks: Vec<ContentBlock>) -> Result<String, LlmError> {
    let mut pieces = Vec::new();
    for block in blocks {
        let ContentBlock::Text { text } = block;
        pieces.push(text);
    }
    if pieces.is_empty() {
        return Err(LlmError::InvalidResponse(
            "missing text content".to_string(),
        ));
    }
    Ok(pieces.join("\n"))
}

fn parse_api_error(body: &str) -> Option<LlmError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| LlmError::Api {
            message: payload.error.message,
        })
}

/// Truncate a prompt entry to [`MAX_PROMPT_CHARS`], prioritizing the user's
/// message (70%) over before/after context (15% each).
fn truncate_entry(prompt: &ExtractedPrompt) -> (String, String, String) {
    let prompt_budget = MAX_PROMPT_CHARS * 70 / 100;
    let context_budget = MAX_PROMPT_CHARS * 15 / 100;

    let text = truncate_chars(&prompt.text, prompt_budget);
    let before = format_context(&prompt.context_before, context_budget);
    let after = format_context(&prompt.context_after, context_budget);
    (text, before, after)
}

fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}...")
}

fn format_context(messages: &[String], budget: usize) -> String {
    if messages.is_empty() {
        return "(none)".to_string();
    }
    let mut remaining = budget;
    let mut rendered = Vec::new();
    for message in messages.iter().take(2) {
        if remaining < 10 {
            break;
        }
        let piece = truncate_chars(message, remaining - 10);
        remaining = remaining.saturating_sub(piece.chars().count() + 4);
        rendered.push(format!("\"{piece}\""));
    }
    if rendered.is_empty() {
        "(none)".to_string()
    } else {
        rendered.join(", ")
    }
}

fn build_category_list() -> String {
    let mut lines = Vec::new();
    for category in PromptCategory::ALL {
        if category == PromptCategory::Other {
            lines.push(format!(
                "- **{category}**: Use when the prompt doesn't fit the categories above. Provide a custom_category name."
            ));
        } else {
            lines.push(format!("- **{category}**: {}", category.description()));
        }
    }
    lines.join("\n")
}

fn build_classification_prompt(batch: &[ExtractedPrompt]) -> String {
    let mut sections = Vec::new();
    sections.push(
        "You are classifying user prompts from AI coding assistant sessions.".to_string(),
    );
    sections.push(String::new());
    sections.push("## Categories (assign 1-3 per prompt)".to_string());
    sections.push(String::new());
    sections.push(build_category_list());
    sections.push(String::new());
    sections.push("## Prompts to Classify".to_string());

    for (idx, prompt) in batch.iter().enumerate() {
        let (text, before, after) = truncate_entry(prompt);
        sections.push(String::new());
        sections.push(format!("### Prompt {}", idx + 1));
        sections.push(format!("Context before: {before}"));
        sections.push(format!("Prompt: \"{text}\""));
        sections.push(format!("Context after: {after}"));
    }

    sections.push(String::new());
    sections.push("## Instructions".to_string());
    sections.push(String::new());
    sections.push(
        "For each prompt, assign 1-3 categories that best describe its intent, \
         considering the conversation context. If none fit, use \"other\" and \
         provide a custom_category name."
            .to_string(),
    );
    sections.push(String::new());
    sections.push(
        "Return ONLY a valid JSON array with one object per prompt, in the \
         same order as listed above. Each object must have: \"index\", \
         \"categories\", \"custom_category\". Example:"
            .to_string(),
    );
    sections.push(
        r#"[{"index": 1, "categories": ["debugging", "question"], "custom_category": null}]"#
            .to_string(),
    );
    sections.join("\n")
}

/// The classifier's per-prompt answer on the wire.
#[derive(Debug, Deserialize)]
struct Assignment {
    /// 1-based position within the batch.
    index: usize,
    categories: Vec<String>,
    #[serde(default)]
    custom_category: Option<String>,
}

/// Models sometimes wrap the array in prose or code fences; cut out the
/// outermost array before parsing.
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

fn parse_assignments(text: &str, batch_len: usize) -> Result<Vec<Classification>, LlmError> {
    let array = extract_json_array(text)
        .ok_or_else(|| LlmError::InvalidResponse("no JSON array in response".to_string()))?;
    let assignments: Vec<Assignment> = serde_json::from_str(array)
        .map_err(|err| LlmError::InvalidResponse(err.to_string()))?;

    let mut results = vec![Classification::unclassified(); batch_len];
    for assignment in assignments {
        let Some(slot) = assignment
            .index
            .checked_sub(1)
            .and_then(|idx| results.get_mut(idx))
        else {
            tracing::warn!(index = assignment.index, "assignment index out of range");
            continue;
        };

        let mut categories: Vec<PromptCategory> = assignment
            .categories
            .iter()
            .map(|name| PromptCategory::parse_lossy(name))
            .collect();
        categories.dedup();
        categories.truncate(MAX_CATEGORIES);

        let custom = assignment
            .custom_category
            .filter(|_| categories.contains(&PromptCategory::Other))
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty());

        *slot = Classification { categories, custom };
    }

    Ok(results)
}
