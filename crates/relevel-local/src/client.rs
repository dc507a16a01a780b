//! OpenAI-compatible rewrite client.
//!
//! One POST per rewrite, constructed deterministically from the text and the
//! target level. No retries: rate limits and transient failures surface to
//! the caller, who decides whether to try again.

use relevel_core::{CefrLevel, Error, Result, RewriteBackend};
use serde::{Deserialize, Serialize};

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Ceiling on the requested response size, in tokens.
const MAX_OUTPUT_TOKENS: u64 = 4096;
/// Fixed creativity parameter; rewriting wants some variation but not much.
const TEMPERATURE: f64 = 0.7;

/// Per-level phrasing guidance baked into the system prompt.
fn level_guideline(level: CefrLevel) -> &'static str {
    match level {
        CefrLevel::A1 => {
            "Use very short sentences. Use only the most common everyday words. Avoid idioms and subordinate clauses entirely."
        }
        CefrLevel::A2 => {
            "Use short, simple sentences and high-frequency vocabulary. Explain any necessary uncommon word in plain terms."
        }
        CefrLevel::B1 => {
            "Use clear sentences of moderate length. Everyday vocabulary is fine; avoid rare idioms and dense phrasing."
        }
        CefrLevel::B2 => {
            "Use natural sentences with some complexity. A broad vocabulary is fine; keep the argument easy to follow."
        }
        CefrLevel::C1 => {
            "Use fluent, varied sentence structures and a wide vocabulary, including idiomatic expressions where natural."
        }
        CefrLevel::C2 => {
            "Use sophisticated, precise language with full stylistic range, as written for an educated native reader."
        }
    }
}

fn system_prompt(level: CefrLevel) -> String {
    format!(
        "You rewrite text at CEFR level {level}. {guideline} \
         Reply with the rewritten text only, keeping the original paragraph breaks \
         (paragraphs separated by blank lines). No commentary, no preamble.",
        level = level.code(),
        guideline = level_guideline(level),
    )
}

fn user_prompt(text: &str, level: CefrLevel) -> String {
    format!(
        "Rewrite the following text at CEFR level {level}:\n\n{text}",
        level = level.code(),
    )
}

/// Response-size bound proportional to input length, capped at a ceiling.
fn max_output_tokens(text: &str) -> u64 {
    (text.chars().count() as u64 / 3 + 256).min(MAX_OUTPUT_TOKENS)
}

#[derive(Debug, Clone)]
pub struct LevelRewriteClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout_ms: u64,
}

impl LevelRewriteClient {
    /// Build from overrides, falling back to `RELEVEL_API_BASE_URL` /
    /// `RELEVEL_MODEL`, then to fixed defaults. The API key is deliberately
    /// not part of the client: it is caller-supplied per call.
    pub fn from_env(
        client: reqwest::Client,
        base_url_override: Option<String>,
        model_override: Option<String>,
    ) -> Self {
        let base_url = base_url_override
            .or_else(|| env("RELEVEL_API_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = model_override
            .or_else(|| env("RELEVEL_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            client,
            base_url,
            model,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_chat_completions(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }

    pub async fn rewrite_text(
        &self,
        text: &str,
        level: CefrLevel,
        api_key: &str,
    ) -> Result<String> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::MissingCredential);
        }
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("empty rewrite payload".to_string()));
        }

        let req = ChatCompletionsRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt(level),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt(text, level),
                },
            ],
            max_tokens: max_output_tokens(text),
            temperature: TEMPERATURE,
        };

        tracing::debug!(
            model = %self.model,
            level = %level,
            input_chars = text.chars().count(),
            max_tokens = req.max_tokens,
            "sending rewrite request"
        );

        let resp = self
            .client
            .post(self.endpoint_chat_completions())
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {api_key}"),
            )
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::Remote(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = service_error_message(&body);
            return Err(match status.as_u16() {
                401 => Error::Unauthorized(
                    message.unwrap_or_else(|| "credential rejected by service".to_string()),
                ),
                429 => Error::RateLimited,
                _ => Error::Remote(message.unwrap_or_else(|| "Unknown error".to_string())),
            });
        }

        let parsed: ChatCompletionsResponse =
            resp.json().await.map_err(|e| Error::Remote(e.to_string()))?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(Error::EmptyResult);
        }
        Ok(content)
    }
}

/// Best-effort `error.message` out of a service error body.
fn service_error_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait::async_trait]
impl RewriteBackend for LevelRewriteClient {
    async fn rewrite(&self, text: &str, level: CefrLevel, api_key: &str) -> Result<String> {
        self.rewrite_text(text, level, api_key).await
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u64,
    temperature: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_token_bound_is_proportional_then_capped() {
        assert_eq!(max_output_tokens(""), 256);
        assert_eq!(max_output_tokens(&"x".repeat(300)), 356);
        assert_eq!(max_output_tokens(&"x".repeat(100_000)), MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn prompts_embed_level_and_text() {
        let sys = system_prompt(CefrLevel::A2);
        assert!(sys.contains("CEFR level A2"), "system prompt: {sys}");
        assert!(sys.contains("No commentary"), "system prompt: {sys}");
        let user = user_prompt("Some source text.", CefrLevel::A2);
        assert!(user.contains("A2") && user.ends_with("Some source text."));
    }

    #[test]
    fn every_level_has_a_distinct_guideline() {
        let mut seen = std::collections::BTreeSet::new();
        for level in CefrLevel::ALL {
            assert!(seen.insert(level_guideline(level)), "duplicate for {level}");
        }
    }

    #[test]
    fn service_error_message_reads_the_error_body() {
        assert_eq!(
            service_error_message(r#"{"error":{"message":"Incorrect API key provided"}}"#),
            Some("Incorrect API key provided".to_string())
        );
        assert_eq!(service_error_message("not json"), None);
        assert_eq!(service_error_message(r#"{"error":{}}"#), None);
    }
}
