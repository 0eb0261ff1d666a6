/// LLM client: the single point of entry for all chat-completion calls.
///
/// No other module may call the Anthropic or OpenAI APIs directly.
/// Vendor and model are chosen once at startup from configuration.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const OPENAI_API_URL: &str = "https://api.openai.com";

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::OpenAi => "openai",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            LlmProvider::OpenAi => DEFAULT_OPENAI_MODEL,
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Anthropic => ANTHROPIC_API_URL,
            LlmProvider::OpenAi => OPENAI_API_URL,
        }
    }
}

// ── Anthropic wire types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ── OpenAI wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Both vendors wrap errors as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Vendor-neutral completion result.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// The single LLM client used by scoring and generation.
/// Wraps one vendor's chat API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: LlmProvider,
    api_key: String,
    model: String,
    base_url: String,
    backoff: Duration,
}

impl LlmClient {
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
            provider,
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            base_url: provider.default_base_url().to_string(),
            backoff: Duration::from_secs(1),
        })
    }

    /// Picks a vendor from configuration. `LLM_PROVIDER=template` (or no keys
    /// at all) disables LLM calls; generation then uses static templates.
    pub fn from_config(config: &Config) -> Result<Option<Self>, LlmError> {
        let anthropic = config.anthropic_api_key.clone();
        let openai = config.openai_api_key.clone();
        let model = config.llm_model.clone();

        let choice = match config.llm_provider.as_deref() {
            Some("template") | Some("none") => None,
            Some("anthropic") => match anthropic {
                Some(key) => Some((LlmProvider::Anthropic, key)),
                None => {
                    warn!("LLM_PROVIDER=anthropic but ANTHROPIC_API_KEY is not set");
                    None
                }
            },
            Some("openai") => match openai {
                Some(key) => Some((LlmProvider::OpenAi, key)),
                None => {
                    warn!("LLM_PROVIDER=openai but OPENAI_API_KEY is not set");
                    None
                }
            },
            other => {
                if let Some(unknown) = other {
                    warn!("Unknown LLM_PROVIDER '{unknown}', picking a vendor from available keys");
                }
                anthropic
                    .map(|key| (LlmProvider::Anthropic, key))
                    .or_else(|| openai.map(|key| (LlmProvider::OpenAi, key)))
            }
        };

        match choice {
            Some((provider, key)) => {
                let client = Self::new(provider, key, model)?;
                info!("LLM client initialized ({})", client.label());
                Ok(Some(client))
            }
            None => {
                info!("No LLM configured; generation will use static templates");
                Ok(None)
            }
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Base delay for exponential backoff between retries.
    #[cfg(test)]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// `"<provider>:<model>"`, recorded on generated kits.
    pub fn label(&self) -> String {
        format!("{}:{}", self.provider.as_str(), self.model)
    }

    /// Makes a raw completion call.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1x, 2x
                let delay = self.backoff * (1 << (attempt - 1));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.send(prompt, system).await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed = self.parse_success(response).await?;
            debug!(
                "LLM call succeeded ({}): input_tokens={}, output_tokens={}",
                self.label(),
                parsed.input_tokens,
                parsed.output_tokens
            );
            return Ok(parsed);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(&self, prompt: &str, system: &str) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = strip_json_fences(&response.text);
        serde_json::from_str(text).map_err(LlmError::Parse)
    }

    async fn send(&self, prompt: &str, system: &str) -> Result<reqwest::Response, reqwest::Error> {
        let messages = vec![ChatMessage {
            role: "user",
            content: prompt,
        }];

        match self.provider {
            LlmProvider::Anthropic => {
                let body = AnthropicRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    system,
                    messages,
                };
                self.client
                    .post(format!("{}/v1/messages", self.base_url))
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .header("content-type", "application/json")
                    .json(&body)
                    .send()
                    .await
            }
            LlmProvider::OpenAi => {
                let mut all = vec![ChatMessage {
                    role: "system",
                    content: system,
                }];
                all.extend(messages);
                let body = OpenAiRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    messages: all,
                };
                self.client
                    .post(format!("{}/v1/chat/completions", self.base_url))
                    .bearer_auth(&self.api_key)
                    .json(&body)
                    .send()
                    .await
            }
        }
    }

    async fn parse_success(&self, response: reqwest::Response) -> Result<LlmResponse, LlmError> {
        let parsed = match self.provider {
            LlmProvider::Anthropic => {
                let body: AnthropicResponse = response.json().await?;
                let text = body
                    .content
                    .into_iter()
                    .find(|b| b.block_type == "text")
                    .and_then(|b| b.text);
                text.map(|text| LlmResponse {
                    text,
                    input_tokens: body.usage.input_tokens,
                    output_tokens: body.usage.output_tokens,
                })
            }
            LlmProvider::OpenAi => {
                let body: OpenAiResponse = response.json().await?;
                let (input_tokens, output_tokens) = body
                    .usage
                    .map(|u| (u.prompt_tokens, u.completion_tokens))
                    .unwrap_or((0, 0));
                body.choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .map(|text| LlmResponse {
                        text,
                        input_tokens,
                        output_tokens,
                    })
            }
        };

        match parsed {
            Some(r) if !r.text.trim().is_empty() => Ok(r),
            _ => Err(LlmError::EmptyContent),
        }
    }
}

/// Removes a surrounding Markdown code fence, with or without a `json` tag.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_prefix("json").unwrap_or(body).trim_start();
    body.strip_suffix("```").map(str::trim).unwrap_or(body)
}
