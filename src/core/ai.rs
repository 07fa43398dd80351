// language model integration - turns plain english into sql text

use crate::core::prompt::Prompt;
use crate::{AiConfig, Error, Provider};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

const REGISTRATION_HEADER: &str = "deere-ai-gateway-registration-id";

/// Something that can answer a prompt with free text.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, Error>;
}

pub struct Ai {
    client: reqwest::Client,
    provider: Provider,
    api_key: String,
    model: String,
    endpoint: String,
    registration_id: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

// openai-style chat completion, also spoken by the gateway
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// anthropic messages api
#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    text: String,
}

impl Ai {
    pub fn new(config: &AiConfig) -> Result<Self, Error> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(Error::MissingApiKey(config.provider.key_hint()))?;

        let endpoint = config.endpoint.clone().ok_or_else(|| {
            Error::Config(format!(
                "no api url for the {} provider (set AI_GATEWAY_URL or --endpoint)",
                config.provider.name()
            ))
        })?;

        if config.provider == Provider::Gateway && config.registration_id.is_none() {
            return Err(Error::Auth(
                "gateway registration id missing (set AI_GATEWAY_REGISTRATION_ID)".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            provider: config.provider,
            api_key,
            model: config.model.clone(),
            endpoint,
            registration_id: config.registration_id.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: &Prompt) -> reqwest::RequestBuilder {
        match self.provider {
            Provider::Claude => self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&ClaudeRequest {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    system: &prompt.system,
                    messages: [Message {
                        role: "user",
                        content: &prompt.user,
                    }],
                }),
            Provider::OpenAi | Provider::Gateway => {
                let mut request = self
                    .client
                    .post(&self.endpoint)
                    .bearer_auth(&self.api_key)
                    .json(&ChatRequest {
                        model: &self.model,
                        messages: [
                            Message {
                                role: "system",
                                content: &prompt.system,
                            },
                            Message {
                                role: "user",
                                content: &prompt.user,
                            },
                        ],
                        max_tokens: self.max_tokens,
                        temperature: self.temperature,
                    });
                if let Some(id) = &self.registration_id {
                    request = request.header(REGISTRATION_HEADER, id);
                }
                request
            }
        }
    }
}

#[async_trait]
impl SqlGenerator for Ai {
    async fn complete(&self, prompt: &Prompt) -> Result<String, Error> {
        let started = Instant::now();

        let response = self
            .request(prompt)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("model api unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::Auth(format!("{status}: {body}"))
                }
                _ => Error::Generation(format!("model api returned {status}: {body}")),
            });
        }

        let malformed = |e: reqwest::Error| Error::Generation(format!("malformed model response: {e}"));
        let text = match self.provider {
            Provider::Claude => response
                .json::<ClaudeResponse>()
                .await
                .map_err(malformed)?
                .content
                .into_iter()
                .next()
                .map(|c| c.text),
            Provider::OpenAi | Provider::Gateway => response
                .json::<ChatResponse>()
                .await
                .map_err(malformed)?
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
        };

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model responded"
        );

        match text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(Error::Generation("model returned an empty response".into())),
        }
    }
}
