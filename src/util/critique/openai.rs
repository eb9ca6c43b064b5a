use super::{CritiqueError, CritiqueGenerator, CritiquePrompt};
use crate::util::config::CritiqueConfig;
use crate::util::http_client::{HttpClient, HttpClientConfig};
use crate::util::logging::standards::events;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// 错误响应体最多保留的字符数
const MAX_ERROR_BODY_CHARS: usize = 512;

/// OpenAI 兼容接口的评语生成器
pub struct OpenAiCritiqueGenerator {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

impl OpenAiCritiqueGenerator {
    pub fn new(config: &CritiqueConfig) -> anyhow::Result<Self> {
        let http = HttpClient::new(HttpClientConfig::for_critique(config).with_env_proxy())?;
        Ok(Self::with_client(config, http))
    }

    pub fn with_client(config: &CritiqueConfig, http: HttpClient) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_transport_error(&self, err: reqwest::Error) -> CritiqueError {
        if err.is_timeout() {
            CritiqueError::Timeout(self.timeout_secs)
        } else {
            CritiqueError::Transport(err.to_string())
        }
    }
}

fn map_status(status: StatusCode, body: String) -> CritiqueError {
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CritiqueError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => CritiqueError::RateLimited(body),
        _ => CritiqueError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl CritiqueGenerator for OpenAiCritiqueGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &CritiquePrompt) -> Result<String, CritiqueError> {
        if self.api_key.is_empty() {
            return Err(CritiqueError::MissingApiKey);
        }

        let start = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.text(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            event = events::CRITIQUE_REQUEST,
            model = %self.model,
            endpoint = %self.endpoint,
            prompt_chars = prompt.text().chars().count()
        );

        let response = self
            .http
            .reqwest_client()
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(
                event = events::CRITIQUE_ERROR,
                status = status.as_u16(),
                "评语服务返回错误状态"
            );
            return Err(map_status(status, error_body));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                CritiqueError::Timeout(self.timeout_secs)
            } else {
                CritiqueError::MalformedResponse(e.to_string())
            }
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CritiqueError::MalformedResponse(
                "response contained no completion text".to_string(),
            ));
        }

        info!(
            event = events::CRITIQUE_COMPLETE,
            model = %self.model,
            tokens = chat_response.usage.and_then(|u| u.total_tokens).unwrap_or(0),
            latency_ms = start.elapsed().as_millis() as u64,
            chars = content.chars().count()
        );

        Ok(content)
    }
}
