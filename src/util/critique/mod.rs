//! 评语生成
//!
//! - prompt: 由三项评估结论拼装请求文本
//! - openai: OpenAI 兼容 `/chat/completions` 客户端
//!
//! 文本生成能力通过 `CritiqueGenerator` 注入，测试使用固定输出的替身。

pub mod openai;
pub mod prompt;

pub use openai::OpenAiCritiqueGenerator;
pub use prompt::CritiquePrompt;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CritiqueError {
    #[error("no API key configured for the critique service")]
    MissingApiKey,

    #[error("critique request timed out after {0}s")]
    Timeout(u64),

    #[error("critique service rejected the credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("critique service rate limit or quota exceeded: {0}")]
    RateLimited(String),

    #[error("critique service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("critique request failed: {0}")]
    Transport(String),

    #[error("malformed critique response: {0}")]
    MalformedResponse(String),
}

/// 外部文本生成能力；一次请求对应一次等待的响应
#[async_trait]
pub trait CritiqueGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &CritiquePrompt) -> Result<String, CritiqueError>;
}
