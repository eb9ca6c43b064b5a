//! 配置结构定义模块
//! 包含服务、日志、评语生成、记录库、报告导出与流水线的全部配置

use crate::model::evaluation::EvaluationCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub critique: CritiqueConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn get_port(&self) -> u16 {
        self.server.port
    }

    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.server.protocol, self.server.host, self.server.port
        )
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb as usize * 1024 * 1024
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// 单次上传上限（MB）
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    /// 单请求超时（秒），覆盖评语生成与导出
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 允许的跨域来源，逗号分隔；为空时只允许本机
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            protocol: default_protocol(),
            max_upload_mb: default_max_upload_mb(),
            request_timeout_secs: default_request_timeout_secs(),
            cors_allowed_origins: None,
        }
    }
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_max_upload_mb() -> u64 {
    20
}

fn default_request_timeout_secs() -> u64 {
    180
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: LogFileConfig,
    /// 是否启用结构化（JSON）日志
    #[serde(default)]
    pub structured: Option<bool>,
    #[serde(default)]
    pub level_config: Option<LevelConfig>,
    #[serde(default)]
    pub enable_debug_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: LogFileConfig::default(),
            structured: Some(false),
            level_config: None,
            enable_debug_file: false,
        }
    }
}

/// 日志文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogFileConfig {
    pub enabled: bool,
    pub directory: String,
    pub retention_days: Option<u32>,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: "logs".to_string(),
            retention_days: Some(14),
        }
    }
}

/// 日志级别配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub pipeline: Option<String>,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

/// 评语生成服务配置（OpenAI 兼容接口）
#[derive(Clone, Serialize, Deserialize)]
pub struct CritiqueConfig {
    pub base_url: String,
    /// 为空时读取 OPENAI_API_KEY
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default = "default_critique_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// 评语输出语言
    #[serde(default = "default_language")]
    pub language: String,
}

impl CritiqueConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for CritiqueConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 300,
            timeout_secs: default_critique_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            language: default_language(),
        }
    }
}

// api_key 不进入日志
impl std::fmt::Debug for CritiqueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CritiqueConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &if self.has_api_key() { "[hidden]" } else { "" },
            )
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("language", &self.language)
            .finish()
    }
}

fn default_critique_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_language() -> String {
    "English".to_string()
}

/// 记录库配置（SQLite）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/photo_comments.db".to_string(),
        }
    }
}

/// 报告导出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: String,
    /// 自定义 HTML 模板，支持 {{image_base64}} {{composition}} 等占位符
    #[serde(default)]
    pub template_path: Option<String>,
    #[serde(default = "default_true")]
    pub pdf_enabled: bool,
    #[serde(default = "default_embed_max_side")]
    pub embed_max_side: u32,
    #[serde(default = "default_embed_jpeg_quality")]
    pub embed_jpeg_quality: u8,
    #[serde(default = "default_wkhtmltopdf_timeout_secs")]
    pub wkhtmltopdf_timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: "reports".to_string(),
            template_path: None,
            pdf_enabled: true,
            embed_max_side: default_embed_max_side(),
            embed_jpeg_quality: default_embed_jpeg_quality(),
            wkhtmltopdf_timeout_secs: default_wkhtmltopdf_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_embed_max_side() -> u32 {
    photo_heuristics::DEFAULT_EMBED_MAX_SIDE
}

fn default_embed_jpeg_quality() -> u8 {
    photo_heuristics::DEFAULT_EMBED_QUALITY
}

fn default_wkhtmltopdf_timeout_secs() -> u64 {
    60
}

/// 流水线默认步骤
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<EvaluationCategory>,
    #[serde(default)]
    pub auto_persist: bool,
    #[serde(default)]
    pub auto_export: bool,
    #[serde(default)]
    pub text_export: bool,
    /// 记录中是否内嵌缩略图
    #[serde(default = "default_true")]
    pub embed_image: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            auto_persist: false,
            auto_export: false,
            text_export: false,
            embed_image: true,
        }
    }
}

fn default_categories() -> Vec<EvaluationCategory> {
    EvaluationCategory::ALL.to_vec()
}
