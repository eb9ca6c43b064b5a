//! 服务器模块
//!
//! - 配置管理 (config.rs)
//! - HTTP服务器设置 (http.rs)
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! let server = photo_critic::server::ServerBootstrap::new().await?;
//! server.start().await
//! # }
//! ```

pub mod config;
pub mod http;

pub use config::ConfigManager;
pub use http::{HttpServer, ServerManager};

use crate::build_info;
use crate::util::config::{Config, ValidationReport};
use crate::util::report::PdfGenerator;
use crate::AppState;
use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// 服务器引导程序 - 统一的服务器启动入口
pub struct ServerBootstrap {
    config: Config,
    validation_report: ValidationReport,
    _log_guard: Option<WorkerGuard>,
}

impl ServerBootstrap {
    pub async fn new() -> Result<Self> {
        let (config, validation_report) = ConfigManager::load_and_validate()?;
        let log_guard = ConfigManager::initialize_logging(&config)?;

        if validation_report.has_errors() {
            for issue in &validation_report.errors {
                warn!("  - {}: {}", issue.field, issue.message);
            }
            return Err(anyhow::anyhow!(
                "配置验证失败: {} 个错误",
                validation_report.error_count()
            ));
        }

        info!("[ok] 服务器引导程序初始化完成");

        Ok(Self {
            config,
            validation_report,
            _log_guard: log_guard,
        })
    }

    pub async fn start(self) -> Result<()> {
        info!("=== 照片点评服务启动 ===");
        info!("版本信息: {}", build_info::summary());
        info!("服务地址: {}", self.config.base_url());

        let app_state = AppState::from_config(self.config.clone())?;
        let server = ServerManager::create_server(&self.config, app_state).await?;
        ServerManager::start_server(server).await
    }

    /// 检查记录库、PDF 工具和 API Key
    pub async fn health_check(&self) -> Result<SystemHealthReport> {
        info!("[search] 执行系统健康检查...");
        let app_state = AppState::from_config(self.config.clone())?;
        let pipeline = &app_state.pipeline;

        let store_error = pipeline.store().health_check().await.err().map(|e| e.to_string());

        let pdf_tool = if pipeline.exporter().pdf_enabled() {
            Some(
                tokio::task::spawn_blocking(PdfGenerator::check_pdf_tools)
                    .await?
                    .map_err(|e| e.to_string()),
            )
        } else {
            None
        };

        let api_key_configured = self.config.critique.has_api_key();
        let overall_healthy = store_error.is_none()
            && api_key_configured
            && !matches!(pdf_tool, Some(Err(_)));

        Ok(SystemHealthReport {
            overall_healthy,
            store_location: pipeline.store().location(),
            store_error,
            pdf_tool,
            api_key_configured,
            validation_warnings: self
                .validation_report
                .warnings
                .iter()
                .map(|w| format!("{}: {}", w.field, w.message))
                .collect(),
            check_time: chrono::Utc::now(),
        })
    }
}

/// 系统健康检查报告
#[derive(Debug, Clone)]
pub struct SystemHealthReport {
    pub overall_healthy: bool,
    pub store_location: String,
    pub store_error: Option<String>,
    /// 未启用 PDF 时为 None
    pub pdf_tool: Option<Result<String, String>>,
    pub api_key_configured: bool,
    pub validation_warnings: Vec<String>,
    pub check_time: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Display for SystemHealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "overall: {}",
            if self.overall_healthy { "healthy" } else { "unhealthy" }
        )?;
        match &self.store_error {
            None => writeln!(f, "store: ok ({})", self.store_location)?,
            Some(e) => writeln!(f, "store: error ({}): {}", self.store_location, e)?,
        }
        match &self.pdf_tool {
            None => writeln!(f, "pdf: disabled")?,
            Some(Ok(version)) => writeln!(f, "pdf: {}", version)?,
            Some(Err(e)) => writeln!(f, "pdf: unavailable: {}", e)?,
        }
        writeln!(f, "api key: {}", if self.api_key_configured { "configured" } else { "missing" })?;
        for warning in &self.validation_warnings {
            writeln!(f, "warning: {}", warning)?;
        }
        write!(f, "checked at: {}", self.check_time.to_rfc3339())
    }
}

pub async fn start_server() -> Result<()> {
    let bootstrap = ServerBootstrap::new().await?;
    bootstrap.start().await
}

pub async fn check_system_health() -> Result<SystemHealthReport> {
    let bootstrap = ServerBootstrap::new().await?;
    bootstrap.health_check().await
}
