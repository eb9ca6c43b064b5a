use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::info;

pub mod api;
pub mod build_info;
pub mod db;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod server;
pub mod util;

use db::SqliteReportStore;
use pipeline::{CritiquePipeline, PipelineSettings};
use util::config::Config;
use util::critique::OpenAiCritiqueGenerator;
use util::report::ReportExporter;

pub use error::{CriticError, CriticResult};

/// 应用状态结构
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<CritiquePipeline>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, pipeline: CritiquePipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            started_at: Instant::now(),
        }
    }

    /// 按配置组装流水线：OpenAI 兼容评语生成、SQLite 记录库、报告导出
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let pipeline = build_pipeline(&config)?;
        Ok(Self::new(config, pipeline))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

pub fn build_pipeline(config: &Config) -> anyhow::Result<CritiquePipeline> {
    let generator = OpenAiCritiqueGenerator::new(&config.critique)
        .context("failed to build critique client")?;
    let store = SqliteReportStore::new(&config.database.path);
    let exporter =
        ReportExporter::from_config(&config.report).context("failed to prepare report exporter")?;
    let settings = PipelineSettings::from_config(config)?;

    info!(
        event = "pipeline.init",
        model = %config.critique.model,
        endpoint = %generator.endpoint(),
        api_key = if config.critique.has_api_key() { "[hidden]" } else { "<missing>" },
        store = %config.database.path,
        reports = %config.report.output_dir,
        pdf = exporter.pdf_enabled()
    );

    Ok(CritiquePipeline::new(
        Arc::new(generator),
        Arc::new(store),
        Arc::new(exporter),
        settings,
    ))
}
