//! 报告导出模块
//!
//! - html.rs: 内置版式 HTML 报告
//! - template.rs: 用户自定义模板
//! - pdf.rs: wkhtmltopdf 转换
//! - styles.rs: CSS样式
//! - text.rs: 纯文本报告
//!
//! 导出只读取记录，不修改记录；输出文件名由报告编号决定。

pub mod html;
pub mod pdf;
pub mod styles;
pub mod template;
pub mod text;

pub use html::HtmlReportGenerator;
pub use pdf::PdfGenerator;
pub use styles::CssStyleManager;
pub use template::TemplateEngine;

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{error, info};

use crate::model::report::{RecordError, ReportRecord};
use crate::util::config::ReportConfig;
use crate::util::logging::standards::events;

const CUSTOM_TEMPLATE: &str = "custom";

/// 可供下载的导出文件后缀
const EXPORT_SUFFIXES: [&str; 3] = ["_critique.html", "_critique.pdf", "_critique.txt"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("report I/O failed for {path}: {message}")]
    Io { path: String, message: String },

    #[error("report template error: {0}")]
    Template(String),

    #[error("PDF conversion failed: {0}")]
    Pdf(String),

    #[error("PDF tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("cannot encode embedded image: {0}")]
    Embed(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}

impl ExportError {
    fn io(path: &Path, err: std::io::Error) -> Self {
        ExportError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// 一次导出写出的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedReport {
    pub html_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
}

/// 报告导出器
#[derive(Debug, Clone)]
pub struct ReportExporter {
    output_dir: PathBuf,
    templates: TemplateEngine,
    use_custom_template: bool,
    pdf: Option<PdfGenerator>,
}

impl ReportExporter {
    /// 只输出 HTML 的内置版式导出器
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            templates: TemplateEngine::new(),
            use_custom_template: false,
            pdf: None,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Result<Self, ExportError> {
        let mut exporter = Self::new(&config.output_dir);

        if let Some(path) = config.template_path.as_deref().filter(|p| !p.trim().is_empty()) {
            exporter
                .templates
                .load_template_file(CUSTOM_TEMPLATE, Path::new(path))?;
            exporter.use_custom_template = true;
            info!("使用自定义报告模板: {}", path);
        }

        if config.pdf_enabled {
            exporter.pdf = Some(PdfGenerator::new(Duration::from_secs(
                config.wkhtmltopdf_timeout_secs,
            )));
        }

        Ok(exporter)
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.templates.register_template(CUSTOM_TEMPLATE, template);
        self.use_custom_template = true;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn pdf_enabled(&self) -> bool {
        self.pdf.is_some()
    }

    /// 渲染 HTML 文档，不落盘
    pub fn render_html(&self, record: &ReportRecord) -> Result<String, ExportError> {
        if self.use_custom_template {
            self.templates.render_template(CUSTOM_TEMPLATE, record)
        } else {
            Ok(HtmlReportGenerator::generate_report(record))
        }
    }

    /// 写出 `<id>_critique.html`，启用时再转换为 `<id>_critique.pdf`
    pub async fn export(&self, record: &ReportRecord) -> Result<ExportedReport, ExportError> {
        info!(event = events::EXPORT_START, report_id = %record.report_id, format = "html");

        record.validate()?;
        let html = self.render_html(record)?;
        self.ensure_output_dir().await?;

        let stem = record.file_stem();
        let html_path = self.output_dir.join(format!("{stem}.html"));
        fs::write(&html_path, html.as_bytes())
            .await
            .map_err(|e| ExportError::io(&html_path, e))?;

        let pdf_path = match &self.pdf {
            Some(pdf) => {
                let pdf_path = self.output_dir.join(format!("{stem}.pdf"));
                if let Err(e) = pdf.html_file_to_pdf(&html_path, &pdf_path).await {
                    error!(
                        event = events::EXPORT_ERROR,
                        report_id = %record.report_id,
                        error = %e
                    );
                    return Err(e);
                }
                Some(pdf_path)
            }
            None => None,
        };

        info!(
            event = events::EXPORT_COMPLETE,
            report_id = %record.report_id,
            html = %html_path.display(),
            pdf = pdf_path.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
        );

        Ok(ExportedReport { html_path, pdf_path })
    }

    /// 纯文本报告内容
    pub fn render_text(&self, record: &ReportRecord) -> String {
        text::render_text(record)
    }

    /// 写出 `<id>_critique.txt`
    pub async fn export_text(&self, record: &ReportRecord) -> Result<PathBuf, ExportError> {
        record.validate()?;
        self.ensure_output_dir().await?;
        let path = self.output_dir.join(format!("{}.txt", record.file_stem()));
        fs::write(&path, self.render_text(record).as_bytes())
            .await
            .map_err(|e| ExportError::io(&path, e))?;

        info!(
            event = events::EXPORT_COMPLETE,
            report_id = %record.report_id,
            text = %path.display()
        );
        Ok(path)
    }

    /// 解析下载请求的文件名；只接受输出目录下的导出文件
    pub fn locate(&self, file_name: &str) -> Option<PathBuf> {
        let mut components = Path::new(file_name).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single || file_name.starts_with('.') || file_name.contains('\\') {
            return None;
        }
        if !EXPORT_SUFFIXES.iter().any(|suffix| file_name.ends_with(suffix)) {
            return None;
        }

        let path = self.output_dir.join(file_name);
        path.is_file().then_some(path)
    }

    async fn ensure_output_dir(&self) -> Result<(), ExportError> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ExportError::io(&self.output_dir, e))
    }
}
