//! 配置验证模块
//! 提供配置的验证、检查和诊断功能

use super::types::*;
use std::path::Path;
use url::Url;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 全面验证配置
    pub fn validate_all(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_server_config(&config.server, &mut report);
        Self::validate_critique_config(&config.critique, &mut report);
        Self::validate_database_config(&config.database, &mut report);
        Self::validate_report_config(&config.report, &mut report);
        Self::validate_pipeline_config(&config.pipeline, &mut report);
        Self::validate_logging_config(&config.logging, &mut report);

        report
    }

    fn validate_server_config(server: &ServerConfig, report: &mut ValidationReport) {
        if server.port == 0 {
            report.add_error("server.port", "端口不能为0");
        } else if server.port < 1024 {
            report.add_warning("server.port", "使用了特权端口，可能需要管理员权限");
        }

        if !matches!(server.protocol.as_str(), "http" | "https") {
            report.add_error("server.protocol", "服务器协议必须是http或https");
        }

        if server.max_upload_mb == 0 {
            report.add_error("server.max_upload_mb", "上传上限必须大于0");
        }

        if server.request_timeout_secs == 0 {
            report.add_error("server.request_timeout_secs", "请求超时必须大于0");
        }
    }

    fn validate_critique_config(critique: &CritiqueConfig, report: &mut ValidationReport) {
        match Url::parse(&critique.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => report.add_error(
                "critique.base_url",
                &format!("不支持的协议: {}", url.scheme()),
            ),
            Err(err) => report.add_error(
                "critique.base_url",
                &format!("评语服务地址解析失败: {}", err),
            ),
        }

        if !critique.has_api_key() {
            report.add_warning(
                "critique.api_key",
                "未配置API Key（也可通过 OPENAI_API_KEY 提供），评语生成将失败",
            );
        }

        if critique.model.trim().is_empty() {
            report.add_error("critique.model", "模型名称不能为空");
        }

        if !(0.0..=2.0).contains(&critique.temperature) {
            report.add_error("critique.temperature", "temperature 必须在 0 到 2 之间");
        }

        if critique.max_tokens == 0 {
            report.add_error("critique.max_tokens", "max_tokens 必须大于0");
        }

        if critique.timeout_secs == 0 || critique.connect_timeout_secs == 0 {
            report.add_error("critique.timeout_secs", "超时时间必须大于0");
        }

        if critique.language.trim().is_empty() {
            report.add_warning("critique.language", "未指定评语语言，将由模型自行决定");
        }
    }

    fn validate_database_config(database: &DatabaseConfig, report: &mut ValidationReport) {
        if database.path.trim().is_empty() {
            report.add_error("database.path", "记录库路径不能为空");
        } else {
            report.add_info("database", &format!("使用SQLite记录库: {}", database.path));
        }
    }

    fn validate_report_config(config: &ReportConfig, report: &mut ValidationReport) {
        if config.output_dir.trim().is_empty() {
            report.add_error("report.output_dir", "报告目录不能为空");
        }

        if let Some(template) = config.template_path.as_deref() {
            if !Path::new(template).is_file() {
                report.add_error(
                    "report.template_path",
                    &format!("报告模板不存在: {}", template),
                );
            }
        }

        if config.embed_max_side == 0 {
            report.add_error("report.embed_max_side", "内嵌图片边长必须大于0");
        }

        if !(1..=100).contains(&config.embed_jpeg_quality) {
            report.add_error(
                "report.embed_jpeg_quality",
                "JPEG质量必须在 1 到 100 之间",
            );
        }

        if config.pdf_enabled && config.wkhtmltopdf_timeout_secs == 0 {
            report.add_error("report.wkhtmltopdf_timeout_secs", "PDF转换超时必须大于0");
        }
    }

    fn validate_pipeline_config(pipeline: &PipelineConfig, report: &mut ValidationReport) {
        if pipeline.categories.is_empty() {
            report.add_error("pipeline.categories", "至少需要选择一个评估项目");
        }
    }

    fn validate_logging_config(logging: &LoggingConfig, report: &mut ValidationReport) {
        if !VALID_LOG_LEVELS.contains(&logging.level.to_ascii_lowercase().as_str()) {
            report.add_warning(
                "logging.level",
                &format!("无效的日志级别: {}，将使用 info", logging.level),
            );
        }

        if logging.file.enabled && logging.file.directory.trim().is_empty() {
            report.add_error("logging.file.directory", "日志目录不能为空");
        }
    }
}

/// 验证报告
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub info: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue::new(field, message));
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue::new(field, message));
    }

    pub fn add_info(&mut self, field: &str, message: &str) {
        self.info.push(ValidationIssue::new(field, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }
}

/// 验证问题
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::ConfigWriter;

    fn fields(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|issue| issue.field.as_str()).collect()
    }

    #[test]
    fn template_is_valid_but_warns_about_missing_key() {
        let report = ConfigValidator::validate_all(&ConfigWriter::generate_template());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(fields(&report.warnings).contains(&"critique.api_key"));
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut config = ConfigWriter::generate_template();
        config.server.port = 0;
        config.critique.base_url = "ftp://example.com".to_string();
        config.critique.temperature = 3.5;
        config.critique.max_tokens = 0;
        config.report.embed_jpeg_quality = 0;
        config.report.template_path = Some("/definitely/missing/template.html".to_string());
        config.pipeline.categories.clear();

        let report = ConfigValidator::validate_all(&config);
        let errors = fields(&report.errors);
        for field in [
            "server.port",
            "critique.base_url",
            "critique.temperature",
            "critique.max_tokens",
            "report.embed_jpeg_quality",
            "report.template_path",
            "pipeline.categories",
        ] {
            assert!(errors.contains(&field), "missing error for {field}");
        }
    }

    #[test]
    fn unknown_log_level_is_only_a_warning() {
        let mut config = ConfigWriter::generate_template();
        config.logging.level = "verbose".to_string();
        let report = ConfigValidator::validate_all(&config);
        assert!(report.is_valid());
        assert!(fields(&report.warnings).contains(&"logging.level"));
    }
}
