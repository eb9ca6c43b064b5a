//! 配置加载和管理模块
//! 处理配置文件的读取、写入、环境变量覆盖和默认值生成

use super::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从YAML文件读取配置
    pub fn read_yaml(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = serde_yaml::from_str(&config_str)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 从环境变量读取配置覆盖
    pub fn apply_env_overrides(config: Config) -> Config {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// 以给定的查找函数应用覆盖，便于测试时注入
    pub fn apply_overrides_from<F>(mut config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        tracing::info!("[tool] 应用环境变量配置覆盖...");

        if let Some(host) = lookup("PHOTO_CRITIC_HOST") {
            tracing::info!("[ok] 环境变量覆盖服务器地址: {}", host);
            config.server.host = host;
        }

        if let Some(port_str) = lookup("PHOTO_CRITIC_PORT") {
            match port_str.parse::<u16>() {
                Ok(port) => {
                    config.server.port = port;
                    tracing::info!("[ok] 环境变量覆盖服务器端口: {}", port);
                }
                Err(_) => tracing::warn!("[warn] PHOTO_CRITIC_PORT 无效: {}", port_str),
            }
        }

        if let Some(api_key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            config.critique.api_key = api_key.trim().to_string();
            tracing::info!("[ok] 环境变量覆盖评语服务API Key: [hidden]");
        }

        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            let trimmed = base_url.trim().trim_end_matches('/').to_string();
            tracing::info!("[ok] 环境变量覆盖评语服务地址: {}", trimmed);
            config.critique.base_url = trimmed;
        }

        if let Some(model) = lookup("PHOTO_CRITIC_MODEL") {
            tracing::info!("[ok] 环境变量覆盖模型: {}", model);
            config.critique.model = model;
        }

        if let Some(path) = lookup("PHOTO_CRITIC_DB_PATH") {
            tracing::info!("[ok] 环境变量覆盖记录库路径: {}", path);
            config.database.path = path;
        }

        if let Some(dir) = lookup("PHOTO_CRITIC_REPORT_DIR") {
            tracing::info!("[ok] 环境变量覆盖报告目录: {}", dir);
            config.report.output_dir = dir;
        }

        if let Some(level) = lookup("PHOTO_CRITIC_LOG_LEVEL") {
            tracing::info!("[ok] 环境变量覆盖日志级别: {}", level);
            config.logging.level = level.to_ascii_lowercase();
        }

        if let Some(flag) = lookup("PHOTO_CRITIC_AUTO_PERSIST") {
            match Self::parse_bool(&flag) {
                Some(enabled) => {
                    config.pipeline.auto_persist = enabled;
                    tracing::info!("[ok] 环境变量覆盖自动保存: {}", enabled);
                }
                None => tracing::warn!(
                    "[warn] PHOTO_CRITIC_AUTO_PERSIST 无法解析为布尔值: {}",
                    flag
                ),
            }
        }

        if let Some(flag) = lookup("PHOTO_CRITIC_AUTO_EXPORT") {
            match Self::parse_bool(&flag) {
                Some(enabled) => {
                    config.pipeline.auto_export = enabled;
                    tracing::info!("[ok] 环境变量覆盖自动导出: {}", enabled);
                }
                None => tracing::warn!(
                    "[warn] PHOTO_CRITIC_AUTO_EXPORT 无法解析为布尔值: {}",
                    flag
                ),
            }
        }

        tracing::info!("[tool] 环境变量覆盖配置应用完成");
        tracing::info!(
            event = "config.summary",
            base_url = %config.base_url(),
            model = %config.critique.model,
            api_key_configured = config.critique.has_api_key(),
            database = %config.database.path,
            report_dir = %config.report.output_dir
        );

        config
    }

    /// 解析布尔环境变量
    pub fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Some(true),
            "false" | "0" | "no" | "n" | "off" => Some(false),
            _ => None,
        }
    }

    /// 配置文件 + 环境变量
    pub fn load_with_env_overrides(path: impl AsRef<Path>) -> Result<Config> {
        let base_config = Self::read_yaml(path)?;
        let config = Self::apply_env_overrides(base_config);
        tracing::info!("[ok] 配置加载完成");
        Ok(config)
    }
}

/// 配置写入器
pub struct ConfigWriter;

impl ConfigWriter {
    /// 写入配置到指定路径，确保目录存在
    pub fn write_yaml_with_dir(config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml_content = serde_yaml::to_string(config)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }

    /// 生成配置模板
    pub fn generate_template() -> Config {
        Config {
            server: ServerConfig::default(),
            logging: LoggingConfig {
                level_config: Some(LevelConfig::default()),
                ..LoggingConfig::default()
            },
            critique: CritiqueConfig::default(),
            database: DatabaseConfig::default(),
            report: ReportConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn template_round_trips_through_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config").join("config.yaml");

        ConfigWriter::write_yaml_with_dir(&ConfigWriter::generate_template(), &path).unwrap();
        let loaded = ConfigLoader::read_yaml(&path).unwrap();

        assert_eq!(loaded.server.port, 8501);
        assert_eq!(loaded.critique.model, "gpt-3.5-turbo");
        assert_eq!(loaded.critique.max_tokens, 300);
        assert_eq!(loaded.pipeline.categories.len(), 3);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            "server:\n  host: 0.0.0.0\n  port: 9000\ncritique:\n  base_url: http://localhost:1234/v1\n  model: local\n  temperature: 0.2\n  max_tokens: 64\n",
        )
        .unwrap();

        let loaded = ConfigLoader::read_yaml(&path).unwrap();
        assert_eq!(loaded.server.port, 9000);
        assert_eq!(loaded.server.max_upload_mb, 20);
        assert_eq!(loaded.critique.language, "English");
        assert_eq!(loaded.database.path, "data/photo_comments.db");
        assert!(loaded.report.pdf_enabled);
    }

    #[test]
    fn env_overrides_are_applied() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PHOTO_CRITIC_PORT", "9100"),
            ("OPENAI_API_KEY", " sk-test "),
            ("OPENAI_BASE_URL", "http://127.0.0.1:8080/v1/"),
            ("PHOTO_CRITIC_AUTO_PERSIST", "yes"),
            ("PHOTO_CRITIC_AUTO_EXPORT", "maybe"),
        ]);

        let config = ConfigLoader::apply_overrides_from(ConfigWriter::generate_template(), |key| {
            vars.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.critique.api_key, "sk-test");
        assert_eq!(config.critique.base_url, "http://127.0.0.1:8080/v1");
        assert!(config.pipeline.auto_persist);
        assert!(!config.pipeline.auto_export);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let mut config = CritiqueConfig::default();
        config.api_key = "sk-secret".to_string();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[hidden]"));
    }
}
