//! 配置管理模块
//! 负责配置文件的查找、加载、验证和日志初始化

use crate::util::config::{Config, ConfigLoader, ConfigValidator, ValidationReport};
use crate::util::log::{cleanup_old_logs, log_init_with_config, resolve_log_dir};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
const LOG_FILE_PREFIX: &str = "photo-critic";

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 加载和验证配置
    ///
    /// 日志系统此时尚未初始化，加载过程中的提示只在初始化后可见
    pub fn load_and_validate() -> Result<(Config, ValidationReport)> {
        let config_path = Self::find_config_file_path(CONFIG_FILE_NAME);
        Self::load_and_validate_from(&config_path)
    }

    pub fn load_and_validate_from(config_path: &Path) -> Result<(Config, ValidationReport)> {
        info!("配置文件路径: {}", config_path.display());

        let config = match ConfigLoader::load_with_env_overrides(config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("[warn] 配置文件读取失败: {} - {:#}", config_path.display(), e);
                Self::handle_config_load_failure(config_path)?
            }
        };

        let report = ConfigValidator::validate_all(&config);
        Self::log_validation_report(&report);
        Ok((config, report))
    }

    /// 初始化日志系统，并按保留天数清理旧日志
    pub fn initialize_logging(config: &Config) -> Result<Option<WorkerGuard>> {
        let log_guard = log_init_with_config(LOG_FILE_PREFIX, config.logging.clone())?;

        if let Some(retention_days) = config.logging.file.retention_days {
            if config.logging.file.enabled {
                let log_path = resolve_log_dir(&config.logging.file.directory);
                match cleanup_old_logs(&log_path, LOG_FILE_PREFIX, retention_days) {
                    Ok(deleted) => info!(
                        "[ok] 日志清理完成，保留 {} 天，删除 {} 个文件",
                        retention_days, deleted
                    ),
                    Err(e) => warn!("日志清理失败: {}", e),
                }
            }
        }

        Ok(log_guard)
    }

    /// 查找配置文件路径，适应开发和发布目录
    pub fn find_config_file_path(filename: &str) -> PathBuf {
        if let Some(explicit) = std::env::var_os("PHOTO_CRITIC_CONFIG") {
            return PathBuf::from(explicit);
        }

        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        // 当前目录的 config/ 子目录
        let config_in_current = current_dir.join("config").join(filename);
        if config_in_current.exists() {
            return config_in_current;
        }

        // 在 bin/ 下启动时取上级目录的 config/
        if let Some(parent) = current_dir.parent() {
            let config_in_parent = parent.join("config").join(filename);
            if config_in_parent.exists() {
                return config_in_parent;
            }
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
        {
            if exe_dir.file_name() == Some(std::ffi::OsStr::new("bin")) {
                if let Some(project_root) = exe_dir.parent() {
                    let config_in_root = project_root.join("config").join(filename);
                    if config_in_root.exists() {
                        return config_in_root;
                    }
                }
            }
        }

        let dev_path = current_dir.join(filename);
        if dev_path.exists() {
            return dev_path;
        }

        // 都不存在时在 config/ 下生成默认配置
        config_in_current
    }

    /// 文件不存在时写出默认配置；存在但无法解析时报错
    fn handle_config_load_failure(config_path: &Path) -> Result<Config> {
        if !config_path.exists() {
            info!("[note] 创建默认配置文件: {}", config_path.display());
            let config = ConfigLoader::apply_env_overrides(Config::default());
            if let Err(write_err) = Config::default().write_yaml_to_path(config_path) {
                warn!("[fail] 创建默认配置文件失败: {}", write_err);
            }
            Ok(config)
        } else {
            Err(anyhow::anyhow!(
                "配置文件解析失败，请检查语法: {}",
                config_path.display()
            ))
        }
    }

    fn log_validation_report(report: &ValidationReport) {
        if report.has_errors() {
            warn!("[warn] 配置验证发现错误: {}", report.error_count());
            for error in &report.errors {
                warn!("  - {}: {}", error.field, error.message);
            }
        }

        if report.has_warnings() {
            info!("配置验证发现警告: {}", report.warning_count());
            for warning in &report.warnings {
                info!("  - {}: {}", warning.field, warning.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_writes_default_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config").join(CONFIG_FILE_NAME);

        let (config, report) = ConfigManager::load_and_validate_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, Config::default().server.port);
        assert!(!report.has_errors());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("api_key"));
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "server: [unclosed").unwrap();

        assert!(ConfigManager::load_and_validate_from(&path).is_err());
    }

    #[test]
    fn validation_errors_are_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "server:\n  host: 127.0.0.1\n  port: 0\ncritique:\n  base_url: ftp://example.com\n  model: gpt-3.5-turbo\n  temperature: 0.7\n  max_tokens: 300\n",
        )
        .unwrap();

        let (_, report) = ConfigManager::load_and_validate_from(&path).unwrap();
        let fields: Vec<&str> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"server.port"));
        assert!(fields.contains(&"critique.base_url"));
    }
}
