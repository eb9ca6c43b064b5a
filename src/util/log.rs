use crate::util::config::{LevelConfig, LoggingConfig};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::fmt::format::Format;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter::EnvFilter, Layer, Registry};

/// 访问日志 target，主日志文件中屏蔽
pub const ACCESS_TARGET: &str = "http.server";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

static ACCESS_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static DEBUG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// 按配置初始化日志：控制台 + 按天滚动的 info / access / debug 文件
pub fn log_init_with_config(
    file_prefix: &str,
    config: LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level_filter = parse_level(&config.level);
    let filter_expression = build_env_filter_expression(level_filter, config.level_config.as_ref());
    let use_json = config.structured.unwrap_or(false);

    let mut layers: Vec<BoxedLayer> = vec![text_or_json(
        use_json,
        io::stdout,
        true,
        env_filter(&filter_expression, level_filter),
    )];

    if !config.file.enabled {
        Registry::default().with(layers).init();
        tracing::info!(event = "log.init", level = %config.level, console = true, file = false, structured = use_json);
        return Ok(None);
    }

    let log_dir = resolve_log_dir(&config.file.directory);
    std::fs::create_dir_all(&log_dir)?;

    let main_filter_expr = format!("{},{}=off", filter_expression, ACCESS_TARGET);
    let access_filter_expr = format!("{}={}", ACCESS_TARGET, level_filter_to_str(level_filter));

    let (info_writer, guard) = tracing_appender::non_blocking(daily(&log_dir, format!("{}-info", file_prefix)));
    layers.push(text_or_json(
        use_json,
        info_writer,
        false,
        env_filter(&main_filter_expr, level_filter),
    ));

    let (access_writer, access_guard) =
        tracing_appender::non_blocking(daily(&log_dir, format!("{}-access", file_prefix)));
    let _ = ACCESS_GUARD.set(access_guard);
    layers.push(text_or_json(
        use_json,
        access_writer,
        false,
        env_filter(&access_filter_expr, level_filter),
    ));

    if config.enable_debug_file {
        let debug_filter_expr = format!(
            "{},{}=off",
            build_env_filter_expression(LevelFilter::DEBUG, config.level_config.as_ref()),
            ACCESS_TARGET
        );
        let (debug_writer, debug_guard) =
            tracing_appender::non_blocking(daily(&log_dir, format!("{}-debug", file_prefix)));
        let _ = DEBUG_GUARD.set(debug_guard);
        layers.push(text_or_json(
            use_json,
            debug_writer,
            false,
            env_filter(&debug_filter_expr, LevelFilter::DEBUG),
        ));
    }

    Registry::default().with(layers).init();

    tracing::info!(
        event = "log.init",
        level = %config.level,
        console = true,
        file = true,
        directory = %log_dir.display(),
        rotation = "daily",
        structured = use_json,
        access_file = format!("{}-access", file_prefix),
        split_debug = config.enable_debug_file
    );
    if let Some(retention) = config.file.retention_days {
        tracing::info!(event = "log.retention", days = retention);
    }

    Ok(Some(guard))
}

/// 命令行工具使用：只输出到 stderr，不落盘
pub fn log_init_stderr(level: &str) {
    let level_filter = parse_level(level);
    let layer = layer()
        .event_format(Format::default().without_time().with_target(false))
        .with_writer(io::stderr)
        .with_filter(env_filter(level_filter_to_str(level_filter), level_filter));
    let _ = Registry::default().with(layer).try_init();
}

fn text_or_json<W>(use_json: bool, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'a> tracing_subscriber::fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    if use_json {
        layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    } else {
        layer()
            .event_format(Format::default().with_target(!ansi))
            .with_ansi(ansi)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    }
}

fn env_filter(expression: &str, fallback: LevelFilter) -> EnvFilter {
    EnvFilter::try_new(expression).unwrap_or_else(|_| EnvFilter::new(level_filter_to_str(fallback)))
}

// 相对路径以项目根目录为基准（在 bin/ 下启动时取上级目录）
pub fn resolve_log_dir(directory: &str) -> PathBuf {
    let path = Path::new(directory);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if current_dir.file_name() == Some(std::ffi::OsStr::new("bin")) {
        if let Some(parent) = current_dir.parent() {
            return parent.join(directory);
        }
    }
    current_dir.join(directory)
}

/// 删除超过保留天数的日志文件，只处理 `.log` 或带前缀的文件
pub fn cleanup_old_logs(log_dir: &Path, file_prefix: &str, retention_days: u32) -> anyhow::Result<usize> {
    if !log_dir.exists() {
        tracing::debug!("日志目录不存在: {}", log_dir.display());
        return Ok(0);
    }

    let cutoff_time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs()
        .saturating_sub(retention_days as u64 * 24 * 60 * 60);

    let mut deleted_count = 0;
    let mut total_size_deleted = 0u64;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("");

        if !file_name.ends_with(".log") && !file_name.starts_with(file_prefix) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let modified = metadata
            .modified()
            .or_else(|_| metadata.created())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok());
        let Some(modified) = modified else {
            continue;
        };

        if modified.as_secs() < cutoff_time {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    deleted_count += 1;
                    total_size_deleted += metadata.len();
                    tracing::debug!("已删除过期日志: {}", path.display());
                }
                Err(e) => tracing::warn!("删除日志文件失败: {} - {}", path.display(), e),
            }
        }
    }

    if deleted_count > 0 {
        tracing::info!(
            "已清理 {} 个过期日志文件，释放空间 {:.2} MB",
            deleted_count,
            total_size_deleted as f64 / (1024.0 * 1024.0)
        );
    }

    Ok(deleted_count)
}

fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn build_env_filter_expression(
    default_level: LevelFilter,
    level_config: Option<&LevelConfig>,
) -> String {
    let mut directives = vec![level_filter_to_str(default_level).to_string()];

    if let Some(cfg) = level_config {
        if let Some(level) = cfg.api.as_deref().and_then(normalize_level_str) {
            directives.push(format!("photo_critic::api={level}"));
        }
        if let Some(level) = cfg.pipeline.as_deref().and_then(normalize_level_str) {
            directives.push(format!("photo_critic::pipeline={level}"));
            directives.push(format!("photo_critic::util::critique={level}"));
            directives.push(format!("photo_heuristics={level}"));
        }
        if let Some(level) = cfg.storage.as_deref().and_then(normalize_level_str) {
            directives.push(format!("photo_critic::db={level}"));
            directives.push(format!("photo_critic::util::report={level}"));
        }

        let mut overrides: Vec<_> = cfg.overrides.iter().collect();
        overrides.sort();
        for (target, level_str) in overrides {
            if let Some(level) = normalize_level_str(level_str) {
                directives.push(format!("{}={level}", normalize_directive_target(target)));
            }
        }
    }

    directives.join(",")
}

fn normalize_level_str(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

fn level_filter_to_str(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::OFF => "off",
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
    }
}

fn normalize_directive_target(target: &str) -> String {
    if let Some(raw) = target.strip_prefix("target:") {
        raw.to_string()
    } else if target.contains("::") {
        target.to_string()
    } else {
        format!("photo_critic::{}", target.replace('.', "::"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn filter_expression_includes_area_overrides() {
        let cfg = LevelConfig {
            api: Some("debug".to_string()),
            pipeline: Some("TRACE".to_string()),
            storage: Some("nonsense".to_string()),
            overrides: HashMap::from([
                ("util.critique".to_string(), "warn".to_string()),
                ("target:http.server".to_string(), "error".to_string()),
            ]),
        };

        let expr = build_env_filter_expression(LevelFilter::INFO, Some(&cfg));
        assert!(expr.starts_with("info,"));
        assert!(expr.contains("photo_critic::api=debug"));
        assert!(expr.contains("photo_heuristics=trace"));
        assert!(expr.contains("photo_critic::util::critique=warn"));
        assert!(expr.contains("http.server=error"));
        assert!(!expr.contains("photo_critic::db"));
        assert!(EnvFilter::try_new(&expr).is_ok());
    }

    #[test]
    fn unknown_level_defaults_to_info() {
        assert_eq!(parse_level("loud"), LevelFilter::INFO);
        assert_eq!(parse_level("WARN"), LevelFilter::WARN);
    }

    #[test]
    fn cleanup_keeps_fresh_and_unrelated_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("photo-critic-info.2026-01-01"), "x").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();

        let deleted = cleanup_old_logs(temp_dir.path(), "photo-critic", 7).unwrap();
        assert_eq!(deleted, 0);
        assert!(temp_dir.path().join("notes.txt").exists());
    }

    #[test]
    fn cleanup_tolerates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert_eq!(cleanup_old_logs(&missing, "photo-critic", 7).unwrap(), 0);
    }
}
