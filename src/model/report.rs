//! 评语报告记录

use super::evaluation::Assessments;
use chrono::{DateTime, Local};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

const MAX_STEM_CHARS: usize = 64;
/// `_YYYYmmdd_HHMMSS`
const TIMESTAMP_SUFFIX_CHARS: usize = 16;

/// 外部提交的记录不符合格式
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("invalid report id: {0:?}")]
    ReportId(String),

    #[error("embedded image is not base64")]
    ImageEncoding,
}

/// 一次评估的完整结果；创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// `<文件名主干>_<YYYYmmdd_HHMMSS>`
    pub report_id: String,
    /// 上传时的原始文件名
    pub source_name: String,
    pub composition: String,
    pub brightness: String,
    pub sharpness: String,
    pub critique: String,
    pub created_at: DateTime<Local>,
    /// base64 JPEG 缩略图
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl ReportRecord {
    pub fn assemble(
        source_name: &str,
        assessments: Assessments,
        critique: String,
        image_base64: Option<String>,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            report_id: build_report_id(source_name, &created_at),
            source_name: source_name.to_string(),
            composition: assessments.composition,
            brightness: assessments.brightness,
            sharpness: assessments.sharpness,
            critique,
            created_at,
            image_base64,
        }
    }

    pub fn assessments(&self) -> Assessments {
        Assessments {
            composition: self.composition.clone(),
            brightness: self.brightness.clone(),
            sharpness: self.sharpness.clone(),
        }
    }

    /// 导出文件名主干
    pub fn file_stem(&self) -> String {
        format!("{}_critique", self.report_id)
    }

    /// 校验来自请求体的记录
    ///
    /// 报告编号会拼入导出路径，只接受 `build_report_id` 生成的形状；
    /// 缩略图只能是 base64 字符。
    pub fn validate(&self) -> Result<(), RecordError> {
        if !is_valid_report_id(&self.report_id) {
            return Err(RecordError::ReportId(self.report_id.clone()));
        }
        if let Some(image) = &self.image_base64 {
            if !base64_regex().is_match(image) {
                return Err(RecordError::ImageEncoding);
            }
        }
        Ok(())
    }
}

fn report_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[\p{Alphabetic}\p{N}-][\p{Alphabetic}\p{N}_-]*_[0-9]{8}_[0-9]{6}$")
            .expect("report id regex is valid")
    })
}

fn base64_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}$").expect("base64 regex is valid"))
}

/// 报告编号是否为 `<文件名主干>_<YYYYmmdd_HHMMSS>`
pub fn is_valid_report_id(report_id: &str) -> bool {
    report_id.chars().count() <= MAX_STEM_CHARS + TIMESTAMP_SUFFIX_CHARS
        && report_id_regex().is_match(report_id)
}

pub fn build_report_id(source_name: &str, created_at: &DateTime<Local>) -> String {
    format!(
        "{}_{}",
        sanitize_stem(source_name),
        created_at.format("%Y%m%d_%H%M%S")
    )
}

/// 取文件名主干；保留字母数字与 `-` `_`，其他字符替换为 `_`
pub fn sanitize_stem(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(MAX_STEM_CHARS)
        .collect();

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "photo".to_string()
    } else {
        trimmed.to_string()
    }
}
