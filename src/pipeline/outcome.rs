//! 流水线结果

use photo_heuristics::HeuristicReport;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::CriticError;
use crate::model::evaluation::{Assessments, CategorySelection};
use crate::model::report::ReportRecord;
use crate::util::report::ExportedReport;

/// 单个步骤的执行结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome<T> {
    Skipped,
    Completed { result: T },
    Failed { kind: String, error: String },
}

impl<T> StageOutcome<T> {
    pub fn from_result(result: Result<T, CriticError>) -> Self {
        match result {
            Ok(result) => StageOutcome::Completed { result },
            Err(err) => StageOutcome::Failed {
                kind: err.kind().to_string(),
                error: err.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            StageOutcome::Completed { result } => Some(result),
            _ => None,
        }
    }
}

/// 图片基本信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// 一次完整评估的结果；评语或各输出步骤失败不影响已得到的评估结果
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub image: ImageInfo,
    pub categories: CategorySelection,
    pub heuristics: HeuristicReport,
    pub assessments: Assessments,
    /// 评语生成失败时的错误描述
    pub critique_error: Option<String>,
    pub record: ReportRecord,
    pub persisted: StageOutcome<i64>,
    pub exported: StageOutcome<ExportedReport>,
    pub text_exported: StageOutcome<PathBuf>,
}

impl PipelineOutcome {
    pub fn critique(&self) -> Option<&str> {
        if self.critique_error.is_some() {
            None
        } else {
            Some(&self.record.critique)
        }
    }

    /// 是否有被请求的输出步骤失败
    pub fn has_failed_sink(&self) -> bool {
        self.persisted.is_failed() || self.exported.is_failed() || self.text_exported.is_failed()
    }
}
