//! 统一错误类型
//!
//! 四类错误各自对应独立的 HTTP 状态码和命令行提示：
//! - InvalidInput: 图片无法解码、格式不支持、未选择评估项目、提交的记录不合法
//! - ExternalService: 评语生成服务失败
//! - Persistence: 记录库读写失败
//! - Export: 文档导出失败

use crate::db::StoreError;
use crate::model::RecordError;
use crate::util::critique::CritiqueError;
use crate::util::report::ExportError;
use crate::util::{IntoJson, WebResult};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use photo_heuristics::HeuristicsError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CriticError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("critique service error: {0}")]
    ExternalService(#[from] CritiqueError),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

impl CriticError {
    pub fn kind(&self) -> &'static str {
        match self {
            CriticError::InvalidInput(_) => "invalid_input",
            CriticError::ExternalService(_) => "external_service",
            CriticError::Persistence(_) => "persistence",
            CriticError::Export(_) => "export",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CriticError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CriticError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            CriticError::Persistence(_) | CriticError::Export(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, CriticError::InvalidInput(_))
    }
}

impl From<HeuristicsError> for CriticError {
    fn from(err: HeuristicsError) -> Self {
        if err.is_invalid_input() {
            CriticError::InvalidInput(err.to_string())
        } else {
            CriticError::Export(ExportError::Embed(err.to_string()))
        }
    }
}

impl From<RecordError> for CriticError {
    fn from(err: RecordError) -> Self {
        CriticError::InvalidInput(err.to_string())
    }
}

impl IntoResponse for CriticError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = WebResult::err_with_data(
            status.as_u16() as u32,
            self.to_string(),
            json!({ "kind": self.kind() }),
        );
        (status, body.into_json()).into_response()
    }
}

pub type CriticResult<T> = Result<T, CriticError>;
