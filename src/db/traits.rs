use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::report::ReportRecord;

/// 记录库错误；可重试，重新调用保存即可
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot open record store {path}: {message}")]
    Connect { path: String, message: String },

    #[error("cannot prepare record store schema: {0}")]
    Schema(String),

    #[error("record store query failed: {0}")]
    Query(String),

    #[error("unreadable stored record: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// 记录库中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: i64,
    /// 报告编号
    pub filename: String,
    pub composition: String,
    pub brightness: String,
    pub sharpness: String,
    pub critique: String,
    /// 写入时间（UTC）
    pub timestamp: NaiveDateTime,
}

/// 只追加的评语记录库
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// 追加一条记录，返回自增编号
    async fn insert(&self, record: &ReportRecord) -> Result<i64, StoreError>;

    /// 全部记录，按时间倒序
    async fn list(&self) -> Result<Vec<StoredReport>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    fn location(&self) -> String;
}
