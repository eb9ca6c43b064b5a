//! SQLite 记录库
//! 每次操作：打开连接 → 建表（幂等）→ 事务内执行 → 提交 → 关闭

pub mod connection;
pub mod queries;
pub mod schemas;

use async_trait::async_trait;
use sqlx::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::traits::*;
use crate::model::report::ReportRecord;
use crate::util::logging::standards::events;
use connection::ConnectionManager;
use queries::CritiqueQueries;
use schemas::SchemaManager;

/// SQLite 评语记录库
pub struct SqliteReportStore {
    path: PathBuf,
}

impl SqliteReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn insert(&self, record: &ReportRecord) -> Result<i64, StoreError> {
        let mut conn = ConnectionManager::open(&self.path).await?;

        let result = async {
            SchemaManager::ensure_tables(&mut conn).await?;
            let mut tx = conn.begin().await?;
            let id = CritiqueQueries::insert(&mut tx, record).await?;
            tx.commit().await?;
            Ok::<_, StoreError>(id)
        }
        .await;

        ConnectionManager::close(conn).await;

        let id = result?;
        info!(
            event = events::RECORD_PERSISTED,
            id,
            report_id = %record.report_id,
            store = %self.path.display()
        );
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<StoredReport>, StoreError> {
        let mut conn = ConnectionManager::open(&self.path).await?;

        let result = async {
            SchemaManager::ensure_tables(&mut conn).await?;
            CritiqueQueries::list(&mut conn).await
        }
        .await;

        ConnectionManager::close(conn).await;

        let reports = result?;
        debug!(event = events::RECORD_LISTED, count = reports.len());
        Ok(reports)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = ConnectionManager::open(&self.path).await?;
        let result = sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(StoreError::from);
        ConnectionManager::close(conn).await;
        result
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
