//! 评语表读写

use chrono::{DateTime, NaiveDateTime};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::db::traits::{StoreError, StoredReport};
use crate::model::report::ReportRecord;

pub struct CritiqueQueries;

impl CritiqueQueries {
    pub async fn insert(conn: &mut SqliteConnection, record: &ReportRecord) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO critiques (filename, composition, brightness, sharpness, critique)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.report_id)
        .bind(&record.composition)
        .bind(&record.brightness)
        .bind(&record.sharpness)
        .bind(&record.critique)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<StoredReport>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, filename, composition, brightness, sharpness, critique,
                   CAST(timestamp AS TEXT) AS timestamp
            FROM critiques
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Self::row_to_report).collect()
    }

    fn row_to_report(row: SqliteRow) -> Result<StoredReport, StoreError> {
        let decode = |e: sqlx::Error| StoreError::Decode(e.to_string());
        let timestamp: String = row.try_get("timestamp").map_err(decode)?;

        Ok(StoredReport {
            id: row.try_get("id").map_err(decode)?,
            filename: row.try_get("filename").map_err(decode)?,
            composition: row.try_get("composition").map_err(decode)?,
            brightness: row.try_get("brightness").map_err(decode)?,
            sharpness: row.try_get("sharpness").map_err(decode)?,
            critique: row.try_get("critique").map_err(decode)?,
            timestamp: parse_timestamp(&timestamp)?,
        })
    }
}

/// SQLite 的 CURRENT_TIMESTAMP 为 `YYYY-MM-DD HH:MM:SS`；兼容小数秒与 RFC3339
pub(crate) fn parse_timestamp(value: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.naive_utc()))
        .map_err(|_| StoreError::Decode(format!("invalid timestamp: {value}")))
}
