//! SQLite数据库表结构定义

use sqlx::SqliteConnection;

use crate::db::traits::StoreError;

pub struct SchemaManager;

impl SchemaManager {
    /// 创建评语表及索引（幂等）
    pub async fn ensure_tables(conn: &mut SqliteConnection) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS critiques (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                composition TEXT NOT NULL,
                brightness TEXT NOT NULL,
                sharpness TEXT NOT NULL,
                critique TEXT NOT NULL,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::Schema(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_critiques_timestamp ON critiques(timestamp)")
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::Schema(e.to_string()))?;

        Ok(())
    }
}
