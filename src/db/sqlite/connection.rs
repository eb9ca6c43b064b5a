//! SQLite连接管理
//! 每次操作打开独立连接，操作结束即关闭

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::db::traits::StoreError;

/// 跨进程写入依赖 SQLite 自身的文件锁
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ConnectionManager;

impl ConnectionManager {
    /// 打开连接；数据库文件及其目录不存在时自动创建
    pub async fn open(db_path: &Path) -> Result<SqliteConnection, StoreError> {
        let connect_error = |message: String| StoreError::Connect {
            path: db_path.display().to_string(),
            message,
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| connect_error(e.to_string()))?;
                info!("Created record store directory: {}", parent.display());
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .busy_timeout(BUSY_TIMEOUT);

        let conn = options
            .connect()
            .await
            .map_err(|e| connect_error(e.to_string()))?;
        debug!("Opened SQLite connection: {}", db_path.display());
        Ok(conn)
    }

    /// 关闭连接；关闭失败只记录日志
    pub async fn close(conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            debug!("Closing SQLite connection failed: {}", e);
        }
    }
}
