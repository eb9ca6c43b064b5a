// 评语记录库

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteReportStore;
pub use traits::{ReportStore, StoreError, StoredReport};
