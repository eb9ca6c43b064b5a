//! Centralised logging metadata (event names, shared keys, etc.).

/// Canonical event names used across the service.
pub mod events {
    /// HTTP request lifecycle.
    pub const REQUEST_START: &str = "request.start";
    pub const REQUEST_COMPLETE: &str = "request.complete";
    pub const REQUEST_ERROR: &str = "request.error";
    pub const REQUEST_SLOW: &str = "request.slow";

    /// 上传与解码
    pub const UPLOAD_RECEIVED: &str = "upload.received";
    pub const UPLOAD_REJECTED: &str = "upload.rejected";

    /// Heuristic evaluation.
    pub const HEURISTICS_COMPLETE: &str = "heuristics.complete";

    /// 评语生成
    pub const CRITIQUE_REQUEST: &str = "critique.request";
    pub const CRITIQUE_COMPLETE: &str = "critique.complete";
    pub const CRITIQUE_ERROR: &str = "critique.error";

    /// Record store.
    pub const RECORD_PERSISTED: &str = "record.persisted";
    pub const RECORD_LISTED: &str = "record.listed";
    pub const RECORD_ERROR: &str = "record.error";

    /// 报告导出
    pub const EXPORT_START: &str = "export.start";
    pub const EXPORT_COMPLETE: &str = "export.complete";
    pub const EXPORT_ERROR: &str = "export.error";

    /// Processing pipeline.
    pub const PIPELINE_START: &str = "pipeline.start";
    pub const PIPELINE_STAGE: &str = "pipeline.stage";
    pub const PIPELINE_COMPLETE: &str = "pipeline.complete";
    pub const PIPELINE_ERROR: &str = "pipeline.error";
}
