use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::CriticResult;
use crate::model::report::ReportRecord;
use crate::util::WebResult;
use crate::AppState;

/// POST /api/records
pub async fn save_record(
    State(state): State<AppState>,
    Json(record): Json<ReportRecord>,
) -> CriticResult<Json<WebResult>> {
    let id = state.pipeline.persist(&record).await?;
    Ok(Json(WebResult::ok(json!({ "id": id, "report_id": record.report_id }))))
}

/// GET /api/records，按时间倒序
pub async fn list_records(State(state): State<AppState>) -> CriticResult<Json<WebResult>> {
    let records = state.pipeline.history().await?;
    Ok(Json(WebResult::ok(json!({
        "total": records.len(),
        "records": records,
    }))))
}
