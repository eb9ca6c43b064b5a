use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

use super::utils::attachment_response;
use crate::error::CriticResult;
use crate::model::report::ReportRecord;
use crate::util::logging::standards::events;
use crate::util::{IntoJson, WebResult};
use crate::AppState;

/// POST /api/reports
pub async fn export_report(
    State(state): State<AppState>,
    Json(record): Json<ReportRecord>,
) -> CriticResult<Json<WebResult>> {
    let exported = state.pipeline.export(&record).await?;
    Ok(Json(WebResult::ok(exported)))
}

/// POST /api/reports/text，直接返回纯文本附件
pub async fn export_text_report(
    State(state): State<AppState>,
    Json(record): Json<ReportRecord>,
) -> CriticResult<Response> {
    record.validate()?;
    let file_name = format!("{}.txt", record.file_stem());
    let text = state.pipeline.render_text(&record);
    Ok(attachment_response(&file_name, "text/plain; charset=utf-8", text))
}

/// GET /api/reports/:file
pub async fn download_report(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Response {
    let Some(path) = state.pipeline.exporter().locate(&file_name) else {
        warn!(event = events::EXPORT_ERROR, file = %file_name, "报告文件不存在或名称非法");
        return (
            StatusCode::NOT_FOUND,
            WebResult::err_with_code(404, format!("report not found: {file_name}")).into_json(),
        )
            .into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            attachment_response(&file_name, mime.as_ref(), bytes)
        }
        Err(e) => {
            warn!(event = events::EXPORT_ERROR, file = %path.display(), error = %e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                WebResult::err_custom(format!("cannot read report: {e}")).into_json(),
            )
                .into_response()
        }
    }
}
