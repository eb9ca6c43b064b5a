//! 上传照片并执行评估流水线

use axum::extract::{Multipart, State};
use axum::Json;
use photo_heuristics::{Centroid, HeuristicReport};
use serde::Serialize;
use tracing::{info, warn};

use super::utils::{multipart_error, parse_flag};
use crate::error::{CriticError, CriticResult};
use crate::model::evaluation::{CategorySelection, EvaluationCategory};
use crate::model::report::ReportRecord;
use crate::pipeline::{CritiqueRequest, ImageInfo, PipelineOutcome, StageOutcome};
use crate::util::logging::standards::events;
use crate::util::report::ExportedReport;
use crate::util::WebResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HeuristicView {
    pub selected: bool,
    pub label: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Centroid>,
}

#[derive(Debug, Serialize)]
pub struct HeuristicsView {
    pub composition: HeuristicView,
    pub brightness: HeuristicView,
    pub sharpness: HeuristicView,
}

impl HeuristicsView {
    fn new(report: &HeuristicReport, selection: &CategorySelection) -> Self {
        Self {
            composition: HeuristicView {
                selected: selection.contains(EvaluationCategory::Composition),
                label: report.composition.label(),
                message: report.composition.message(),
                mean: None,
                variance: None,
                centroid: report.composition.centroid,
            },
            brightness: HeuristicView {
                selected: selection.contains(EvaluationCategory::Brightness),
                label: report.brightness.label(),
                message: report.brightness.message(),
                mean: Some(report.brightness.mean),
                variance: None,
                centroid: None,
            },
            sharpness: HeuristicView {
                selected: selection.contains(EvaluationCategory::Sharpness),
                label: report.sharpness.label(),
                message: report.sharpness.message(),
                mean: None,
                variance: Some(report.sharpness.variance),
                centroid: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CritiqueResponse {
    pub report_id: String,
    pub image: ImageInfo,
    pub categories: CategorySelection,
    pub heuristics: HeuristicsView,
    pub critique: Option<String>,
    pub critique_error: Option<String>,
    pub record: ReportRecord,
    pub persisted: StageOutcome<i64>,
    pub exported: StageOutcome<ExportedReport>,
    pub text_exported: StageOutcome<std::path::PathBuf>,
}

impl From<PipelineOutcome> for CritiqueResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        Self {
            report_id: outcome.record.report_id.clone(),
            image: outcome.image,
            heuristics: HeuristicsView::new(&outcome.heuristics, &outcome.categories),
            critique: outcome.critique().map(str::to_string),
            categories: outcome.categories,
            critique_error: outcome.critique_error,
            record: outcome.record,
            persisted: outcome.persisted,
            exported: outcome.exported,
            text_exported: outcome.text_exported,
        }
    }
}

/// 读取 multipart 表单：`file` 必填，其余字段可选
async fn read_request(mut multipart: Multipart) -> CriticResult<CritiqueRequest> {
    let mut request = CritiqueRequest::default();
    let mut file_seen = false;
    let mut categories: Vec<EvaluationCategory> = Vec::new();
    let mut categories_seen = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                request.source_name = field.file_name().unwrap_or("upload").to_string();
                request.bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                file_seen = true;
            }
            "categories" => {
                let text = field.text().await.map_err(multipart_error)?;
                categories_seen = true;
                for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    categories.push(item.parse()?);
                }
            }
            "persist" | "export" | "text_export" => {
                let text = field.text().await.map_err(multipart_error)?;
                let flag = parse_flag(&name, &text)?;
                match name.as_str() {
                    "persist" => request.persist = flag,
                    "export" => request.export = flag,
                    _ => request.text_export = flag,
                }
            }
            other => warn!(event = events::UPLOAD_RECEIVED, field = other, "忽略未知表单字段"),
        }
    }

    if !file_seen {
        return Err(CriticError::InvalidInput(
            "multipart field `file` is required".to_string(),
        ));
    }
    if categories_seen {
        request.categories = Some(CategorySelection::new(categories)?);
    }

    info!(
        event = events::UPLOAD_RECEIVED,
        source = %request.source_name,
        bytes = request.bytes.len()
    );
    Ok(request)
}

/// POST /api/critiques
pub async fn create_critique(
    State(state): State<AppState>,
    multipart: Multipart,
) -> CriticResult<Json<WebResult>> {
    let request = read_request(multipart).await?;
    let outcome = state.pipeline.run(request).await?;
    Ok(Json(WebResult::ok(CritiqueResponse::from(outcome))))
}
