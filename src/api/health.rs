use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::build_info;
use crate::util::report::PdfGenerator;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    pub timestamp: String,
    pub components: ComponentStatus,
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub store: String,
    pub store_location: String,
    pub critique_generator: String,
    pub api_key_configured: bool,
    pub pdf_enabled: bool,
    pub pdf_tool: String,
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let pipeline = &state.pipeline;

    let store = match pipeline.store().health_check().await {
        Ok(()) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    };

    let pdf_enabled = pipeline.exporter().pdf_enabled();
    let pdf_tool = if pdf_enabled {
        tokio::task::spawn_blocking(PdfGenerator::check_pdf_tools)
            .await
            .map_err(|e| e.to_string())
            .and_then(|r| r.map_err(|e| e.to_string()))
            .unwrap_or_else(|e| format!("unavailable: {e}"))
    } else {
        "disabled".to_string()
    };

    let status = HealthStatus {
        status: if store == "ok" { "healthy" } else { "degraded" }.to_string(),
        version: build_info::summary(),
        uptime: state.uptime_secs(),
        timestamp: Utc::now().to_rfc3339(),
        components: ComponentStatus {
            store,
            store_location: pipeline.store().location(),
            critique_generator: pipeline.generator_name().to_string(),
            api_key_configured: state.config.critique.has_api_key(),
            pdf_enabled,
            pdf_tool,
        },
    };

    let mut resp = Json(status).into_response();
    resp.headers_mut().insert(
        axum::http::header::CACHE_CONTROL,
        axum::http::HeaderValue::from_static("no-store"),
    );
    resp
}
