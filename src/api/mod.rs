mod critique;
mod health;
mod records;
mod reports;
mod utils;

pub use critique::{CritiqueResponse, HeuristicView, HeuristicsView};

use crate::util::middleware;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

/// 创建CORS配置
///
/// 未配置时只允许本机访问当前端口
fn create_cors_layer(app_state: &AppState) -> CorsLayer {
    let port = app_state.config.get_port();
    let allowed_origins = app_state
        .config
        .server
        .cors_allowed_origins
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("http://localhost:{port},http://127.0.0.1:{port}"));

    info!("[global] CORS配置 - 允许的源: {}", allowed_origins);

    CorsLayer::new()
        .allow_origin(
            allowed_origins
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|s| match s.trim().parse() {
                    Ok(origin) => Some(origin),
                    Err(e) => {
                        warn!("无效的CORS源: {} - {}", s, e);
                        None
                    }
                })
                .collect::<Vec<_>>(),
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .expose_headers([axum::http::HeaderName::from_static("x-request-id")])
}

pub fn routes(app_state: AppState) -> Router {
    let body_limit = app_state.config.max_upload_bytes();
    let timeout = Duration::from_secs(app_state.config.server.request_timeout_secs.max(1));
    let cors = create_cors_layer(&app_state);

    let api_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/critiques", post(critique::create_critique))
        .route(
            "/api/records",
            get(records::list_records).post(records::save_record),
        )
        .route("/api/reports", post(reports::export_report))
        .route("/api/reports/text", post(reports::export_text_report))
        .route("/api/reports/:file", get(reports::download_report));

    api_routes
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(from_fn(middleware::request_logging_middleware))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteReportStore;
    use crate::pipeline::{CritiquePipeline, PipelineSettings};
    use crate::util::config::Config;
    use crate::util::critique::fakes::StaticCritique;
    use crate::util::report::ReportExporter;
    use image::{ImageFormat, Rgb, RgbImage};
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    const BOUNDARY: &str = "critic-test-boundary";

    async fn spawn_app(dir: &TempDir) -> String {
        let pipeline = CritiquePipeline::new(
            Arc::new(StaticCritique::new("Soft light, calm mood.")),
            Arc::new(SqliteReportStore::new(dir.path().join("photo_comments.db"))),
            Arc::new(ReportExporter::new(dir.path().join("reports"))),
            PipelineSettings::default(),
        );
        let state = AppState::new(Config::default(), pipeline);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, routes(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn png(value: u8) -> Vec<u8> {
        let img = RgbImage::from_pixel(12, 12, Rgb([value, value, value]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn multipart_body(file_name: &str, bytes: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    async fn post_multipart(base: &str, body: Vec<u8>) -> reqwest::Response {
        client()
            .post(format!("{base}/api/critiques"))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_components() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(&dir).await;

        let resp = client().get(format!("{base}/api/health")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["cache-control"], "no-store");
        let request_id = resp.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(request_id).is_ok());

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["components"]["store"], "ok");
        assert_eq!(body["components"]["critique_generator"], "static");
    }

    #[tokio::test]
    async fn critique_upload_persists_and_exports() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(&dir).await;

        let body = multipart_body(
            "white.png",
            &png(255),
            &[("categories", "brightness,sharpness"), ("persist", "true"), ("export", "yes")],
        );
        let resp = post_multipart(&base, body).await;
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        let data = &body["data"];
        assert_eq!(data["critique"], "Soft light, calm mood.");
        assert_eq!(data["heuristics"]["brightness"]["label"], "bright");
        assert_eq!(data["heuristics"]["composition"]["selected"], false);
        assert_eq!(data["record"]["composition"], "");
        assert_eq!(data["persisted"]["status"], "completed");
        assert_eq!(data["exported"]["status"], "completed");

        let report_id = data["report_id"].as_str().unwrap().to_string();
        assert!(report_id.starts_with("white_"));

        let history: Value = client()
            .get(format!("{base}/api/records"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(history["data"]["total"], 1);
        assert_eq!(history["data"]["records"][0]["filename"], report_id.as_str());

        let download = client()
            .get(format!("{base}/api/reports/{report_id}_critique.html"))
            .send()
            .await
            .unwrap();
        assert_eq!(download.status(), 200);
        assert!(download.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert!(download.text().await.unwrap().contains("Soft light, calm mood."));
    }

    #[tokio::test]
    async fn undecodable_upload_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(&dir).await;

        let resp = post_multipart(&base, multipart_body("notes.png", b"not an image", &[])).await;
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn empty_category_selection_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(&dir).await;

        let resp = post_multipart(
            &base,
            multipart_body("gray.png", &png(128), &[("categories", "exposure")]),
        )
        .await;
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn record_endpoints_and_text_report() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(&dir).await;
        let client = client();

        let record = json!({
            "report_id": "harbor_20240607_080910",
            "source_name": "harbor.jpg",
            "composition": "The subject sits in the center.",
            "brightness": "",
            "sharpness": "",
            "critique": "Boats at dusk.",
            "created_at": "2024-06-07T08:09:10+09:00"
        });

        let saved: Value = client
            .post(format!("{base}/api/records"))
            .json(&record)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(saved["data"]["id"].as_i64().unwrap() > 0);

        let text = client
            .post(format!("{base}/api/reports/text"))
            .json(&record)
            .send()
            .await
            .unwrap();
        assert_eq!(text.status(), 200);
        assert!(text.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("harbor_20240607_080910_critique.txt"));
        let text = text.text().await.unwrap();
        assert!(text.contains("[Composition]"));
        assert!(!text.contains("[Brightness]"));
    }

    #[tokio::test]
    async fn download_rejects_unknown_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(&dir).await;

        for name in ["missing_critique.html", "photo_comments.db", "..%2Fphoto_comments.db"] {
            let resp = client()
                .get(format!("{base}/api/reports/{name}"))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 404, "{name}");
        }
    }

    #[tokio::test]
    async fn submitted_records_with_path_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(&dir).await;
        let client = client();

        for report_id in ["../x", "/abs/x", "a/b"] {
            let record = json!({
                "report_id": report_id,
                "source_name": "harbor.jpg",
                "composition": "",
                "brightness": "",
                "sharpness": "",
                "critique": "Boats at dusk.",
                "created_at": "2024-06-07T08:09:10+09:00"
            });
            for path in ["/api/reports", "/api/reports/text", "/api/records"] {
                let resp = client
                    .post(format!("{base}{path}"))
                    .json(&record)
                    .send()
                    .await
                    .unwrap();
                assert_eq!(resp.status(), 400, "{path} {report_id}");
                let body: Value = resp.json().await.unwrap();
                assert_eq!(body["data"]["kind"], "invalid_input");
            }
        }
        assert!(!dir.path().join("x_critique.html").exists());
        assert!(!dir.path().join("reports").exists());
    }

    #[tokio::test]
    async fn submitted_records_with_markup_image_are_rejected() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(&dir).await;

        let record = json!({
            "report_id": "harbor_20240607_080910",
            "source_name": "harbor.jpg",
            "composition": "",
            "brightness": "",
            "sharpness": "",
            "critique": "Boats at dusk.",
            "created_at": "2024-06-07T08:09:10+09:00",
            "image_base64": "\"><script>alert(1)</script>"
        });
        let resp = client()
            .post(format!("{base}/api/reports"))
            .json(&record)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }
}
