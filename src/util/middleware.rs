use crate::util::log::ACCESS_TARGET;
use crate::util::logging::standards::events;
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

/// 请求编号响应头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 超过该耗时记录慢请求（评语生成通常需要数秒）
const SLOW_REQUEST_MS: u128 = 10_000;

/// 请求编号 (UUID v4)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn next_request_id() -> String {
    Uuid::new_v4().to_string()
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
}

fn extract_user_agent(headers: &HeaderMap) -> String {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

fn parse_content_length(headers: &HeaderMap) -> usize {
    headers
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0)
}

fn is_quiet_path(path: &str) -> bool {
    matches!(path, "/api/health" | "/favicon.ico")
}

// 统一请求日志中间件，写入 access 日志
pub async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let request_id = next_request_id();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_agent = extract_user_agent(request.headers());
    let client_ip = extract_client_ip(request.headers());
    let request_size = parse_content_length(request.headers());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let quiet_path = is_quiet_path(uri.path());
    if !quiet_path {
        tracing::debug!(
            target: ACCESS_TARGET,
            event = events::REQUEST_START,
            request_id = %request_id,
            method = %method,
            path = %uri.path(),
            user_agent = %user_agent,
            client_ip = client_ip.as_deref().unwrap_or("unknown")
        );
    }

    let mut response = next.run(request).await;
    let duration = start_time.elapsed();
    let status = response.status();
    let response_size = parse_content_length(response.headers());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    if status.is_server_error() {
        tracing::error!(
            target: ACCESS_TARGET,
            event = events::REQUEST_ERROR,
            request_id = %request_id,
            method = %method,
            path = %uri.path(),
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            request_bytes = request_size,
            response_bytes = response_size,
            client_ip = client_ip.as_deref().unwrap_or("unknown")
        );
    } else if status.is_client_error() {
        tracing::warn!(
            target: ACCESS_TARGET,
            event = events::REQUEST_COMPLETE,
            request_id = %request_id,
            method = %method,
            path = %uri.path(),
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            request_bytes = request_size,
            response_bytes = response_size,
            client_ip = client_ip.as_deref().unwrap_or("unknown")
        );
    } else if quiet_path {
        tracing::debug!(
            target: ACCESS_TARGET,
            event = events::REQUEST_COMPLETE,
            request_id = %request_id,
            method = %method,
            path = %uri.path(),
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64
        );
    } else {
        tracing::info!(
            target: ACCESS_TARGET,
            event = events::REQUEST_COMPLETE,
            request_id = %request_id,
            method = %method,
            path = %uri.path(),
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            request_bytes = request_size,
            response_bytes = response_size,
            user_agent = %user_agent,
            client_ip = client_ip.as_deref().unwrap_or("unknown")
        );
    }

    if !quiet_path && duration.as_millis() > SLOW_REQUEST_MS {
        tracing::warn!(
            target: ACCESS_TARGET,
            event = events::REQUEST_SLOW,
            request_id = %request_id,
            method = %method,
            path = %uri.path(),
            duration_ms = duration.as_millis() as u64,
            status = status.as_u16()
        );
    }

    response
}
