use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::http::{header, StatusCode};
use axum::response::Response;

use crate::error::CriticError;
use crate::util::config::ConfigLoader;

/// 解析表单中的布尔字段；空值视为未指定
pub fn parse_flag(name: &str, value: &str) -> Result<Option<bool>, CriticError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    ConfigLoader::parse_bool(value)
        .map(Some)
        .ok_or_else(|| CriticError::InvalidInput(format!("field `{name}` is not a boolean: {value}")))
}

pub fn multipart_error(err: MultipartError) -> CriticError {
    CriticError::InvalidInput(format!("malformed upload ({}): {}", err.status(), err.body_text()))
}

/// `filename` 提供 ASCII 回退名，`filename*` 保留原始 UTF-8 文件名
pub fn build_attachment_header(file_name: &str) -> String {
    let ascii_fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback,
        urlencoding::encode(file_name)
    )
}

pub fn attachment_response(file_name: &str, content_type: &str, body: impl Into<Body>) -> Response {
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, build_attachment_header(file_name))
        .body(body.into())
        .unwrap_or_else(|e| {
            tracing::error!("构建下载响应失败: {}", e);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::from("download failed"))
                .unwrap_or_else(|_| Response::new(Body::from("download failed")))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_header_keeps_utf8_name() {
        let header = build_attachment_header("夕焼け_20240101_000000_critique.pdf");
        assert!(header.starts_with("attachment; filename=\"___20240101_000000_critique.pdf\""));
        assert!(header.contains("filename*=UTF-8''%E5%A4%95"));
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("persist", "yes").unwrap(), Some(true));
        assert_eq!(parse_flag("persist", "0").unwrap(), Some(false));
        assert_eq!(parse_flag("persist", " ").unwrap(), None);
        assert!(parse_flag("persist", "maybe").unwrap_err().is_invalid_input());
    }
}
