use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub mod config;
pub mod critique;
pub mod http_client;
pub mod log;
pub mod logging;
pub mod middleware;
pub mod report;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebResult {
    pub success: bool,
    #[serde(rename = "errorCode")]
    pub code: u32,
    #[serde(rename = "errorMsg")]
    pub msg: String,
    pub data: Value,
}

impl WebResult {
    pub fn ok(data: impl Serialize) -> Self {
        Self {
            success: true,
            code: 200,
            msg: "".to_string(),
            data: json!(data),
        }
    }

    pub fn err_custom(msg: impl ToString) -> Self {
        Self {
            success: false,
            code: 500,
            msg: msg.to_string(),
            data: Default::default(),
        }
    }

    pub fn err_with_code(code: u32, msg: impl ToString) -> Self {
        Self {
            success: false,
            code,
            msg: msg.to_string(),
            data: Default::default(),
        }
    }

    /// 失败响应，附带部分结果或错误细节
    pub fn err_with_data(code: u32, msg: impl ToString, data: impl Serialize) -> Self {
        Self {
            success: false,
            code,
            msg: msg.to_string(),
            data: json!(data),
        }
    }
}

pub trait IntoJson {
    fn into_json(self) -> Json<WebResult>;
}

impl IntoJson for anyhow::Result<WebResult> {
    fn into_json(self) -> Json<WebResult> {
        self.unwrap_or_else(WebResult::err_custom).into_json()
    }
}

impl IntoJson for WebResult {
    fn into_json(self) -> Json<WebResult> {
        Json(self)
    }
}
