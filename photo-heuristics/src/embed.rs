//! 报告内嵌图片：缩放到边界框内后按 JPEG 重新编码并转为 base64

use crate::error::HeuristicsError;
use crate::photo::Photo;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use std::borrow::Cow;

pub const DEFAULT_EMBED_MAX_SIDE: u32 = 1024;
pub const DEFAULT_EMBED_QUALITY: u8 = 85;

/// 缩放后尺寸；只缩小不放大，保持宽高比
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    if max_side == 0 || (width <= max_side && height <= max_side) {
        return (width, height);
    }
    let scale = max_side as f64 / width.max(height) as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_side);
    (scaled(width), scaled(height))
}

/// 编码为 JPEG 字节
pub fn encode_jpeg(photo: &Photo, max_side: u32, quality: u8) -> Result<Vec<u8>, HeuristicsError> {
    let (width, height) = fit_within(photo.width(), photo.height(), max_side);
    let image = if (width, height) == (photo.width(), photo.height()) {
        Cow::Borrowed(photo.rgb())
    } else {
        Cow::Owned(imageops::resize(photo.rgb(), width, height, FilterType::Lanczos3))
    };

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(image.as_ref())
        .map_err(|e| HeuristicsError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// 编码为 base64 JPEG（标准字母表，无 data URI 前缀）
pub fn encode_embed(photo: &Photo, max_side: u32, quality: u8) -> Result<String, HeuristicsError> {
    let jpeg = encode_jpeg(photo, max_side, quality)?;
    tracing::debug!(bytes = jpeg.len(), max_side, quality, "encoded embed image");
    Ok(BASE64.encode(jpeg))
}
