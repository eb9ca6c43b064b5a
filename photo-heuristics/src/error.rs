use thiserror::Error;

/// 图像输入与编码错误
#[derive(Debug, Error)]
pub enum HeuristicsError {
    #[error("image data is empty")]
    EmptyInput,

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("buffer length {actual} does not match {expected} ({width}x{height}x{channels})")]
    BufferLength {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),

    #[error("failed to encode embedded image: {0}")]
    Encode(String),
}

impl HeuristicsError {
    /// 是否属于调用方输入问题（解码前/解码中被拒绝）
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, HeuristicsError::Encode(_))
    }
}
