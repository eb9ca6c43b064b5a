//! 照片启发式评估
//!
//! - photo: 图像缓冲区、解码边界、灰度换算
//! - brightness: 灰度均值 → 偏亮 / 偏暗 / 均衡
//! - sharpness: 拉普拉斯方差 → 模糊 / 清晰
//! - composition: 灰度质心 → 居中 / 偏移 / 无法分析
//! - embed: 报告内嵌图片编码
//!
//! 所有评估均为纯函数，只借用 `Photo`，同一输入永远得到同一结果。

pub mod brightness;
pub mod composition;
pub mod embed;
pub mod error;
pub mod photo;
pub mod sharpness;

pub use brightness::{evaluate_brightness, Brightness, BrightnessLevel};
pub use composition::{evaluate_composition, Centroid, Composition, Placement};
pub use embed::{encode_embed, DEFAULT_EMBED_MAX_SIDE, DEFAULT_EMBED_QUALITY};
pub use error::HeuristicsError;
pub use photo::Photo;
pub use sharpness::{evaluate_sharpness, Sharpness, SharpnessLevel};

use serde::{Deserialize, Serialize};

/// 三项评估结果，彼此独立
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicReport {
    pub composition: Composition,
    pub brightness: Brightness,
    pub sharpness: Sharpness,
}

pub fn evaluate(photo: &Photo) -> HeuristicReport {
    HeuristicReport {
        composition: evaluate_composition(photo),
        brightness: evaluate_brightness(photo),
        sharpness: evaluate_sharpness(photo),
    }
}
