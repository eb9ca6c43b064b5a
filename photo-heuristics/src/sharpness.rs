//! 清晰度评估：拉普拉斯响应方差
//!
//! 3x3 核 `[[0,1,0],[1,-4,1],[0,1,0]]`，边界按 reflect-101 处理，
//! 方差为总体方差（除以 N）。

use crate::photo::Photo;
use serde::{Deserialize, Serialize};

/// 方差低于该值判为模糊
pub const SOFT_VARIANCE_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharpnessLevel {
    Soft,
    Sharp,
}

impl SharpnessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharpnessLevel::Soft => "soft",
            SharpnessLevel::Sharp => "sharp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sharpness {
    pub level: SharpnessLevel,
    pub variance: f64,
}

impl Sharpness {
    pub fn label(&self) -> &'static str {
        self.level.as_str()
    }

    /// 两位小数
    pub fn variance_display(&self) -> String {
        format!("{:.2}", self.variance)
    }

    pub fn message(&self) -> String {
        match self.level {
            SharpnessLevel::Soft => format!(
                "Sharpness is lacking; the photo may be out of focus (variance: {})",
                self.variance_display()
            ),
            SharpnessLevel::Sharp => format!(
                "The photo looks sharp (variance: {})",
                self.variance_display()
            ),
        }
    }
}

pub fn classify_sharpness(variance: f64) -> SharpnessLevel {
    if variance < SOFT_VARIANCE_THRESHOLD {
        SharpnessLevel::Soft
    } else {
        SharpnessLevel::Sharp
    }
}

pub fn evaluate_sharpness(photo: &Photo) -> Sharpness {
    let variance = laplacian_variance(photo);
    Sharpness {
        level: classify_sharpness(variance),
        variance,
    }
}

/// 拉普拉斯响应的总体方差；整数累加，最后一步才转浮点
pub fn laplacian_variance(photo: &Photo) -> f64 {
    let luma = photo.luma();
    let (width, height) = (luma.width() as i64, luma.height() as i64);
    let pixels = luma.as_raw();
    let at = |x: i64, y: i64| -> i64 {
        let xi = reflect_101(x, width);
        let yi = reflect_101(y, height);
        pixels[yi * width as usize + xi] as i64
    };

    let mut sum: i128 = 0;
    let mut sum_sq: i128 = 0;
    for y in 0..height {
        for x in 0..width {
            let response =
                at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4 * at(x, y);
            sum += response as i128;
            sum_sq += (response * response) as i128;
        }
    }

    let n = (width * height) as i128;
    let numerator = n * sum_sq - sum * sum;
    numerator as f64 / (n * n) as f64
}

// 核半径为 1，单次反射即可
fn reflect_101(index: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let reflected = if index < 0 {
        -index
    } else if index >= len {
        2 * len - 2 - index
    } else {
        index
    };
    reflected as usize
}
