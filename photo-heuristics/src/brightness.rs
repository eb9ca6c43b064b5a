//! 亮度评估：灰度均值与固定阈值比较

use crate::photo::Photo;
use serde::{Deserialize, Serialize};

/// 均值严格大于该值判为偏亮
pub const BRIGHT_THRESHOLD: f64 = 180.0;
/// 均值严格小于该值判为偏暗
pub const DARK_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrightnessLevel {
    Bright,
    Dark,
    Balanced,
}

impl BrightnessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrightnessLevel::Bright => "bright",
            BrightnessLevel::Dark => "dark",
            BrightnessLevel::Balanced => "balanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brightness {
    pub level: BrightnessLevel,
    /// 灰度均值 [0, 255]
    pub mean: f64,
}

impl Brightness {
    pub fn label(&self) -> &'static str {
        self.level.as_str()
    }

    pub fn message(&self) -> String {
        match self.level {
            BrightnessLevel::Bright => "The photo is bright overall.".to_string(),
            BrightnessLevel::Dark => "The photo is dark overall.".to_string(),
            BrightnessLevel::Balanced => "The brightness is well balanced.".to_string(),
        }
    }
}

pub fn classify_brightness(mean: f64) -> BrightnessLevel {
    if mean > BRIGHT_THRESHOLD {
        BrightnessLevel::Bright
    } else if mean < DARK_THRESHOLD {
        BrightnessLevel::Dark
    } else {
        BrightnessLevel::Balanced
    }
}

pub fn evaluate_brightness(photo: &Photo) -> Brightness {
    let luma = photo.luma();
    let total: u64 = luma.as_raw().iter().map(|&v| v as u64).sum();
    let mean = total as f64 / luma.as_raw().len() as f64;

    Brightness {
        level: classify_brightness(mean),
        mean,
    }
}
