//! 构图评估：灰度质心相对画面中心的偏移

use crate::photo::Photo;
use serde::{Deserialize, Serialize};

/// 横纵两个方向的归一化偏移都小于该值时视为居中
pub const CENTER_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Centered,
    OffCenter,
    /// 零质量（全黑）图像
    Undetermined,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Centered => "centered",
            Placement::OffCenter => "off-center",
            Placement::Undetermined => "cannot analyze",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
    /// |cx - w/2| / w
    pub dx: f64,
    /// |cy - h/2| / h
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub placement: Placement,
    pub centroid: Option<Centroid>,
}

impl Composition {
    pub fn label(&self) -> &'static str {
        self.placement.as_str()
    }

    pub fn message(&self) -> String {
        match self.placement {
            Placement::Centered => {
                "The subject sits near the center, giving a stable composition.".to_string()
            }
            Placement::OffCenter => {
                "The subject is off-center, suggesting motion or a dynamic balance.".to_string()
            }
            Placement::Undetermined => "The composition could not be analyzed.".to_string(),
        }
    }
}

pub fn evaluate_composition(photo: &Photo) -> Composition {
    let luma = photo.luma();
    let (width, height) = luma.dimensions();

    let mut m00: u128 = 0;
    let mut m10: u128 = 0;
    let mut m01: u128 = 0;
    for (x, y, pixel) in luma.enumerate_pixels() {
        let intensity = pixel.0[0] as u128;
        m00 += intensity;
        m10 += x as u128 * intensity;
        m01 += y as u128 * intensity;
    }

    if m00 == 0 {
        return Composition {
            placement: Placement::Undetermined,
            centroid: None,
        };
    }

    let (w, h) = (width as f64, height as f64);
    let cx = m10 as f64 / m00 as f64;
    let cy = m01 as f64 / m00 as f64;
    let dx = (cx - w / 2.0).abs() / w;
    let dy = (cy - h / 2.0).abs() / h;

    let placement = if dx < CENTER_TOLERANCE && dy < CENTER_TOLERANCE {
        Placement::Centered
    } else {
        Placement::OffCenter
    };

    Composition {
        placement,
        centroid: Some(Centroid { x: cx, y: cy, dx, dy }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disk(size: u32, cx: f64, cy: f64, radius: f64) -> Photo {
        let data = (0..size * size)
            .map(|i| {
                let (x, y) = ((i % size) as f64, (i / size) as f64);
                if (x - cx).powi(2) + (y - cy).powi(2) <= radius * radius {
                    255
                } else {
                    0
                }
            })
            .collect();
        Photo::from_raw(size, size, 1, data).unwrap()
    }

    #[test]
    fn black_image_cannot_be_analyzed() {
        let photo = Photo::from_raw(10, 10, 1, vec![0; 100]).unwrap();
        let result = evaluate_composition(&photo);
        assert_eq!(result.label(), "cannot analyze");
        assert!(result.centroid.is_none());
    }

    #[test]
    fn centered_disk_is_centered() {
        let result = evaluate_composition(&disk(100, 50.0, 50.0, 15.0));
        assert_eq!(result.placement, Placement::Centered);
        let centroid = result.centroid.unwrap();
        assert!((centroid.x - 50.0).abs() < 1e-9);
        assert!((centroid.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn corner_disk_is_off_center() {
        let result = evaluate_composition(&disk(100, 10.0, 10.0, 8.0));
        assert_eq!(result.label(), "off-center");
        assert!(result.centroid.unwrap().dx > CENTER_TOLERANCE);
    }

    #[test]
    fn small_white_image_uses_fractional_centroid() {
        let photo = Photo::from_raw(8, 8, 3, vec![255; 8 * 8 * 3]).unwrap();
        let result = evaluate_composition(&photo);
        let centroid = result.centroid.unwrap();
        assert!((centroid.x - 3.5).abs() < 1e-9);
        assert!((centroid.dx - 0.0625).abs() < 1e-9);
        assert_eq!(result.placement, Placement::Centered);
    }

    #[test]
    fn offset_along_one_axis_is_enough() {
        // 竖直方向居中、水平方向偏右
        let result = evaluate_composition(&disk(100, 80.0, 50.0, 6.0));
        assert_eq!(result.placement, Placement::OffCenter);
        assert!(result.centroid.unwrap().dy < CENTER_TOLERANCE);
    }
}
