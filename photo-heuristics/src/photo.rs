//! 图像缓冲区与解码边界
//!
//! `Photo` 持有解码后的 RGB8 像素以及按固定权重换算的灰度图，
//! 所有启发式评估都只借用它。

use crate::error::HeuristicsError;
use image::metadata::Orientation;
use image::{
    codecs::jpeg::JpegDecoder, DynamicImage, GrayImage, ImageDecoder, ImageFormat, Luma,
    RgbImage,
};
use std::io::Cursor;

/// 解码后的照片（只读）
#[derive(Debug, Clone)]
pub struct Photo {
    rgb: RgbImage,
    luma: GrayImage,
}

impl Photo {
    /// 从已解码的 RGB8 图像构建
    pub fn from_rgb(rgb: RgbImage) -> Result<Self, HeuristicsError> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(HeuristicsError::InvalidDimensions { width, height });
        }
        let luma = to_luma(&rgb);
        Ok(Self { rgb, luma })
    }

    /// 从原始像素缓冲区构建，支持 1 (灰度) / 3 (RGB) / 4 (RGBA) 通道
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, HeuristicsError> {
        if width == 0 || height == 0 {
            return Err(HeuristicsError::InvalidDimensions { width, height });
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(HeuristicsError::UnsupportedChannels(channels));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(HeuristicsError::BufferLength {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }

        let length_error = || HeuristicsError::BufferLength {
            width,
            height,
            channels,
            expected,
            actual: expected,
        };
        let rgb = match channels {
            1 => GrayImage::from_raw(width, height, data)
                .map(|gray| DynamicImage::ImageLuma8(gray).to_rgb8())
                .ok_or_else(length_error)?,
            3 => RgbImage::from_raw(width, height, data).ok_or_else(length_error)?,
            _ => image::RgbaImage::from_raw(width, height, data)
                .map(|rgba| DynamicImage::ImageRgba8(rgba).to_rgb8())
                .ok_or_else(length_error)?,
        };

        Self::from_rgb(rgb)
    }

    /// 解码上传的图片字节（仅 JPEG / PNG），并按 EXIF 方向旋正
    pub fn decode(bytes: &[u8]) -> Result<Self, HeuristicsError> {
        if bytes.is_empty() {
            return Err(HeuristicsError::EmptyInput);
        }

        let format = image::guess_format(bytes)
            .map_err(|_| HeuristicsError::UnsupportedFormat("unknown".to_string()))?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(HeuristicsError::UnsupportedFormat(format!("{:?}", format)));
        }

        let mut image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| HeuristicsError::Decode(e.to_string()))?;

        if let Some(orientation) = read_orientation(bytes, format) {
            tracing::debug!(?orientation, "applying EXIF orientation");
            image.apply_orientation(orientation);
        }

        Self::from_rgb(image.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// 灰度视图
    pub fn luma(&self) -> &GrayImage {
        &self.luma
    }
}

/// BT.601 定点灰度换算，与 14 位定点实现逐像素一致
pub fn luma_value(r: u8, g: u8, b: u8) -> u8 {
    let y = 4899 * r as u32 + 9617 * g as u32 + 1868 * b as u32 + 8192;
    (y >> 14) as u8
}

fn to_luma(rgb: &RgbImage) -> GrayImage {
    let mut luma = GrayImage::new(rgb.width(), rgb.height());
    for (dst, src) in luma.pixels_mut().zip(rgb.pixels()) {
        let [r, g, b] = src.0;
        *dst = Luma([luma_value(r, g, b)]);
    }
    luma
}

fn read_orientation(bytes: &[u8], format: ImageFormat) -> Option<Orientation> {
    match format {
        ImageFormat::Jpeg => {
            let cursor = Cursor::new(bytes);
            let mut decoder = JpegDecoder::new(cursor).ok()?;
            decoder
                .orientation()
                .ok()
                .filter(|orientation| *orientation != Orientation::NoTransforms)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn luma_weights_cover_full_range() {
        assert_eq!(luma_value(0, 0, 0), 0);
        assert_eq!(luma_value(255, 255, 255), 255);
        assert_eq!(luma_value(255, 0, 0), 76);
        assert_eq!(luma_value(0, 255, 0), 150);
        assert_eq!(luma_value(0, 0, 255), 29);
    }

    #[test]
    fn rejects_empty_bytes() {
        assert!(matches!(Photo::decode(&[]), Err(HeuristicsError::EmptyInput)));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = Photo::decode(b"definitely not an image").unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn rejects_unsupported_format() {
        let mut cursor = Cursor::new(Vec::new());
        RgbImage::new(4, 4)
            .write_to(&mut cursor, ImageFormat::Bmp)
            .unwrap();
        let err = Photo::decode(&cursor.into_inner()).unwrap_err();
        assert!(matches!(err, HeuristicsError::UnsupportedFormat(_)));
    }

    #[test]
    fn decodes_png() {
        let image = RgbImage::from_pixel(6, 3, image::Rgb([10, 20, 30]));
        let photo = Photo::decode(&png_bytes(&image)).unwrap();
        assert_eq!((photo.width(), photo.height()), (6, 3));
        assert_eq!(photo.rgb().get_pixel(0, 0).0, [10, 20, 30]);
    }

    /// 在 SOI 之后插入只含 Orientation 标签的 APP1 段
    fn jpeg_with_orientation(image: &RgbImage, orientation: u16) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, ImageFormat::Jpeg).unwrap();
        let jpeg = cursor.into_inner();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let mut exif = b"Exif\0\0".to_vec();
        exif.extend_from_slice(b"MM\0\x2A\0\0\0\x08");
        exif.extend_from_slice(&1u16.to_be_bytes());
        exif.extend_from_slice(&0x0112u16.to_be_bytes());
        exif.extend_from_slice(&3u16.to_be_bytes());
        exif.extend_from_slice(&1u32.to_be_bytes());
        exif.extend_from_slice(&orientation.to_be_bytes());
        exif.extend_from_slice(&[0, 0]);
        exif.extend_from_slice(&0u32.to_be_bytes());

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((exif.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&exif);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn jpeg_exif_orientation_is_applied() {
        let image = RgbImage::from_pixel(16, 8, image::Rgb([120, 120, 120]));

        let rotated = Photo::decode(&jpeg_with_orientation(&image, 6)).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (8, 16));

        let upright = Photo::decode(&jpeg_with_orientation(&image, 1)).unwrap();
        assert_eq!((upright.width(), upright.height()), (16, 8));
    }

    #[test]
    fn raw_buffer_is_validated() {
        assert!(matches!(
            Photo::from_raw(0, 4, 3, vec![]),
            Err(HeuristicsError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Photo::from_raw(2, 2, 2, vec![0; 8]),
            Err(HeuristicsError::UnsupportedChannels(2))
        ));
        assert!(matches!(
            Photo::from_raw(2, 2, 3, vec![0; 11]),
            Err(HeuristicsError::BufferLength { expected: 12, actual: 11, .. })
        ));
    }

    #[test]
    fn gray_and_rgba_buffers_share_luma() {
        let gray = Photo::from_raw(2, 1, 1, vec![17, 200]).unwrap();
        assert_eq!(gray.luma().as_raw(), &vec![17, 200]);

        let rgba = Photo::from_raw(1, 1, 4, vec![255, 255, 255, 0]).unwrap();
        assert_eq!(rgba.luma().get_pixel(0, 0).0, [255]);
    }
}
