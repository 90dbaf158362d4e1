//! # 解码校验流水线模块
//!
//! ## 设计思路
//!
//! 分类器只在“字节确实能解码成图片”时才产出图片条目，否则回落到下一条规则。
//! 因此这里先读 header 尺寸做像素上限检查，再完整解码一次确认数据有效。
//!
//! 剪贴板原始 RGBA 数据则反向编码为 PNG，使所有图片条目共享同一种表示。

use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use std::io::Cursor;

use super::source::{ImagePayload, RawImageData};
use super::{ImageConfig, ImageError};

/// 将原始字节校验解码为 `ImagePayload`。
pub(crate) fn decode_and_validate(
    raw: RawImageData,
    config: &ImageConfig,
) -> Result<ImagePayload, ImageError> {
    let format = image::guess_format(&raw.bytes)
        .map_err(|e| ImageError::InvalidFormat(format!("不支持的图片格式：{}", e)))?;

    let (header_width, header_height) = inspect_dimensions(&raw.bytes)?;
    validate_pixel_limits(config, header_width, header_height)?;

    let decoded = image::load_from_memory_with_format(&raw.bytes, format)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;
    let (width, height) = decoded.dimensions();

    log::debug!(
        "✅ 图片校验通过 - 来源: {} 格式: {:?} 尺寸: {}x{}",
        raw.source_hint,
        format,
        width,
        height
    );

    Ok(ImagePayload {
        width,
        height,
        format: format_name(format),
        bytes: raw.bytes,
    })
}

/// 将剪贴板中的 RGBA 像素编码为 PNG。
pub fn encode_rgba_as_png(width: u32, height: u32, rgba: Vec<u8>) -> Result<ImagePayload, ImageError> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| ImageError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

    if rgba.len() != expected_len {
        return Err(ImageError::Decode(format!(
            "RGBA 数据长度异常：期望 {} 实际 {}",
            expected_len,
            rgba.len()
        )));
    }

    let buffer = RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| ImageError::Decode("创建图像缓冲区失败".to_string()))?;

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ImageError::Decode(format!("PNG 编码失败：{}", e)))?;

    Ok(ImagePayload {
        width,
        height,
        format: "png".to_string(),
        bytes,
    })
}

/// 将编码字节还原为 RGBA，供写回剪贴板使用。
pub fn decode_to_rgba(payload: &ImagePayload) -> Result<(u32, u32, Vec<u8>), ImageError> {
    let decoded = image::load_from_memory(&payload.bytes)
        .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((width, height, rgba.into_raw()))
}

fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| ImageError::Decode(format!("读取图片尺寸失败：{}", e)))
}

fn validate_pixel_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::InvalidFormat("图片尺寸为 0".to_string()));
    }

    let pixels = u64::from(width) * u64::from(height);
    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过多：{}x{}（上限 {} 像素）",
            width, height, config.max_decoded_pixels
        )));
    }
    Ok(())
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_ascii_lowercase()
}
