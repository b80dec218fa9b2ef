// 该文件是 Brainscan （脑影） 项目的一部分。
// src/input.rs - 图像输入
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("不支持的图像格式: {0}")]
  UnsupportedFormat(String),
  #[error("图像为空")]
  EmptyImage,
}

/// 已解码并统一为 3 通道 RGB 的上传图像
#[derive(Debug, Clone)]
pub struct ImageFileInput {
  name: String,
  image: RgbImage,
}

impl ImageFileInput {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, InputError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());
    Self::from_bytes(name, &bytes)
  }

  /// 只接受 JPEG/PNG，解码后去掉 alpha 通道并将灰度图扩展为 RGB
  pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, InputError> {
    let name = name.into();
    let format = image::guess_format(bytes).inspect_err(|e| error!("无法识别图像 {}: {}", name, e))?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
      error!("不支持的图像格式 {:?}: {}", format, name);
      return Err(InputError::UnsupportedFormat(format!("{:?}", format)));
    }

    let image = image::load_from_memory_with_format(bytes, format)?.into_rgb8();
    if image.width() == 0 || image.height() == 0 {
      return Err(InputError::EmptyImage);
    }
    debug!("图像 {} 解码完成: {}x{}", name, image.width(), image.height());

    Ok(Self { name, image })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{DynamicImage, GrayAlphaImage, LumaA, Rgba, RgbaImage};
  use std::io::Cursor;

  fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
  }

  #[test]
  fn rgba_png_is_flattened_to_rgb() {
    let rgba = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 128]));
    let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
    let input = ImageFileInput::from_bytes("scan.png", &bytes).unwrap();
    assert_eq!(input.image().dimensions(), (3, 2));
    assert_eq!(input.image().get_pixel(0, 0).0, [10, 20, 30]);
  }

  #[test]
  fn grayscale_is_expanded() {
    let gray = GrayAlphaImage::from_pixel(2, 2, LumaA([77, 255]));
    let bytes = encode(DynamicImage::ImageLumaA8(gray), ImageFormat::Png);
    let input = ImageFileInput::from_bytes("gray.png", &bytes).unwrap();
    assert_eq!(input.image().get_pixel(1, 1).0, [77, 77, 77]);
  }

  #[test]
  fn garbage_is_rejected() {
    let result = ImageFileInput::from_bytes("broken.jpg", b"definitely not an image");
    assert!(matches!(result, Err(InputError::ImageLoadError(_))));
  }

  #[test]
  fn truncated_png_is_rejected() {
    let bytes = encode(
      DynamicImage::ImageRgb8(RgbImage::new(16, 16)),
      ImageFormat::Png,
    );
    let result = ImageFileInput::from_bytes("cut.png", &bytes[..bytes.len() / 2]);
    assert!(matches!(result, Err(InputError::ImageLoadError(_))));
  }

  #[test]
  fn unsupported_format_is_rejected() {
    // 仅包含 GIF 文件头即可被识别
    let result = ImageFileInput::from_bytes("anim.gif", b"GIF89a\x01\x00\x01\x00");
    assert!(matches!(result, Err(InputError::UnsupportedFormat(_))));
  }
}
