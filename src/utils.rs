// 该文件是 Brainscan （脑影） 项目的一部分。
// src/utils.rs - 通用工具函数
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

use image::{ImageError, RgbImage, codecs::jpeg::JpegEncoder};

pub const JPEG_QUALITY: u8 = 90;

/// 将 RGB 图像编码为 JPEG 字节流（仅在内存中进行）
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
  let mut buffer = Vec::new();
  JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(image)?;
  Ok(buffer)
}

// Windows 与 POSIX 文件名中的保留字符
const RESERVED_FILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 将空白、控制字符与路径保留字符替换为下划线，其余 Unicode 字符原样保留
pub fn sanitize_file_stem(name: &str) -> String {
  name
    .trim()
    .chars()
    .map(|c| {
      if c.is_whitespace() || c.is_control() || RESERVED_FILE_CHARS.contains(&c) {
        '_'
      } else {
        c
      }
    })
    .collect()
}
