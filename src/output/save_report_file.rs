// 该文件是 Brainscan （脑影） 项目的一部分。
// src/output/save_report_file.rs - 保存报告文件
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

use std::{
  io::Write,
  path::{Path, PathBuf},
};

use image::{ImageFormat, RgbImage};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::output::report::{ReportDocument, ReportError};

#[derive(Error, Debug)]
pub enum SaveReportFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("报告写入错误: {0}")]
  ReportError(#[from] ReportError),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("无法持久化临时文件: {0}")]
  PersistError(#[from] tempfile::PersistError),
}

/// 输出路径为目录（已存在或以分隔符结尾）时追加报告文件名
pub fn resolve_report_path(output: &Path, file_name: &str) -> PathBuf {
  let is_dir_hint = output
    .as_os_str()
    .to_string_lossy()
    .ends_with(std::path::MAIN_SEPARATOR)
    || output.as_os_str().to_string_lossy().ends_with('/');
  if output.is_dir() || is_dir_hint || output.as_os_str().is_empty() {
    output.join(file_name)
  } else {
    output.to_path_buf()
  }
}

// 先写入同目录下的临时文件再重命名，失败时临时文件随 drop 删除，
// 目标位置不会出现写了一半的文件
fn write_atomic<F>(path: &Path, write: F) -> Result<(), SaveReportFileError>
where
  F: FnOnce(&mut NamedTempFile) -> Result<(), SaveReportFileError>,
{
  let parent = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => {
      std::fs::create_dir_all(parent)?;
      parent.to_path_buf()
    }
    _ => PathBuf::from("."),
  };

  let mut staging = NamedTempFile::new_in(&parent)?;
  debug!("临时文件: {}", staging.path().display());
  write(&mut staging)?;
  staging.as_file_mut().sync_all()?;
  staging.persist(path)?;
  Ok(())
}

pub fn save_report(
  output: &Path,
  file_name: &str,
  document: &ReportDocument,
) -> Result<PathBuf, SaveReportFileError> {
  let path = resolve_report_path(output, file_name);
  write_atomic(&path, |file| Ok(document.write_to(file)?))?;
  info!("保存报告到文件: {}", path.display());
  Ok(path)
}

pub fn save_annotated_image(path: &Path, image: &RgbImage) -> Result<(), SaveReportFileError> {
  let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
  write_atomic(path, |file| {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, format)?;
    file.write_all(buffer.get_ref())?;
    Ok(())
  })?;
  info!("保存标注图像到文件: {}", path.display());
  Ok(())
}

/// 将原始推理结果保存在报告旁边，扩展名为 json
pub fn save_raw_json(
  report_path: &Path,
  raw: &serde_json::Value,
) -> Result<PathBuf, SaveReportFileError> {
  let path = report_path.with_extension("json");
  let text = serde_json::to_string_pretty(raw)?;
  write_atomic(&path, |file| Ok(file.write_all(text.as_bytes())?))?;
  info!("保存推理结果到文件: {}", path.display());
  Ok(path)
}
