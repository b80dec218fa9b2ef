// 该文件是 Brainscan （脑影） 项目的一部分。
// src/model/recorded.rs - 离线回放的检测结果
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

use image::RgbImage;
use thiserror::Error;
use tracing::info;

use crate::model::{DetectResult, Model};

#[derive(Error, Debug)]
pub enum RecordedModelError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 回放先前保存的推理响应，不访问网络
pub struct RecordedModel {
  raw: serde_json::Value,
}

impl RecordedModel {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RecordedModelError> {
    let path = path.as_ref();
    info!("读取推理记录: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Self::from_json_str(&text)
  }

  pub fn from_json_str(text: &str) -> Result<Self, RecordedModelError> {
    let raw: serde_json::Value = serde_json::from_str(text)?;
    // 提前校验，避免在推理阶段才暴露格式问题
    DetectResult::from_json(raw.clone())?;
    Ok(Self { raw })
  }
}

impl Model for RecordedModel {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = RecordedModelError;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(DetectResult::from_json(self.raw.clone())?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn replays_saved_response() {
    let model = RecordedModel::from_json_str(
      r#"{"predictions":[{"x":50,"y":40,"width":20,"height":10,"confidence":0.66}]}"#,
    )
    .unwrap();
    let result = model.infer(&RgbImage::new(1, 1)).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.items[0].confidence_label(), "0.66");
  }

  #[test]
  fn rejects_invalid_json() {
    assert!(matches!(
      RecordedModel::from_json_str("{ not json"),
      Err(RecordedModelError::JsonError(_))
    ));
  }
}
