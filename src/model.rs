// 该文件是 Brainscan （脑影） 项目的一部分。
// src/model.rs - 模型
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

use serde::Deserialize;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 检测器返回的单个候选区域，坐标为像素单位，(center_x, center_y) 为框中心
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
  #[serde(rename = "x")]
  pub center_x: f32,
  #[serde(rename = "y")]
  pub center_y: f32,
  pub width: f32,
  pub height: f32,
  #[serde(default)]
  pub confidence: f32,
  #[serde(default)]
  pub class: Option<String>,
}

/// 轴对齐的边界框 [left, top, right, bottom]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl BoundingBox {
  /// 宽高为正且所有坐标有限时才可绘制
  pub fn is_drawable(&self) -> bool {
    [self.left, self.top, self.right, self.bottom]
      .iter()
      .all(|v| v.is_finite())
      && self.right > self.left
      && self.bottom > self.top
  }
}

impl Detection {
  pub fn new(center_x: f32, center_y: f32, width: f32, height: f32, confidence: f32) -> Self {
    Self {
      center_x,
      center_y,
      width,
      height,
      confidence,
      class: None,
    }
  }

  pub fn bbox(&self) -> BoundingBox {
    let (half_w, half_h) = (self.width / 2.0, self.height / 2.0);
    BoundingBox {
      left: self.center_x - half_w,
      top: self.center_y - half_h,
      right: self.center_x + half_w,
      bottom: self.center_y + half_h,
    }
  }

  pub fn confidence_label(&self) -> String {
    format_confidence(self.confidence)
  }
}

/// 置信度固定保留两位小数，与区域设置无关
pub fn format_confidence(confidence: f32) -> String {
  format!("{:.2}", confidence)
}

#[derive(Debug, Clone, Default)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
  /// 检测器返回的原始 JSON
  pub raw: serde_json::Value,
}

#[derive(Deserialize)]
struct PredictionResponse {
  #[serde(default)]
  predictions: Option<Vec<Detection>>,
}

impl DetectResult {
  /// 从检测器响应中解析 `predictions` 列表；缺失或为 null 时视为没有检测结果
  pub fn from_json(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
    let response = PredictionResponse::deserialize(&raw)?;
    let items = response.predictions.unwrap_or_default().into_boxed_slice();
    Ok(Self { items, raw })
  }

  pub fn from_items(items: Vec<Detection>) -> Self {
    Self {
      items: items.into_boxed_slice(),
      raw: serde_json::Value::Null,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

mod recorded;
pub use self::recorded::{RecordedModel, RecordedModelError};

#[cfg(feature = "roboflow")]
mod roboflow;
#[cfg(feature = "roboflow")]
pub use self::roboflow::{
  DEFAULT_MODEL_URL, RoboflowBuilder, RoboflowError, RoboflowModel,
};

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn bbox_from_center_and_size() {
    let det = Detection::new(200.0, 150.0, 100.0, 50.0, 0.9);
    let bbox = det.bbox();
    assert_eq!(bbox.left, 150.0);
    assert_eq!(bbox.top, 125.0);
    assert_eq!(bbox.right, 250.0);
    assert_eq!(bbox.bottom, 175.0);
    assert!(bbox.is_drawable());
  }

  #[test]
  fn zero_sized_box_is_not_drawable() {
    assert!(!Detection::new(10.0, 10.0, 0.0, 5.0, 0.5).bbox().is_drawable());
    assert!(!Detection::new(f32::NAN, 10.0, 4.0, 5.0, 0.5).bbox().is_drawable());
  }

  #[test]
  fn confidence_has_two_decimals() {
    assert_eq!(format_confidence(0.873456), "0.87");
    assert_eq!(format_confidence(0.0), "0.00");
    assert_eq!(format_confidence(1.0), "1.00");
  }

  #[test]
  fn parse_predictions_with_missing_confidence() {
    let raw = json!({
      "time": 0.12,
      "predictions": [
        { "x": 120, "y": 80.5, "width": 40, "height": 30, "confidence": 0.91, "class": "tumor" },
        { "x": 10, "y": 10, "width": 4, "height": 4 }
      ]
    });
    let result = DetectResult::from_json(raw).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.items[0].center_y, 80.5);
    assert_eq!(result.items[0].class.as_deref(), Some("tumor"));
    assert_eq!(result.items[1].confidence, 0.0);
  }

  #[test]
  fn missing_predictions_means_no_detection() {
    let result = DetectResult::from_json(json!({ "predictions": null })).unwrap();
    assert!(result.is_empty());
    let result = DetectResult::from_json(json!({})).unwrap();
    assert!(result.is_empty());
  }

  #[test]
  fn malformed_prediction_is_rejected() {
    let raw = json!({ "predictions": [{ "x": "left", "y": 1, "width": 1, "height": 1 }] });
    assert!(DetectResult::from_json(raw).is_err());
  }
}
