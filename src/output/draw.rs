// 该文件是 Brainscan （脑影） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Detection, format_confidence};

// 绘制常量
const BOX_STROKE_WIDTH: u32 = 3;
const BOX_COLOR: [u8; 3] = [255, 0, 0]; // 红色
const LABEL_OFFSET: i32 = 15;
const LABEL_FONT_SIZE: f32 = 16.0;

// 内嵌的默认标签字体
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(String),
}

#[derive(Debug, Clone)]
pub struct DrawConfig {
  pub stroke_width: u32,
  pub color: [u8; 3],
  /// 标签相对框上边缘向上的偏移
  pub label_offset: i32,
  pub font_size: f32,
}

impl Default for DrawConfig {
  fn default() -> Self {
    Self {
      stroke_width: BOX_STROKE_WIDTH,
      color: BOX_COLOR,
      label_offset: LABEL_OFFSET,
      font_size: LABEL_FONT_SIZE,
    }
  }
}

/// 绘制结果：输入图像的副本以及实际绘制的检测框数量
#[derive(Debug, Clone)]
pub struct AnnotatedImage {
  pub image: RgbImage,
  pub boxes_drawn: usize,
}

impl AnnotatedImage {
  pub fn has_overlays(&self) -> bool {
    self.boxes_drawn > 0
  }
}

pub struct Draw {
  config: DrawConfig,
  font: FontArc,
}

impl Default for Draw {
  fn default() -> Self {
    Self::new(DrawConfig::default())
  }
}

impl Draw {
  pub fn new(config: DrawConfig) -> Self {
    let font = FontArc::try_from_slice(EMBEDDED_FONT).expect("无法加载嵌入的字体文件");
    Self { config, font }
  }

  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = font;
    self
  }

  pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontArc, DrawError> {
    let data = std::fs::read(path.as_ref())?;
    FontArc::try_from_vec(data).map_err(|e| DrawError::InvalidFont(e.to_string()))
  }

  /// 指定字体文件时替换内嵌字体
  pub fn with_font_file(self, path: Option<&Path>) -> Result<Self, DrawError> {
    match path {
      Some(path) => {
        let font = Self::load_font(path)?;
        info!("使用标签字体: {}", path.display());
        Ok(self.with_font(font))
      }
      None => Ok(self),
    }
  }

  pub fn config(&self) -> &DrawConfig {
    &self.config
  }

  /// 在输入图像的副本上绘制所有检测框，输入图像保持不变
  pub fn render(&self, image: &RgbImage, detections: &[Detection]) -> AnnotatedImage {
    let mut canvas = image.clone();
    let boxes_drawn = detections
      .iter()
      .filter(|detection| self.draw_detection(&mut canvas, detection))
      .count();

    AnnotatedImage {
      image: canvas,
      boxes_drawn,
    }
  }

  // 绘制单个检测框及标签，跳过退化或完全越界的框
  fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) -> bool {
    let bbox = detection.bbox();
    if !bbox.is_drawable() {
      debug!("跳过退化检测框: {:?}", detection);
      return false;
    }

    let (w, h) = (image.width() as i32, image.height() as i32);
    let x_min = (bbox.left.floor() as i32).max(0);
    let y_min = (bbox.top.floor() as i32).max(0);
    let x_max = (bbox.right.ceil() as i32).min(w - 1);
    let y_max = (bbox.bottom.ceil() as i32).min(h - 1);

    if x_min >= x_max || y_min >= y_max {
      debug!("检测框位于图像之外: {:?}", bbox);
      return false;
    }

    let color = Rgb(self.config.color);

    // 边框向内加粗
    for thickness in 0..self.config.stroke_width as i32 {
      let (x0, y0) = (x_min + thickness, y_min + thickness);
      let (x1, y1) = (x_max - thickness, y_max - thickness);
      if x0 > x1 || y0 > y1 {
        break;
      }
      let rect = Rect::at(x0, y0).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    let label = format!("Tumor: {}", format_confidence(detection.confidence));
    let label_y = (y_min - self.config.label_offset).max(0);
    draw_text_mut(
      image,
      color,
      x_min,
      label_y,
      PxScale::from(self.config.font_size),
      &self.font,
      &label,
    );

    true
  }
}
