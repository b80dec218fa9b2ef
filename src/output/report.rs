// 该文件是 Brainscan （脑影） 项目的一部分。
// src/output/report.rs - PDF 诊断报告生成
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

use std::io::Write;

use chrono::NaiveDateTime;
use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  model::{Detection, format_confidence},
  patient::PatientRecord,
  utils::{JPEG_QUALITY, encode_jpeg, sanitize_file_stem},
};

mod canvas;
mod metrics;

use self::canvas::{Align, EmbeddedJpeg, PageCanvas};
use self::metrics::{Face, wrap_text};

pub const NO_DETECTION_TEXT: &str = "No tumor detected by the AI model.";
pub const NO_IMAGE_TEXT: &str = "No detection image available.";
pub const REPORT_MIME_TYPE: &str = "application/pdf";

const DEFAULT_TITLE: &str = "Brain Tumor Detection Report";
const DEFAULT_DISCLAIMER: &str = "Disclaimer: This report was generated automatically by an AI \
  model and is provided for informational purposes only. It is not a medical diagnosis. \
  Please consult a qualified healthcare professional for the interpretation of these results \
  and before making any medical decision.";

// A4 纵向，单位 pt
const A4_WIDTH: f32 = 595.28;
const A4_HEIGHT: f32 = 841.89;
const INCH: f32 = 72.0;

const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 11.0;
const TIMESTAMP_SIZE: f32 = 10.0;
const DISCLAIMER_SIZE: f32 = 9.0;
const DISCLAIMER_PITCH: f32 = 11.0;
const DISCLAIMER_GRAY: f32 = 0.45;
const SECTION_GAP: f32 = 12.0;

const TABLE_COLUMN_WIDTHS: [f32; 2] = [40.0, 120.0];
const TABLE_ROW_HEIGHT: f32 = 18.0;
const TABLE_CELL_PADDING: f32 = 6.0;
const TABLE_HEADER_GRAY: f32 = 0.85;
const TABLE_BORDER_WIDTH: f32 = 0.5;

#[derive(Error, Debug)]
pub enum ReportError {
  #[error("页面尺寸无效: {0}")]
  InvalidGeometry(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
  pub title: String,
  pub page_width: f32,
  pub page_height: f32,
  pub margin: f32,
  pub line_pitch: f32,
  /// 嵌入图像的最大边长
  pub image_box: f32,
  pub disclaimer: String,
}

impl Default for ReportConfig {
  fn default() -> Self {
    Self {
      title: DEFAULT_TITLE.to_string(),
      page_width: A4_WIDTH,
      page_height: A4_HEIGHT,
      margin: INCH,
      line_pitch: 0.2 * INCH,
      image_box: 4.0 * INCH,
      disclaimer: DEFAULT_DISCLAIMER.to_string(),
    }
  }
}

impl ReportConfig {
  fn validate(&self) -> Result<(), ReportError> {
    let writable_width = self.page_width - 2.0 * self.margin;
    let writable_height = self.page_height - 2.0 * self.margin;
    if !(writable_width > 0.0 && writable_height > 0.0) {
      return Err(ReportError::InvalidGeometry(format!(
        "页边距 {} 超出页面 {}x{}",
        self.margin, self.page_width, self.page_height
      )));
    }
    if !(self.line_pitch > 0.0 && self.line_pitch < writable_height) {
      return Err(ReportError::InvalidGeometry(format!(
        "行距无效: {}",
        self.line_pitch
      )));
    }
    if !(self.image_box > 0.0) || self.image_box + HEADING_SIZE * 2.0 > writable_height {
      return Err(ReportError::InvalidGeometry(format!(
        "图像区域无效: {}",
        self.image_box
      )));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
  Header,
  PatientInfo,
  MedicalHistory,
  PredictionSummary,
  EmbeddedImage,
  Disclaimer,
}

/// 报告中实际输出的一个章节
#[derive(Debug, Clone)]
pub struct Section {
  pub kind: SectionKind,
  /// 章节起始页（从 0 开始）
  pub page: usize,
  pub lines: Vec<String>,
  pub table: Option<Vec<[String; 2]>>,
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
  sections: Vec<Section>,
  page_count: usize,
  bytes: Vec<u8>,
}

impl ReportDocument {
  pub fn sections(&self) -> &[Section] {
    &self.sections
  }

  pub fn section(&self, kind: SectionKind) -> Option<&Section> {
    self.sections.iter().find(|s| s.kind == kind)
  }

  pub fn has_section(&self, kind: SectionKind) -> bool {
    self.section(kind).is_some()
  }

  pub fn page_count(&self) -> usize {
    self.page_count
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.bytes
  }

  pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ReportError> {
    writer.write_all(&self.bytes)?;
    writer.flush()?;
    Ok(())
  }
}

/// 报告文件名：患者姓名中的空格替换为下划线；无姓名时使用时间戳
pub fn report_file_name(patient: Option<&PatientRecord>, generated_at: NaiveDateTime) -> String {
  match patient.and_then(|p| p.name.as_deref()).map(sanitize_file_stem) {
    Some(stem) if !stem.is_empty() => format!("{}_Brain_Tumor_Report.pdf", stem),
    _ => format!(
      "Brain_Tumor_Report_{}.pdf",
      generated_at.format("%Y%m%d_%H%M%S")
    ),
  }
}

#[derive(Default)]
pub struct ReportAssembler {
  config: ReportConfig,
}

impl ReportAssembler {
  pub fn new(config: ReportConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &ReportConfig {
    &self.config
  }

  pub fn assemble(
    &self,
    annotated: Option<&RgbImage>,
    patient: Option<&PatientRecord>,
    detections: &[Detection],
    image_label: &str,
    generated_at: NaiveDateTime,
  ) -> Result<ReportDocument, ReportError> {
    self.config.validate()?;

    let mut layout = Layout {
      config: &self.config,
      canvas: PageCanvas::new(
        self.config.page_width,
        self.config.page_height,
        self.config.margin,
      ),
      sections: Vec::new(),
    };

    layout.header(generated_at);
    if let Some(patient) = patient {
      layout.patient_info(patient, image_label);
      if !patient.history.is_empty() {
        layout.medical_history(patient);
      }
    }
    layout.prediction_summary(detections);
    let image = annotated.and_then(embed_image);
    layout.embedded_image(image.as_ref());
    layout.disclaimer();

    let Layout {
      canvas, sections, ..
    } = layout;
    let page_count = canvas.page_count();
    let bytes = canvas.finish(&self.config.title, generated_at, image.as_ref());
    info!(
      "报告生成完成: {} 页, {} 字节, {} 个章节",
      page_count,
      bytes.len(),
      sections.len()
    );

    Ok(ReportDocument {
      sections,
      page_count,
      bytes,
    })
  }
}

// 图像无法编码时降级为占位文本，不中断报告生成
fn embed_image(image: &RgbImage) -> Option<EmbeddedJpeg> {
  if image.width() == 0 || image.height() == 0 {
    warn!("检测图像为空，使用占位文本");
    return None;
  }
  match encode_jpeg(image, JPEG_QUALITY) {
    Ok(data) => Some(EmbeddedJpeg {
      data,
      width: image.width(),
      height: image.height(),
    }),
    Err(e) => {
      warn!("检测图像编码失败，使用占位文本: {}", e);
      None
    }
  }
}

struct Layout<'a> {
  config: &'a ReportConfig,
  canvas: PageCanvas,
  sections: Vec<Section>,
}

impl Layout<'_> {
  fn begin(&mut self, kind: SectionKind, lines: Vec<String>) {
    self.sections.push(Section {
      kind,
      page: self.canvas.page_index(),
      lines,
      table: None,
    });
  }

  fn current(&mut self) -> &mut Section {
    let index = self.sections.len() - 1;
    &mut self.sections[index]
  }

  fn header(&mut self, generated_at: NaiveDateTime) {
    let title = self.config.title.clone();
    let timestamp = format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));

    let top = self.canvas.cursor();
    let title_baseline = top - TITLE_SIZE;
    self
      .canvas
      .aligned_text(&title, Align::Center, title_baseline, Face::Bold, TITLE_SIZE);
    let rule_y = title_baseline - 8.0;
    self.canvas.horizontal_rule(rule_y, 1.0);
    let timestamp_baseline = rule_y - 4.0 - TIMESTAMP_SIZE;
    self.canvas.aligned_text(
      &timestamp,
      Align::Right,
      timestamp_baseline,
      Face::Regular,
      TIMESTAMP_SIZE,
    );
    self.canvas.move_to(timestamp_baseline - SECTION_GAP);

    self.begin(SectionKind::Header, vec![title, timestamp]);
  }

  // 标题与第一行内容保持在同一页
  fn heading(&mut self, kind: SectionKind, text: &str, keep_with: f32) {
    self.canvas.ensure_space(HEADING_SIZE + 6.0 + keep_with);
    let baseline = self.canvas.cursor() - HEADING_SIZE;
    self
      .canvas
      .aligned_text(text, Align::Left, baseline, Face::Bold, HEADING_SIZE);
    self.canvas.advance(HEADING_SIZE + 6.0);
    self.begin(kind, vec![text.to_string()]);
  }

  fn paragraph(&mut self, text: &str) {
    let pitch = self.config.line_pitch;
    let width = self.canvas.writable_width();
    for line in wrap_text(text, Face::Regular, BODY_SIZE, width) {
      if self.canvas.ensure_space(pitch) {
        debug!("章节跨页: {:?}", self.current().kind);
      }
      let baseline = self.canvas.cursor() - BODY_SIZE;
      let left = self.canvas.left();
      self
        .canvas
        .text(&line, left, baseline, Face::Regular, BODY_SIZE, 0.0);
      self.canvas.advance(pitch);
      self.current().lines.push(line);
    }
  }

  fn end_section(&mut self) {
    self.canvas.advance(SECTION_GAP);
  }

  fn patient_info(&mut self, patient: &PatientRecord, image_label: &str) {
    self.heading(SectionKind::PatientInfo, "Patient Information", self.config.line_pitch);
    let age = patient
      .age
      .map(|age| age.to_string())
      .unwrap_or_else(|| "N/A".to_string());
    let image_label = if image_label.trim().is_empty() {
      "N/A"
    } else {
      image_label
    };
    for line in [
      format!("Name: {}", patient.name.as_deref().unwrap_or("N/A")),
      format!("Age: {}", age),
      format!("Gender: {}", patient.gender),
      format!("Image File: {}", image_label),
    ] {
      self.paragraph(&line);
    }
    self.end_section();
  }

  fn medical_history(&mut self, patient: &PatientRecord) {
    self.heading(SectionKind::MedicalHistory, "Medical History", self.config.line_pitch);
    for (label, value) in patient.history.entries() {
      self.paragraph(&format!("{}: {}", label, value.unwrap_or("N/A")));
    }
    self.end_section();
  }

  fn prediction_summary(&mut self, detections: &[Detection]) {
    if detections.is_empty() {
      self.heading(
        SectionKind::PredictionSummary,
        "AI Prediction Summary",
        self.config.line_pitch,
      );
      self.paragraph(NO_DETECTION_TEXT);
      self.end_section();
      return;
    }

    self.heading(
      SectionKind::PredictionSummary,
      "AI Prediction Summary",
      2.0 * TABLE_ROW_HEIGHT,
    );
    let header = ["#".to_string(), "Confidence".to_string()];
    self.table_row(&header, true);

    let mut rows = Vec::with_capacity(detections.len());
    for (index, detection) in detections.iter().enumerate() {
      let row = [
        (index + 1).to_string(),
        format_confidence(detection.confidence),
      ];
      // 续页重复表头
      if self.canvas.ensure_space(TABLE_ROW_HEIGHT) {
        debug!("预测表格跨页，第 {} 行", index + 1);
        self.table_row(&header, true);
      }
      self.table_row(&row, false);
      rows.push(row);
    }
    self.current().table = Some(rows);
    self.end_section();
  }

  fn table_row(&mut self, cells: &[String; 2], header: bool) {
    let x = self.canvas.left();
    let y = self.canvas.cursor() - TABLE_ROW_HEIGHT;
    let total: f32 = TABLE_COLUMN_WIDTHS.iter().sum();
    let face = if header { Face::Bold } else { Face::Regular };

    if header {
      self
        .canvas
        .fill_rect(x, y, total, TABLE_ROW_HEIGHT, TABLE_HEADER_GRAY);
    }

    let mut cell_x = x;
    for (cell, width) in cells.iter().zip(TABLE_COLUMN_WIDTHS) {
      self
        .canvas
        .stroke_rect(cell_x, y, width, TABLE_ROW_HEIGHT, TABLE_BORDER_WIDTH);
      self.canvas.text(
        cell,
        cell_x + TABLE_CELL_PADDING,
        y + (TABLE_ROW_HEIGHT - BODY_SIZE) / 2.0 + 1.5,
        face,
        BODY_SIZE,
        0.0,
      );
      cell_x += width;
    }
    self.canvas.advance(TABLE_ROW_HEIGHT);
  }

  fn embedded_image(&mut self, image: Option<&EmbeddedJpeg>) {
    let Some(image) = image else {
      self.heading(
        SectionKind::EmbeddedImage,
        "Detection Image",
        self.config.line_pitch,
      );
      self.paragraph(NO_IMAGE_TEXT);
      self.end_section();
      return;
    };

    // 等比缩放到 image_box 见方的区域内
    let box_size = self.config.image_box;
    let scale = (box_size / image.width as f32).min(box_size / image.height as f32);
    let (width, height) = (image.width as f32 * scale, image.height as f32 * scale);

    self.heading(SectionKind::EmbeddedImage, "Detection Image", height);
    let x = self.canvas.left() + (self.canvas.writable_width() - width) / 2.0;
    let y = self.canvas.cursor() - height;
    self.canvas.image(x, y, width, height);
    self.canvas.advance(height);
    self
      .current()
      .lines
      .push(format!("{}x{}", image.width, image.height));
    self.end_section();
  }

  // 免责声明固定在最后一页底部
  fn disclaimer(&mut self) {
    let width = self.canvas.writable_width();
    let lines = wrap_text(&self.config.disclaimer, Face::Regular, DISCLAIMER_SIZE, width);
    let block_height = lines.len() as f32 * DISCLAIMER_PITCH;
    let writable_height = self.config.page_height - 2.0 * self.config.margin;
    let left = self.canvas.left();

    if block_height > writable_height {
      // 一页放不下时逐行排版，跨页续排
      debug!("免责声明超过一页: {} 行", lines.len());
      for line in &lines {
        self.canvas.ensure_space(DISCLAIMER_PITCH);
        let baseline = self.canvas.cursor() - DISCLAIMER_SIZE;
        self.canvas.text(
          line,
          left,
          baseline,
          Face::Regular,
          DISCLAIMER_SIZE,
          DISCLAIMER_GRAY,
        );
        self.canvas.advance(DISCLAIMER_PITCH);
      }
    } else {
      if self.canvas.cursor() - block_height < self.canvas.bottom() {
        self.canvas.new_page();
      }

      // 固定在最后一页底部
      let top = self.canvas.bottom() + block_height;
      for (index, line) in lines.iter().enumerate() {
        let baseline = top - DISCLAIMER_SIZE - index as f32 * DISCLAIMER_PITCH;
        self.canvas.text(
          line,
          left,
          baseline,
          Face::Regular,
          DISCLAIMER_SIZE,
          DISCLAIMER_GRAY,
        );
      }
    }
    self.canvas.move_to(self.canvas.bottom());

    self.sections.push(Section {
      kind: SectionKind::Disclaimer,
      page: self.canvas.page_index(),
      lines,
      table: None,
    });
  }
}
