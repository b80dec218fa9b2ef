// 该文件是 Brainscan （脑影） 项目的一部分。
// src/task.rs - 单次提交的检测与报告任务
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

use std::fmt;

use chrono::NaiveDateTime;
use image::RgbImage;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
  input::{ImageFileInput, InputError},
  model::{DetectResult, Model},
  output::{
    AnnotatedImage, Draw, ReportAssembler, ReportDocument, ReportError, report_file_name,
  },
  patient::{PatientForm, ValidationError},
};

pub trait Task<I, M>: Sized {
  type Output;
  type Error;
  fn run_task(&self, input: I, model: &M) -> Result<Self::Output, Self::Error>;
}

/// 单次提交的终止性错误，不做自动重试
#[derive(Error, Debug)]
pub enum TaskError {
  #[error("图像输入错误: {0}")]
  Input(#[from] InputError),
  #[error("推理失败: {0}")]
  Upstream(String),
  #[error("表单校验失败 ({field}): {0}", field = .0.field())]
  Validation(#[from] ValidationError),
  #[error("报告生成失败: {0}")]
  Document(#[from] ReportError),
}

/// 用户的一次提交
#[derive(Debug, Clone)]
pub struct Submission {
  pub image_name: String,
  pub image_bytes: Vec<u8>,
  pub form: PatientForm,
  pub generated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  TumorDetected(usize),
  NoTumorDetected,
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Outcome::TumorDetected(count) => write!(f, "检测到 {} 个疑似肿瘤区域", count),
      Outcome::NoTumorDetected => write!(f, "未检测到肿瘤区域"),
    }
  }
}

pub struct Diagnosis {
  pub detections: DetectResult,
  pub annotated: AnnotatedImage,
  pub report: ReportDocument,
  pub file_name: String,
  pub outcome: Outcome,
}

/// 校验 → 解码 → 推理 → 绘制 → 生成报告，整个流程同步完成
#[derive(Default)]
pub struct DiagnosisTask {
  draw: Draw,
  assembler: ReportAssembler,
  require_form: bool,
}

impl DiagnosisTask {
  pub fn new(draw: Draw, assembler: ReportAssembler) -> Self {
    Self {
      draw,
      assembler,
      require_form: false,
    }
  }

  /// 启用后，表单不完整时拒绝进行检测
  pub fn with_required_form(mut self, require_form: bool) -> Self {
    self.require_form = require_form;
    self
  }
}

impl<M, E> Task<Submission, M> for DiagnosisTask
where
  M: Model<Input = RgbImage, Output = DetectResult, Error = E>,
  E: fmt::Display,
{
  type Output = Diagnosis;
  type Error = TaskError;

  fn run_task(&self, input: Submission, model: &M) -> Result<Self::Output, Self::Error> {
    info!("开始任务: {}", input.image_name);

    if self.require_form {
      input.form.validate().inspect_err(|e| {
        warn!("表单字段 {} 校验失败: {}", e.field(), e);
      })?;
    }

    let upload = ImageFileInput::from_bytes(input.image_name, &input.image_bytes)?;
    info!(
      "图像已加载: {} ({}x{})",
      upload.name(),
      upload.image().width(),
      upload.image().height()
    );

    let now = std::time::Instant::now();
    let detections = model.infer(upload.image()).map_err(|e| {
      error!("推理失败: {}", e);
      TaskError::Upstream(e.to_string())
    })?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    for (index, det) in detections.items.iter().enumerate() {
      info!(
        "  - #{} {:.2}% at ({:.0}, {:.0}, {:.0}x{:.0})",
        index + 1,
        det.confidence * 100.0,
        det.center_x,
        det.center_y,
        det.width,
        det.height
      );
    }

    let annotated = self.draw.render(upload.image(), &detections.items);
    let patient = input.form.to_record();
    let report = self.assembler.assemble(
      Some(&annotated.image),
      patient.as_ref(),
      &detections.items,
      upload.name(),
      input.generated_at,
    )?;

    let outcome = if detections.is_empty() {
      Outcome::NoTumorDetected
    } else {
      Outcome::TumorDetected(detections.len())
    };
    info!("任务完成: {}", outcome);

    Ok(Diagnosis {
      file_name: report_file_name(patient.as_ref(), input.generated_at),
      detections,
      annotated,
      report,
      outcome,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_error_names_the_field() {
    let err = TaskError::from(ValidationError::EmptyName);
    assert_eq!(err.to_string(), "表单校验失败 (name): 患者姓名不能为空");

    let err = TaskError::from(ValidationError::NonPositiveAge(-3));
    assert!(err.to_string().contains("(age)"));
  }

  #[test]
  fn upstream_error_keeps_message() {
    let err = TaskError::Upstream("HTTP 503".into());
    assert_eq!(err.to_string(), "推理失败: HTTP 503");
  }
}
