// 该文件是 Brainscan （脑影） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use brainscan::{
  FromUrl,
  model::RoboflowBuilder,
  output::{Draw, ReportAssembler, save_annotated_image, save_raw_json, save_report},
  task::{DiagnosisTask, Submission, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型地址: {}", args.model.as_str().split('?').next().unwrap_or_default());
  info!("输入图像: {}", args.input.display());
  info!("输出路径: {}", args.output.display());

  let model = RoboflowBuilder::from_url(&args.model)?
    .api_key(args.api_key.clone())
    .timeout(Duration::from_secs(args.timeout))
    .build()?;

  let draw = Draw::default().with_font_file(args.font.as_deref())?;
  let task = DiagnosisTask::new(draw, ReportAssembler::default())
    .with_required_form(args.patient.require_form);

  let image_bytes = std::fs::read(&args.input)?;
  let image_name = args
    .input
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| args.input.display().to_string());

  let submission = Submission {
    image_name,
    image_bytes,
    form: args.patient.to_form(),
    generated_at: chrono::Local::now().naive_local(),
  };

  let diagnosis = task.run_task(submission, &model)?;
  println!("{}", diagnosis.outcome);

  if let Some(path) = &args.annotated {
    save_annotated_image(path, &diagnosis.annotated.image)?;
  }

  let report_path = save_report(&args.output, &diagnosis.file_name, &diagnosis.report)?;
  if args.save_json {
    save_raw_json(&report_path, &diagnosis.detections.raw)?;
  }
  println!("报告已保存: {}", report_path.display());

  Ok(())
}
