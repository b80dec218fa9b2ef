// 该文件是 Brainscan （脑影） 项目的一部分。
// src/bin/offline_report.rs - 使用已保存的推理结果生成报告
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use brainscan::{
  model::RecordedModel,
  output::{Draw, ReportAssembler, save_annotated_image, save_report},
  patient::{Gender, PatientForm},
  task::{DiagnosisTask, Submission, Task},
};

/// 离线报告参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理结果 JSON（包含 predictions 列表）
  #[arg(long, value_name = "FILE")]
  pub predictions: PathBuf,
  /// 输入 MRI 图像
  #[arg(long, value_name = "FILE")]
  pub input: PathBuf,
  /// 报告输出目录或文件路径
  #[arg(long, default_value = ".", value_name = "OUTPUT")]
  pub output: PathBuf,
  /// 额外保存标注后的图像
  #[arg(long, value_name = "FILE")]
  pub annotated: Option<PathBuf>,
  /// 标签字体
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,
  /// 患者姓名
  #[arg(long, default_value = "")]
  pub name: String,
  /// 患者年龄
  #[arg(long)]
  pub age: Option<i64>,
  /// 性别
  #[arg(long, default_value = "")]
  pub gender: Gender,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("推理结果: {}", args.predictions.display());
  info!("输入图像: {}", args.input.display());

  let model = RecordedModel::open(&args.predictions)?;
  let draw = Draw::default().with_font_file(args.font.as_deref())?;
  let task = DiagnosisTask::new(draw, ReportAssembler::default());

  let submission = Submission {
    image_name: args
      .input
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default(),
    image_bytes: std::fs::read(&args.input)?,
    form: PatientForm {
      name: args.name.clone(),
      age: args.age,
      gender: args.gender,
      ..Default::default()
    },
    generated_at: chrono::Local::now().naive_local(),
  };

  let diagnosis = task.run_task(submission, &model)?;
  println!("{}", diagnosis.outcome);

  if let Some(path) = &args.annotated {
    save_annotated_image(path, &diagnosis.annotated.image)?;
  }
  let path = save_report(&args.output, &diagnosis.file_name, &diagnosis.report)?;
  println!("报告已保存: {}", path.display());

  Ok(())
}
