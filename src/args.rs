// 该文件是 Brainscan （脑影） 项目的一部分。
// src/args.rs - 项目参数配置
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

use brainscan::{
  model::DEFAULT_MODEL_URL,
  patient::{Gender, PatientForm},
};
use clap::Parser;
use url::Url;

/// Brainscan 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 远程模型地址
  /// 例如: roboflow://outline.roboflow.com/brain-tumor-detection-lovmz/5?api_key=KEY
  #[arg(long, value_name = "MODEL", default_value = DEFAULT_MODEL_URL)]
  pub model: Url,

  /// 推理服务 API Key（优先于模型地址中的 api_key）
  #[arg(long, env = "ROBOFLOW_API_KEY", hide_env_values = true)]
  pub api_key: Option<String>,

  /// 推理请求超时（秒）
  #[arg(long, default_value = "30", value_name = "SECS")]
  pub timeout: u64,

  /// 输入 MRI 图像（JPEG/PNG）
  #[arg(long, value_name = "FILE")]
  pub input: PathBuf,

  /// 报告输出目录或文件路径
  #[arg(long, default_value = ".", value_name = "OUTPUT")]
  pub output: PathBuf,

  /// 额外保存标注后的图像
  #[arg(long, value_name = "FILE")]
  pub annotated: Option<PathBuf>,

  /// 在报告旁保存原始推理结果
  #[arg(long)]
  pub save_json: bool,

  /// 标签字体（TrueType），默认使用内嵌的 DejaVu Sans
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,

  #[command(flatten)]
  pub patient: PatientArgs,
}

#[derive(clap::Args, Debug)]
pub struct PatientArgs {
  /// 确认同意 AI 分析
  #[arg(long)]
  pub consent: bool,

  /// 要求表单完整（同意、姓名、年龄）后才进行检测
  #[arg(long)]
  pub require_form: bool,

  /// 患者姓名
  #[arg(long, default_value = "")]
  pub name: String,

  /// 患者年龄
  #[arg(long, allow_negative_numbers = true)]
  pub age: Option<i64>,

  /// 性别: male / female / other
  #[arg(long, default_value = "")]
  pub gender: Gender,

  /// 既往病史
  #[arg(long, default_value = "")]
  pub illnesses: String,

  /// 过敏史
  #[arg(long, default_value = "")]
  pub allergies: String,

  /// 当前用药
  #[arg(long, default_value = "")]
  pub medications: String,

  /// 家族病史
  #[arg(long, default_value = "")]
  pub family_history: String,
}

impl PatientArgs {
  pub fn to_form(&self) -> PatientForm {
    PatientForm {
      consent: self.consent,
      name: self.name.clone(),
      age: self.age,
      gender: self.gender,
      previous_illnesses: self.illnesses.clone(),
      allergies: self.allergies.clone(),
      medications: self.medications.clone(),
      family_history: self.family_history.clone(),
    }
  }
}
