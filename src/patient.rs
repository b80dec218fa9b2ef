// 该文件是 Brainscan （脑影） 项目的一部分。
// src/patient.rs - 患者信息与表单校验
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

use std::{fmt, str::FromStr};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
  Male,
  Female,
  Other,
  #[default]
  Unspecified,
}

#[derive(Error, Debug)]
#[error("无法识别的性别: {0}")]
pub struct ParseGenderError(String);

impl FromStr for Gender {
  type Err = ParseGenderError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "male" | "m" => Ok(Gender::Male),
      "female" | "f" => Ok(Gender::Female),
      "other" | "o" => Ok(Gender::Other),
      "" | "unspecified" | "n/a" => Ok(Gender::Unspecified),
      _ => Err(ParseGenderError(s.to_string())),
    }
  }
}

impl fmt::Display for Gender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Gender::Male => "Male",
      Gender::Female => "Female",
      Gender::Other => "Other",
      Gender::Unspecified => "N/A",
    };
    f.write_str(text)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicalHistory {
  pub previous_illnesses: Option<String>,
  pub allergies: Option<String>,
  pub medications: Option<String>,
  pub family_history: Option<String>,
}

impl MedicalHistory {
  pub fn is_empty(&self) -> bool {
    self.entries().iter().all(|(_, value)| value.is_none())
  }

  /// 按报告中的顺序给出 (标签, 值)
  pub fn entries(&self) -> [(&'static str, Option<&str>); 4] {
    [
      ("Previous Illnesses", self.previous_illnesses.as_deref()),
      ("Allergies", self.allergies.as_deref()),
      ("Current Medications", self.medications.as_deref()),
      ("Family History", self.family_history.as_deref()),
    ]
  }
}

/// 单次提交的患者记录，只在本次报告中存在
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientRecord {
  pub name: Option<String>,
  pub age: Option<u32>,
  pub gender: Gender,
  pub history: MedicalHistory,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
  #[error("请先确认同意 AI 分析")]
  MissingConsent,
  #[error("患者姓名不能为空")]
  EmptyName,
  #[error("患者年龄必须为正数: {0}")]
  NonPositiveAge(i64),
  #[error("患者年龄不能为空")]
  MissingAge,
}

impl ValidationError {
  /// 出错的表单字段
  pub fn field(&self) -> &'static str {
    match self {
      ValidationError::MissingConsent => "consent",
      ValidationError::EmptyName => "name",
      ValidationError::NonPositiveAge(_) | ValidationError::MissingAge => "age",
    }
  }
}

/// 表单原始输入，字段均为自由文本
#[derive(Debug, Clone, Default)]
pub struct PatientForm {
  pub consent: bool,
  pub name: String,
  pub age: Option<i64>,
  pub gender: Gender,
  pub previous_illnesses: String,
  pub allergies: String,
  pub medications: String,
  pub family_history: String,
}

fn non_blank(value: &str) -> Option<String> {
  let value = value.trim();
  (!value.is_empty()).then(|| value.to_string())
}

impl PatientForm {
  /// 表单完整性校验，失败时不应进行检测
  pub fn validate(&self) -> Result<(), ValidationError> {
    if !self.consent {
      return Err(ValidationError::MissingConsent);
    }
    if self.name.trim().is_empty() {
      return Err(ValidationError::EmptyName);
    }
    match self.age {
      None => Err(ValidationError::MissingAge),
      Some(age) if age <= 0 => Err(ValidationError::NonPositiveAge(age)),
      Some(_) => Ok(()),
    }
  }

  /// 所有字段都为空时返回 None，报告中将省略患者相关章节
  pub fn to_record(&self) -> Option<PatientRecord> {
    let age = self.age.and_then(|age| match u32::try_from(age) {
      Ok(age) => Some(age),
      Err(_) => {
        warn!("忽略无效年龄: {}", age);
        None
      }
    });

    let record = PatientRecord {
      name: non_blank(&self.name),
      age,
      gender: self.gender,
      history: MedicalHistory {
        previous_illnesses: non_blank(&self.previous_illnesses),
        allergies: non_blank(&self.allergies),
        medications: non_blank(&self.medications),
        family_history: non_blank(&self.family_history),
      },
    };

    (record != PatientRecord::default()).then_some(record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn complete_form() -> PatientForm {
    PatientForm {
      consent: true,
      name: "Jane Doe".to_string(),
      age: Some(42),
      gender: Gender::Female,
      allergies: "  penicillin ".to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn gender_parsing() {
    assert_eq!("Male".parse::<Gender>().unwrap(), Gender::Male);
    assert_eq!(" f ".parse::<Gender>().unwrap(), Gender::Female);
    assert_eq!("".parse::<Gender>().unwrap(), Gender::Unspecified);
    assert!("robot".parse::<Gender>().is_err());
    assert_eq!(Gender::Unspecified.to_string(), "N/A");
  }

  #[test]
  fn complete_form_is_valid() {
    assert_eq!(complete_form().validate(), Ok(()));
  }

  #[test]
  fn validation_reports_the_failing_field() {
    let mut form = complete_form();
    form.consent = false;
    assert_eq!(form.validate().unwrap_err().field(), "consent");

    let mut form = complete_form();
    form.name = "   ".to_string();
    assert_eq!(form.validate(), Err(ValidationError::EmptyName));

    let mut form = complete_form();
    form.age = Some(0);
    assert_eq!(form.validate(), Err(ValidationError::NonPositiveAge(0)));

    form.age = None;
    assert_eq!(form.validate().unwrap_err().field(), "age");
  }

  #[test]
  fn record_trims_and_drops_blank_fields() {
    let record = complete_form().to_record().unwrap();
    assert_eq!(record.name.as_deref(), Some("Jane Doe"));
    assert_eq!(record.history.allergies.as_deref(), Some("penicillin"));
    assert_eq!(record.history.medications, None);
    assert!(!record.history.is_empty());
  }

  #[test]
  fn empty_form_has_no_record() {
    assert_eq!(PatientForm::default().to_record(), None);
  }

  #[test]
  fn negative_age_is_dropped_from_record() {
    let form = PatientForm {
      name: "X".to_string(),
      age: Some(-3),
      ..Default::default()
    };
    assert_eq!(form.to_record().unwrap().age, None);
  }
}
