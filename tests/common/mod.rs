use std::{cell::Cell, io::Cursor};

use brainscan::{
  model::{DetectResult, Detection, Model},
  patient::{Gender, PatientForm},
  task::Submission,
};
use chrono::{NaiveDate, NaiveDateTime};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("connection reset by peer")]
pub struct TransportError;

/// 记录调用次数的模拟检测器
pub struct MockModel {
  pub response: Option<Vec<Detection>>,
  pub calls: Cell<usize>,
}

impl MockModel {
  pub fn returning(detections: Vec<Detection>) -> Self {
    Self {
      response: Some(detections),
      calls: Cell::new(0),
    }
  }

  pub fn failing() -> Self {
    Self {
      response: None,
      calls: Cell::new(0),
    }
  }
}

impl Model for MockModel {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = TransportError;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.calls.set(self.calls.get() + 1);
    self
      .response
      .clone()
      .map(DetectResult::from_items)
      .ok_or(TransportError)
  }
}

pub fn fixed_time() -> NaiveDateTime {
  NaiveDate::from_ymd_opt(2026, 5, 20)
    .unwrap()
    .and_hms_opt(14, 30, 0)
    .unwrap()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
  let image = RgbImage::from_pixel(width, height, Rgb([30, 30, 30]));
  let mut buffer = Cursor::new(Vec::new());
  DynamicImage::ImageRgb8(image)
    .write_to(&mut buffer, ImageFormat::Png)
    .unwrap();
  buffer.into_inner()
}

pub fn complete_form() -> PatientForm {
  PatientForm {
    consent: true,
    name: "Jane Doe".to_string(),
    age: Some(37),
    gender: Gender::Female,
    medications: "Ibuprofen".to_string(),
    ..Default::default()
  }
}

pub fn submission(image_bytes: Vec<u8>, form: PatientForm) -> Submission {
  Submission {
    image_name: "mri_scan.png".to_string(),
    image_bytes,
    form,
    generated_at: fixed_time(),
  }
}
