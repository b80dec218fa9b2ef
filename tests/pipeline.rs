//! 端到端任务测试：校验、解码、推理、绘制、生成报告

mod common;

use brainscan::{
  model::Detection,
  output::{SectionKind, report::NO_DETECTION_TEXT, save_report},
  patient::{PatientForm, ValidationError},
  task::{DiagnosisTask, Outcome, Task, TaskError},
};
use image::Rgb;

use common::*;

#[test]
fn detection_produces_annotated_image_and_report() -> anyhow::Result<()> {
  let model = MockModel::returning(vec![
    Detection::new(200.0, 150.0, 100.0, 50.0, 0.873456),
    Detection::new(60.0, 60.0, 30.0, 30.0, 0.41),
  ]);
  let task = DiagnosisTask::default();
  let diagnosis = task.run_task(submission(png_bytes(400, 300), complete_form()), &model)?;

  assert_eq!(model.calls.get(), 1);
  assert_eq!(diagnosis.outcome, Outcome::TumorDetected(2));
  assert_eq!(diagnosis.annotated.boxes_drawn, 2);
  assert_eq!(
    *diagnosis.annotated.image.get_pixel(150, 125),
    Rgb([255, 0, 0])
  );
  assert_eq!(diagnosis.file_name, "Jane_Doe_Brain_Tumor_Report.pdf");

  let summary = diagnosis
    .report
    .section(SectionKind::PredictionSummary)
    .unwrap();
  let table = summary.table.as_ref().unwrap();
  assert_eq!(table[0], ["1".to_string(), "0.87".to_string()]);
  assert_eq!(table[1], ["2".to_string(), "0.41".to_string()]);

  let info = diagnosis.report.section(SectionKind::PatientInfo).unwrap();
  assert!(info.lines.contains(&"Image File: mri_scan.png".to_string()));
  Ok(())
}

#[test]
fn no_detection_report() -> anyhow::Result<()> {
  let model = MockModel::returning(vec![]);
  let diagnosis =
    DiagnosisTask::default().run_task(submission(png_bytes(64, 64), PatientForm::default()), &model)?;

  assert_eq!(diagnosis.outcome, Outcome::NoTumorDetected);
  assert!(!diagnosis.annotated.has_overlays());
  assert!(!diagnosis.report.has_section(SectionKind::PatientInfo));
  assert!(!diagnosis.report.has_section(SectionKind::MedicalHistory));

  let summary = diagnosis
    .report
    .section(SectionKind::PredictionSummary)
    .unwrap();
  assert!(summary.table.is_none());
  assert!(summary.lines.contains(&NO_DETECTION_TEXT.to_string()));
  assert_eq!(diagnosis.file_name, "Brain_Tumor_Report_20260520_143000.pdf");
  Ok(())
}

#[test]
fn undecodable_upload_never_reaches_detector() {
  let model = MockModel::returning(vec![]);
  let result = DiagnosisTask::default().run_task(
    submission(b"\x89PNG\r\n\x1a\n broken".to_vec(), complete_form()),
    &model,
  );

  assert!(matches!(result, Err(TaskError::Input(_))));
  assert_eq!(model.calls.get(), 0);
}

#[test]
fn transport_failure_is_single_upstream_error() {
  let output = tempfile::tempdir().unwrap();
  let model = MockModel::failing();
  let task = DiagnosisTask::default();

  match task.run_task(submission(png_bytes(32, 32), complete_form()), &model) {
    Err(TaskError::Upstream(message)) => assert!(message.contains("connection reset")),
    Err(other) => panic!("unexpected error: {other}"),
    Ok(diagnosis) => {
      // 不应到达：若生成了报告也不能写出
      save_report(output.path(), &diagnosis.file_name, &diagnosis.report).unwrap();
      panic!("inference failure produced a report");
    }
  }

  assert_eq!(model.calls.get(), 1);
  assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn incomplete_form_blocks_detection_when_required() {
  let model = MockModel::returning(vec![]);
  let task = DiagnosisTask::default().with_required_form(true);

  let mut form = complete_form();
  form.consent = false;
  let result = task.run_task(submission(png_bytes(16, 16), form), &model);
  assert!(matches!(
    result,
    Err(TaskError::Validation(ValidationError::MissingConsent))
  ));

  let mut form = complete_form();
  form.age = Some(-1);
  let result = task.run_task(submission(png_bytes(16, 16), form), &model);
  match result {
    Err(TaskError::Validation(e)) => assert_eq!(e.field(), "age"),
    _ => panic!("expected validation error"),
  }

  assert_eq!(model.calls.get(), 0);
}

#[test]
fn optional_form_does_not_block_detection() -> anyhow::Result<()> {
  let model = MockModel::returning(vec![]);
  let form = PatientForm {
    consent: false,
    ..complete_form()
  };
  let diagnosis = DiagnosisTask::default().run_task(submission(png_bytes(16, 16), form), &model)?;
  assert!(diagnosis.report.has_section(SectionKind::PatientInfo));
  assert_eq!(model.calls.get(), 1);
  Ok(())
}

#[test]
fn repeated_submission_is_byte_identical() -> anyhow::Result<()> {
  let detections = vec![Detection::new(20.0, 20.0, 10.0, 8.0, 0.77)];
  let task = DiagnosisTask::default();
  let first = task.run_task(
    submission(png_bytes(48, 48), complete_form()),
    &MockModel::returning(detections.clone()),
  )?;
  let second = task.run_task(
    submission(png_bytes(48, 48), complete_form()),
    &MockModel::returning(detections),
  )?;
  assert_eq!(first.report.as_bytes(), second.report.as_bytes());
  Ok(())
}

#[test]
fn saved_report_matches_document() -> anyhow::Result<()> {
  let output = tempfile::tempdir()?;
  let model = MockModel::returning(vec![Detection::new(8.0, 8.0, 4.0, 4.0, 0.9)]);
  let diagnosis =
    DiagnosisTask::default().run_task(submission(png_bytes(16, 16), complete_form()), &model)?;

  let path = save_report(output.path(), &diagnosis.file_name, &diagnosis.report)?;
  assert_eq!(path.file_name().unwrap(), "Jane_Doe_Brain_Tumor_Report.pdf");
  assert_eq!(std::fs::read(path)?, diagnosis.report.as_bytes());
  Ok(())
}
