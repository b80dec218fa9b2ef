// 该文件是 Brainscan （脑影） 项目的一部分。
// src/model/roboflow.rs - 远程托管检测模型
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

use std::time::{Duration, Instant};

use base64::{Engine, prelude::BASE64_STANDARD};
use image::RgbImage;
use reqwest::{blocking::Client, header::CONTENT_TYPE};
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{DetectResult, Model},
  utils::{JPEG_QUALITY, encode_jpeg},
};

pub const DEFAULT_MODEL_URL: &str = "roboflow://outline.roboflow.com/brain-tumor-detection-lovmz/5";

const ROBOFLOW_PLAIN_HTTP_SCHEME: &str = "roboflow+http";
const ROBOFLOW_DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum RoboflowError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("模型地址缺少主机名")]
  MissingHost,
  #[error("模型地址缺少模型标识")]
  MissingModelId,
  #[error("模型地址无效: {0}")]
  InvalidEndpoint(#[from] url::ParseError),
  #[error("图像编码错误: {0}")]
  ImageEncodeError(#[from] image::ImageError),
  #[error("HTTP 错误: {0}")]
  HttpError(#[from] reqwest::Error),
  #[error("响应解析错误: {0}")]
  ResponseError(#[from] serde_json::Error),
}

pub struct RoboflowBuilder {
  base: String,
  model_id: String,
  api_key: Option<String>,
  timeout: Duration,
}

impl FromUrlWithScheme for RoboflowBuilder {
  const SCHEME: &'static str = "roboflow";
}

impl FromUrl for RoboflowBuilder {
  type Error = RoboflowError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let http_scheme = match url.scheme() {
      Self::SCHEME => "https",
      ROBOFLOW_PLAIN_HTTP_SCHEME => "http",
      other => {
        error!(
          "URI scheme mismatch: expected '{}', found '{}'",
          Self::SCHEME,
          other
        );
        return Err(RoboflowError::SchemeMismatch(format!(
          "期望 '{}' 或 '{}', 实际 '{}'",
          Self::SCHEME,
          ROBOFLOW_PLAIN_HTTP_SCHEME,
          other
        )));
      }
    };

    let host = url
      .host_str()
      .filter(|h| !h.is_empty())
      .ok_or(RoboflowError::MissingHost)?;
    let base = match url.port() {
      Some(port) => format!("{}://{}:{}", http_scheme, host, port),
      None => format!("{}://{}", http_scheme, host),
    };

    let model_id = urlencoding::decode(url.path().trim_matches('/'))
      .map(|id| id.into_owned())
      .unwrap_or_else(|_| url.path().trim_matches('/').to_string());
    if model_id.is_empty() {
      return Err(RoboflowError::MissingModelId);
    }

    let api_key = url
      .query_pairs()
      .find(|(key, _)| key == "api_key")
      .map(|(_, value)| value.into_owned());

    Ok(RoboflowBuilder {
      base,
      model_id,
      api_key,
      timeout: ROBOFLOW_DEFAULT_TIMEOUT,
    })
  }
}

impl RoboflowBuilder {
  /// 覆盖 URL 中的 api_key，None 时保持原值
  pub fn api_key(mut self, api_key: Option<String>) -> Self {
    if api_key.is_some() {
      self.api_key = api_key;
    }
    self
  }

  pub fn timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn model_id(&self) -> &str {
    &self.model_id
  }

  pub fn build(self) -> Result<RoboflowModel, RoboflowError> {
    let mut endpoint = Url::parse(&format!("{}/{}", self.base, self.model_id))?;
    if let Some(key) = &self.api_key {
      endpoint.query_pairs_mut().append_pair("api_key", key);
    }

    info!("远程模型: {}/{}", self.base, self.model_id);
    let client = Client::builder().timeout(self.timeout).build()?;

    Ok(RoboflowModel {
      client,
      endpoint,
      model_id: self.model_id,
    })
  }
}

/// 托管推理服务的阻塞式客户端，每次调用都是一次独立请求
pub struct RoboflowModel {
  client: Client,
  endpoint: Url,
  model_id: String,
}

impl RoboflowModel {
  pub fn model_id(&self) -> &str {
    &self.model_id
  }

  fn request(&self, image: &RgbImage) -> Result<serde_json::Value, RoboflowError> {
    let jpeg = encode_jpeg(image, JPEG_QUALITY)?;
    debug!("上传图像 {} 字节", jpeg.len());
    let body = BASE64_STANDARD.encode(jpeg);

    let text = self
      .client
      .post(self.endpoint.clone())
      .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
      .body(body)
      .send()?
      .error_for_status()?
      .text()?;

    Ok(serde_json::from_str(&text)?)
  }
}

impl Model for RoboflowModel {
  type Input = RgbImage;
  type Output = DetectResult;
  type Error = RoboflowError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    info!("请求远程推理: {}", self.model_id);
    let now = Instant::now();
    let raw = self.request(input).inspect_err(|e| error!("远程推理失败: {}", e))?;
    let result = DetectResult::from_json(raw)?;
    info!(
      "推理完成，耗时: {:.2?}，检测到 {} 个区域",
      now.elapsed(),
      result.len()
    );
    Ok(result)
  }
}
