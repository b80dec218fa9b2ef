// 该文件是 Brainscan （脑影） 项目的一部分。
// src/output/report/canvas.rs - 分页画布
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

use chrono::{Datelike, NaiveDateTime, Timelike};
use pdf_writer::{Content, Date, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::debug;

use super::metrics::{Face, encode_win_ansi, text_width};

const IMAGE_RESOURCE: &[u8] = b"Im1";

/// 已编码为 JPEG 的嵌入图像
pub struct EmbeddedJpeg {
  pub data: Vec<u8>,
  pub width: u32,
  pub height: u32,
}

#[derive(Debug, Clone, Copy)]
pub enum Align {
  Left,
  Center,
  Right,
}

struct Page {
  content: Content,
  uses_image: bool,
}

/// 自上而下排版的多页画布，坐标使用 PDF 的 pt 单位，原点在左下角
pub struct PageCanvas {
  page_width: f32,
  page_height: f32,
  margin: f32,
  pages: Vec<Page>,
  cursor: f32,
}

impl PageCanvas {
  pub fn new(page_width: f32, page_height: f32, margin: f32) -> Self {
    let mut canvas = Self {
      page_width,
      page_height,
      margin,
      pages: Vec::new(),
      cursor: 0.0,
    };
    canvas.new_page();
    canvas
  }

  pub fn new_page(&mut self) {
    self.pages.push(Page {
      content: Content::new(),
      uses_image: false,
    });
    self.cursor = self.page_height - self.margin;
    debug!("开始第 {} 页", self.pages.len());
  }

  pub fn page_index(&self) -> usize {
    self.pages.len() - 1
  }

  pub fn page_count(&self) -> usize {
    self.pages.len()
  }

  pub fn cursor(&self) -> f32 {
    self.cursor
  }

  pub fn left(&self) -> f32 {
    self.margin
  }

  pub fn right(&self) -> f32 {
    self.page_width - self.margin
  }

  pub fn bottom(&self) -> f32 {
    self.margin
  }

  pub fn writable_width(&self) -> f32 {
    self.page_width - 2.0 * self.margin
  }

  /// 当前页剩余空间不足 height 时换页，返回是否换页
  pub fn ensure_space(&mut self, height: f32) -> bool {
    if self.cursor - height < self.margin && self.cursor < self.page_height - self.margin {
      self.new_page();
      return true;
    }
    false
  }

  pub fn advance(&mut self, height: f32) {
    self.cursor -= height;
  }

  /// 将光标移动到指定位置，只允许向下移动
  pub fn move_to(&mut self, y: f32) {
    self.cursor = self.cursor.min(y);
  }

  fn content(&mut self) -> &mut Content {
    let index = self.page_index();
    &mut self.pages[index].content
  }

  pub fn text(&mut self, text: &str, x: f32, baseline: f32, face: Face, size: f32, gray: f32) {
    let encoded = encode_win_ansi(text);
    let content = self.content();
    content.set_fill_gray(gray);
    content.begin_text();
    content.set_font(Name(face.resource_name()), size);
    content.next_line(x, baseline);
    content.show(Str(&encoded));
    content.end_text();
  }

  /// 在左右页边距之间按对齐方式放置一行文本
  pub fn aligned_text(&mut self, text: &str, align: Align, baseline: f32, face: Face, size: f32) {
    let width = text_width(text, face, size);
    let x = match align {
      Align::Left => self.left(),
      Align::Center => (self.page_width - width) / 2.0,
      Align::Right => self.right() - width,
    };
    self.text(text, x, baseline, face, size, 0.0);
  }

  pub fn horizontal_rule(&mut self, y: f32, line_width: f32) {
    let (left, right) = (self.left(), self.right());
    let content = self.content();
    content.set_stroke_gray(0.0);
    content.set_line_width(line_width);
    content.move_to(left, y);
    content.line_to(right, y);
    content.stroke();
  }

  pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
    let content = self.content();
    content.set_fill_gray(gray);
    content.rect(x, y, width, height);
    content.fill_nonzero();
  }

  pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32) {
    let content = self.content();
    content.set_stroke_gray(0.0);
    content.set_line_width(line_width);
    content.rect(x, y, width, height);
    content.stroke();
  }

  /// 在当前页放置嵌入图像，(x, y) 为左下角
  pub fn image(&mut self, x: f32, y: f32, width: f32, height: f32) {
    let index = self.page_index();
    let page = &mut self.pages[index];
    page.uses_image = true;
    page.content.save_state();
    page.content.transform([width, 0.0, 0.0, height, x, y]);
    page.content.x_object(Name(IMAGE_RESOURCE));
    page.content.restore_state();
  }

  /// 生成 PDF 字节流；对象编号按固定顺序分配，相同输入得到相同输出
  pub fn finish(
    self,
    title: &str,
    created_at: NaiveDateTime,
    image: Option<&EmbeddedJpeg>,
  ) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut alloc = Ref::new(1);

    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let regular_id = alloc.bump();
    let bold_id = alloc.bump();
    let info_id = alloc.bump();
    let image_id = alloc.bump();

    let page_ids: Vec<(Ref, Ref)> = self
      .pages
      .iter()
      .map(|_| (alloc.bump(), alloc.bump()))
      .collect();

    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf
      .pages(page_tree_id)
      .kids(page_ids.iter().map(|(page_id, _)| *page_id))
      .count(page_ids.len() as i32);

    for (face, id) in [(Face::Regular, regular_id), (Face::Bold, bold_id)] {
      pdf
        .type1_font(id)
        .base_font(Name(face.base_font()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    pdf
      .document_info(info_id)
      .title(TextStr(title))
      .producer(TextStr("brainscan"))
      .creation_date(
        Date::new(created_at.year().clamp(0, 9999) as u16)
          .month(created_at.month() as u8)
          .day(created_at.day() as u8)
          .hour(created_at.hour() as u8)
          .minute(created_at.minute() as u8)
          .second(created_at.second() as u8),
      );

    if let Some(image) = image {
      let mut xobject = pdf.image_xobject(image_id, &image.data);
      xobject.filter(Filter::DctDecode);
      xobject.width(image.width as i32);
      xobject.height(image.height as i32);
      xobject.color_space().device_rgb();
      xobject.bits_per_component(8);
      xobject.finish();
    }

    let media_box = Rect::new(0.0, 0.0, self.page_width, self.page_height);
    for (page, (page_id, content_id)) in self.pages.into_iter().zip(page_ids) {
      let mut writer = pdf.page(page_id);
      writer.media_box(media_box);
      writer.parent(page_tree_id);
      writer.contents(content_id);
      let mut resources = writer.resources();
      resources
        .fonts()
        .pair(Name(Face::Regular.resource_name()), regular_id)
        .pair(Name(Face::Bold.resource_name()), bold_id);
      if page.uses_image && image.is_some() {
        resources.x_objects().pair(Name(IMAGE_RESOURCE), image_id);
      }
      resources.finish();
      writer.finish();

      let stream = page.content.finish();
      pdf.stream(content_id, &stream);
    }

    pdf.finish()
  }
}
