// 该文件是 Brainscan （脑影） 项目的一部分。
// src/output/report/metrics.rs - 标准字体字宽与文本折行
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

/// PDF 内置字体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
  Regular,
  Bold,
}

impl Face {
  pub fn resource_name(self) -> &'static [u8] {
    match self {
      Face::Regular => b"F1",
      Face::Bold => b"F2",
    }
  }

  pub fn base_font(self) -> &'static [u8] {
    match self {
      Face::Regular => b"Helvetica",
      Face::Bold => b"Helvetica-Bold",
    }
  }
}

// Helvetica 的 AFM 字宽（1/1000 em），覆盖 0x20..=0x7E
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
  278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
  556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
  1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
  667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
  333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
  556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
  278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
  556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
  975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
  667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
  333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
  611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const FALLBACK_WIDTH: u16 = 556;

fn glyph_width(face: Face, c: char) -> u16 {
  let table = match face {
    Face::Regular => &HELVETICA_WIDTHS,
    Face::Bold => &HELVETICA_BOLD_WIDTHS,
  };
  match c as u32 {
    code @ 0x20..=0x7E => table[(code - 0x20) as usize],
    _ => FALLBACK_WIDTH,
  }
}

/// 文本在给定字号下的宽度（pt）
pub fn text_width(text: &str, face: Face, size: f32) -> f32 {
  let units: u32 = text.chars().map(|c| glyph_width(face, c) as u32).sum();
  units as f32 * size / 1000.0
}

/// 转换为 WinAnsiEncoding 字节，无法表示的字符替换为 '?'
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
  text
    .chars()
    .map(|c| match c as u32 {
      code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
      _ => b'?',
    })
    .collect()
}

/// 按单词折行；单个超长单词按字符截断
pub fn wrap_text(text: &str, face: Face, size: f32, max_width: f32) -> Vec<String> {
  let mut lines = Vec::new();
  let mut current = String::new();

  for word in text.split_whitespace() {
    let candidate = if current.is_empty() {
      word.to_string()
    } else {
      format!("{} {}", current, word)
    };

    if text_width(&candidate, face, size) <= max_width {
      current = candidate;
      continue;
    }

    if !current.is_empty() {
      lines.push(std::mem::take(&mut current));
    }

    for c in word.chars() {
      current.push(c);
      if text_width(&current, face, size) > max_width && current.chars().count() > 1 {
        current.pop();
        lines.push(std::mem::take(&mut current));
        current.push(c);
      }
    }
  }

  if !current.is_empty() || lines.is_empty() {
    lines.push(current);
  }
  lines
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn width_of_known_strings() {
    // "Hi" = 722 + 222
    assert!((text_width("Hi", Face::Regular, 10.0) - 9.44).abs() < 1e-4);
    assert!(text_width("Hi", Face::Bold, 10.0) > text_width("Hi", Face::Regular, 10.0));
  }

  #[test]
  fn win_ansi_replaces_unmappable() {
    assert_eq!(encode_win_ansi("Zoë 脑"), vec![b'Z', b'o', 0xEB, b' ', b'?']);
  }

  #[test]
  fn wrap_respects_width() {
    let text = "the quick brown fox jumps over the lazy dog ".repeat(8);
    let lines = wrap_text(&text, Face::Regular, 11.0, 200.0);
    assert!(lines.len() > 1);
    for line in &lines {
      assert!(text_width(line, Face::Regular, 11.0) <= 200.0);
    }
    assert_eq!(lines.join(" "), text.trim());
  }

  #[test]
  fn long_word_is_broken() {
    let word = "x".repeat(200);
    let lines = wrap_text(&word, Face::Regular, 11.0, 50.0);
    assert!(lines.len() > 1);
    assert_eq!(lines.concat(), word);
  }

  #[test]
  fn empty_text_yields_single_empty_line() {
    assert_eq!(wrap_text("   ", Face::Regular, 11.0, 100.0), vec![String::new()]);
  }
}
