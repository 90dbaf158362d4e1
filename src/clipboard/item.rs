//! 剪贴板条目模型
//!
//! 条目创建后不可变；只存在于内存中的条目列表里，清空面板或进程退出即丢弃。

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::image_handler::ImagePayload;

/// 条目类型。`File` 携带 MIME 顶级类别（如 `application`、`text`、`audio`）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Text,
    Image,
    File(String),
}

/// 条目负载。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemPayload {
    Text(String),
    Image(ImagePayload),
    File(PathBuf),
}

/// 一次剪贴板捕获的分类结果。
#[derive(Debug, Clone)]
pub struct ClipboardItem {
    kind: ItemKind,
    payload: ItemPayload,
    captured_at: DateTime<Local>,
    display_name: String,
}

impl ClipboardItem {
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: ItemKind::Text,
            display_name: text.clone(),
            payload: ItemPayload::Text(text),
            captured_at: Local::now(),
        }
    }

    pub fn image(image: ImagePayload) -> Self {
        Self {
            kind: ItemKind::Image,
            display_name: image.describe(),
            payload: ItemPayload::Image(image),
            captured_at: Local::now(),
        }
    }

    /// 非图片文件条目，显示名为文件基名。
    pub fn file(category: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Self {
            kind: ItemKind::File(category.into()),
            payload: ItemPayload::File(path),
            captured_at: Local::now(),
            display_name,
        }
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn payload(&self) -> &ItemPayload {
        &self.payload
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    /// 卡片头部显示的时间（`HH:MM`）。
    pub fn captured_at_label(&self) -> String {
        self.captured_at.format("%H:%M").to_string()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.payload {
            ItemPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImagePayload> {
        match &self.payload {
            ItemPayload::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&Path> {
        match &self.payload {
            ItemPayload::File(path) => Some(path),
            _ => None,
        }
    }

    /// 日志用的一行摘要，文本只截取前 40 个字符。
    pub fn summary(&self) -> String {
        match &self.kind {
            ItemKind::Text => {
                let preview: String = self.display_name.chars().take(40).collect();
                format!("文本 {:?}", preview)
            }
            ItemKind::Image => self.display_name.clone(),
            ItemKind::File(category) => format!("{} 文件: {}", category, self.display_name),
        }
    }
}
