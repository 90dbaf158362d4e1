//! # 剪贴板写入模块
//!
//! ## 设计思路
//!
//! “复制条目”把一个已捕获的条目原样写回系统剪贴板。写入本身会触发一次变化通知，
//! 因此写入前通过 `IgnoreGuard` 置位抑制门，写入成功后提交，失败则自动撤销。
//!
//! - 文本：原样写入
//! - 图片：PNG 解码为 RGBA 后写入
//! - 文件：写入 `file://` 地址文本（百分号编码）

use std::path::Path;
use std::sync::Arc;

use super::{ClipboardItem, IgnoreGuard, ItemPayload, SuppressionGate};
use crate::error::AppError;
use crate::image_handler::decode_to_rgba;

/// 剪贴板写入端（系统剪贴板或测试替身）。
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), AppError>;
    fn write_image(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), AppError>;
}

/// arboard 实现。
#[derive(Default)]
pub struct ArboardSink {
    clipboard: Option<arboard::Clipboard>,
}

impl ArboardSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn clipboard(&mut self) -> Result<&mut arboard::Clipboard, AppError> {
        if self.clipboard.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| AppError::Clipboard(format!("打开剪贴板失败: {}", e)))?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| AppError::Clipboard("剪贴板不可用".to_string()))
    }
}

impl ClipboardSink for ArboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), AppError> {
        let result = self
            .clipboard()?
            .set_text(text.to_string())
            .map_err(|e| AppError::Clipboard(format!("写入文本失败: {}", e)));
        if result.is_err() {
            self.clipboard = None;
        }
        result
    }

    fn write_image(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), AppError> {
        let image = arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: rgba.into(),
        };
        let result = self
            .clipboard()?
            .set_image(image)
            .map_err(|e| AppError::Clipboard(format!("写入图片失败: {}", e)));
        if result.is_err() {
            self.clipboard = None;
        }
        result
    }
}

/// 条目回写器。
pub struct ClipboardWriter<S: ClipboardSink> {
    gate: Arc<SuppressionGate>,
    sink: S,
}

impl<S: ClipboardSink> ClipboardWriter<S> {
    pub fn new(gate: Arc<SuppressionGate>, sink: S) -> Self {
        Self { gate, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// 将条目写回剪贴板；成功后恰好抑制下一次变化通知。
    pub fn copy_item(&mut self, item: &ClipboardItem) -> Result<(), AppError> {
        // 解码放在置位之前，失败时不影响抑制门
        let image = match item.payload() {
            ItemPayload::Image(payload) => Some(decode_to_rgba(payload)?),
            _ => None,
        };

        let guard = IgnoreGuard::new(&self.gate);
        match (item.payload(), image) {
            (ItemPayload::Text(text), _) => self.sink.write_text(text)?,
            (ItemPayload::Image(_), Some((width, height, rgba))) => {
                self.sink.write_image(width, height, rgba)?
            }
            (ItemPayload::File(path), _) => self.sink.write_text(&path_to_file_uri(path))?,
            (ItemPayload::Image(_), None) => {
                return Err(AppError::Clipboard("图片数据缺失".to_string()));
            }
        }
        guard.commit();

        log::info!("📋 已复制条目到剪贴板: {}", item.summary());
        Ok(())
    }
}

/// 本地路径转 `file://` 地址；无法转为绝对地址时按段手工编码。
pub fn path_to_file_uri(path: &Path) -> String {
    if let Ok(url) = reqwest::Url::from_file_path(path) {
        return url.to_string();
    }

    let raw = path.to_string_lossy().replace('\\', "/");
    let encoded: Vec<String> = raw
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    let joined = encoded.join("/");
    if joined.starts_with('/') {
        format!("file://{}", joined)
    } else {
        format!("file:///{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_handler::encode_rgba_as_png;

    #[derive(Default)]
    struct RecordingSink {
        texts: Vec<String>,
        images: Vec<(u32, u32, usize)>,
        fail: bool,
    }

    impl ClipboardSink for RecordingSink {
        fn write_text(&mut self, text: &str) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Clipboard("busy".to_string()));
            }
            self.texts.push(text.to_string());
            Ok(())
        }

        fn write_image(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<(), AppError> {
            self.images.push((width, height, rgba.len()));
            Ok(())
        }
    }

    #[test]
    fn text_copy_arms_gate() {
        let gate = SuppressionGate::new();
        let mut writer = ClipboardWriter::new(Arc::clone(&gate), RecordingSink::default());

        writer.copy_item(&ClipboardItem::text("hello")).expect("copy failed");

        assert_eq!(writer.sink().texts, vec!["hello".to_string()]);
        assert!(gate.is_armed());
    }

    #[test]
    fn failed_write_leaves_gate_disarmed() {
        let gate = SuppressionGate::new();
        let sink = RecordingSink { fail: true, ..Default::default() };
        let mut writer = ClipboardWriter::new(Arc::clone(&gate), sink);

        assert!(writer.copy_item(&ClipboardItem::text("hello")).is_err());
        assert!(!gate.is_armed());
    }

    #[test]
    fn image_copy_writes_rgba() {
        let gate = SuppressionGate::new();
        let mut writer = ClipboardWriter::new(Arc::clone(&gate), RecordingSink::default());
        let payload = encode_rgba_as_png(3, 2, vec![9; 24]).expect("encode failed");

        writer.copy_item(&ClipboardItem::image(payload)).expect("copy failed");

        assert_eq!(writer.sink().images, vec![(3, 2, 24)]);
    }

    #[cfg(unix)]
    #[test]
    fn file_copy_writes_encoded_uri() {
        let gate = SuppressionGate::new();
        let mut writer = ClipboardWriter::new(gate, RecordingSink::default());

        writer
            .copy_item(&ClipboardItem::file("application", "/tmp/my docs/a.pdf"))
            .expect("copy failed");

        assert_eq!(writer.sink().texts, vec!["file:///tmp/my%20docs/a.pdf".to_string()]);
    }
}
