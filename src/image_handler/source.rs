//! # 数据源与中间模型
//!
//! - `RawImageData`：已加载但未校验解码的字节
//! - `ImagePayload`：通过解码校验、可直接交给界面渲染的图片

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 经过解码校验的图片。
///
/// `bytes` 保留编码后的原始文件字节（PNG/JPEG/...），避免在内存中长期持有 RGBA 像素。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub width: u32,
    pub height: u32,
    /// 小写格式名，例如 `png`、`jpeg`。
    pub format: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// 界面卡片上显示的简短描述。
    pub fn describe(&self) -> String {
        format!("图片 {}×{} ({})", self.width, self.height, self.format)
    }
}
