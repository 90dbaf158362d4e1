//! # 配置模块
//!
//! 将图片加载阶段的所有“可调阈值”集中到 `ImageConfig`。
//! 字段全部带 `serde(default)`，可直接嵌入设置文件的 `image` 段。

use serde::{Deserialize, Serialize};

/// 图片加载配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 读取原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 网络下载总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
    /// 首包超时（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 分块读取超时（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            max_redirects: 5,
            max_decoded_pixels: 40_000_000,
        }
    }
}
