//! # 图片加载模块（image_handler）
//!
//! ## 设计思路
//!
//! 剪贴板分类器需要从三种文本形态中“取出一张图片”：Data URI、`file://` 指向的本地图片、
//! 以及 HTTP 图片地址；另外还要把剪贴板原始 RGBA 转成统一表示。
//! 本模块按职责拆分：
//!
//! - `loader`：来源加载 + 体积 / 签名校验
//! - `pipeline`：尺寸检查 + 完整解码校验 + RGBA ↔ PNG
//! - `fetcher`：同步抓取适配（分类器的网络协作者）
//! - `config/error/source`：配置、错误、数据模型
//!
//! ```text
//! 分类器
//!    ├─ load_image_from_data_uri ─┐
//!    ├─ load_image_from_file ─────┼─ loader → pipeline → ImagePayload
//!    └─ ImageFetcher::fetch ──────┘
//! ```

mod config;
mod error;
mod fetcher;
mod loader;
mod pipeline;
mod source;

use std::path::Path;

pub use config::ImageConfig;
pub use error::ImageError;
pub use fetcher::{HttpImageFetcher, ImageFetcher};
pub use loader::{ImageLoader, match_data_uri};
pub use pipeline::{decode_to_rgba, encode_rgba_as_png};
pub use source::ImagePayload;

/// 解码 Data URI 文本为图片；任何失败都返回错误，由调用方决定是否回落。
pub fn load_image_from_data_uri(loader: &ImageLoader, text: &str) -> Result<ImagePayload, ImageError> {
    let raw = loader.load_from_data_uri(text)?;
    pipeline::decode_and_validate(raw, loader.config())
}

/// 读取并校验本地图片文件。
pub fn load_image_from_file(loader: &ImageLoader, path: &Path) -> Result<ImagePayload, ImageError> {
    let raw = loader.load_from_file(path)?;
    pipeline::decode_and_validate(raw, loader.config())
}
