//! 剪贴板内容分类器
//!
//! # 设计思路
//!
//! 把一次剪贴板快照归类为文本 / 图片 / 文件条目，规则按顺序匹配，先命中者胜出：
//!
//! 1. 图片 Data URI：解码成功则为图片；任何解码失败都回落到后续规则
//! 2. `file://` 开头：解码路径、按扩展名猜 MIME；位图则加载为图片条目，否则（含 SVG 等矢量图）为文件条目
//! 3. `http` 开头：视为图片地址，经网络协作者同步抓取；失败只记日志
//! 4. 其他文本：原样作为文本条目
//! 5. 无文本、只有原始图像数据：图片条目
//!
//! 所有失败都是非致命的：记录警告，丢弃候选条目，绝不 panic。

use std::path::PathBuf;

use super::item::ClipboardItem;
use super::mime::{guess_mime_type, is_decodable_image, mime_category};
use crate::image_handler::{
    self, HttpImageFetcher, ImageConfig, ImageError, ImageFetcher, ImageLoader, encode_rgba_as_png,
    match_data_uri,
};
use crate::net::redact_url_for_log;

const FILE_URI_PREFIX: &str = "file://";

/// 从系统剪贴板读到的原始快照。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardSnapshot {
    /// 剪贴板含文本表示（优先于图像）。
    Text(String),
    /// 仅有原始图像数据（RGBA8）。
    Image { width: u32, height: u32, rgba: Vec<u8> },
    /// 剪贴板为空或格式不受支持。
    Empty,
}

/// 内容分类器。
pub struct ContentClassifier {
    loader: ImageLoader,
    fetcher: Box<dyn ImageFetcher>,
}

impl ContentClassifier {
    /// 使用默认 HTTP 抓取器创建分类器。
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        let fetcher = HttpImageFetcher::new(config.clone())?;
        Self::with_fetcher(config, Box::new(fetcher))
    }

    /// 注入自定义网络协作者（测试或离线场景）。
    pub fn with_fetcher(config: ImageConfig, fetcher: Box<dyn ImageFetcher>) -> Result<Self, ImageError> {
        Ok(Self {
            loader: ImageLoader::new(config)?,
            fetcher,
        })
    }

    /// 分类入口：返回 `None` 表示本次快照不产生条目。
    pub fn classify(&self, snapshot: &ClipboardSnapshot) -> Option<ClipboardItem> {
        match snapshot {
            ClipboardSnapshot::Text(text) => self.classify_text(text),
            ClipboardSnapshot::Image { width, height, rgba } => {
                match encode_rgba_as_png(*width, *height, rgba.clone()) {
                    Ok(payload) => Some(ClipboardItem::image(payload)),
                    Err(err) => {
                        log::warn!("⚠️ 剪贴板图像数据无法编码，已丢弃: {}", err);
                        None
                    }
                }
            }
            ClipboardSnapshot::Empty => None,
        }
    }

    fn classify_text(&self, text: &str) -> Option<ClipboardItem> {
        if text.is_empty() {
            log::debug!("⏭️ 剪贴板文本为空，跳过");
            return None;
        }

        if match_data_uri(text).is_some() {
            match image_handler::load_image_from_data_uri(&self.loader, text) {
                Ok(payload) => return Some(ClipboardItem::image(payload)),
                Err(err) => log::warn!("⚠️ Base64 图片解析失败，按普通文本处理 [{}]: {}", err.code(), err),
            }
        }

        if text.starts_with(FILE_URI_PREFIX) {
            return self.classify_file_uri(text);
        }

        if text.starts_with("http") {
            return self.classify_http_url(text);
        }

        Some(ClipboardItem::text(text))
    }

    fn classify_file_uri(&self, text: &str) -> Option<ClipboardItem> {
        let Some(path) = file_uri_to_path(text) else {
            log::warn!("⚠️ 无法解析文件地址: {}", text.lines().next().unwrap_or_default());
            return None;
        };

        let Some(mime) = guess_mime_type(&path) else {
            log::warn!("⚠️ 无法识别文件类型，已忽略: {}", path.display());
            return None;
        };

        let category = mime_category(mime);
        if is_decodable_image(mime) {
            return match image_handler::load_image_from_file(&self.loader, &path) {
                Ok(payload) => Some(ClipboardItem::image(payload)),
                Err(err) => {
                    log::warn!("⚠️ 本地图片加载失败 {} [{}]: {}", path.display(), err.code(), err);
                    None
                }
            };
        }

        Some(ClipboardItem::file(category, path))
    }

    fn classify_http_url(&self, text: &str) -> Option<ClipboardItem> {
        let url = text.trim();
        match self.fetcher.fetch(url) {
            Ok(payload) => Some(ClipboardItem::image(payload)),
            Err(err) => {
                log::warn!("⚠️ 下载图片失败 {} [{}]: {}", redact_url_for_log(url), err.code(), err);
                None
            }
        }
    }
}

/// 将 `file://` 地址转换为本地路径（取第一行，百分号解码）。
pub fn file_uri_to_path(text: &str) -> Option<PathBuf> {
    let first = text.lines().map(str::trim).find(|line| !line.is_empty())?;

    if let Ok(url) = reqwest::Url::parse(first) {
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                return Some(path);
            }
        }
    }

    let raw = first.strip_prefix(FILE_URI_PREFIX)?;
    let decoded = urlencoding::decode(raw).ok()?;
    if decoded.is_empty() {
        return None;
    }
    Some(PathBuf::from(decoded.into_owned()))
}
