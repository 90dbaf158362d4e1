//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 分类器拿到的三种文本（Data URI / `file://` 路径 / 图片地址）最终都要变成一段图片字节。
//! 这里只负责“拿到字节并确认它像图片”，真正解码交给 `pipeline`。
//!
//! ## 实现思路
//!
//! - 所有来源共用同一个签名嗅探 `sniff`（基于 `infer`），结果分为 图片 / 非图片 / 字节不足
//! - 体积上限统一由 `ensure_within_limit` 检查：Data URI 在解码前按估算值检查，
//!   文件按 metadata 检查，网络按 Content-Length 与累计字节检查
//! - 网络读取在首块与后续块上分别套超时；前 4KB 内无法识别即放弃，避免把网页整页读完

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::time::Duration;

use super::source::RawImageData;
use super::{ImageConfig, ImageError};
use crate::net;

const SNIFF_WINDOW: usize = 4096;
const DEFAULT_BUFFER: usize = 16 * 1024;

/// `data:image/<fmt>;base64,<payload>`，payload 中不允许出现双引号。
static DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^data:image/([a-zA-Z0-9.+-]*);base64,([^"]*)$"#).expect("data uri pattern must compile")
});

/// 判断文本是否为图片 Data URI，返回 `(格式, base64 负载)`。
pub fn match_data_uri(text: &str) -> Option<(&str, &str)> {
    let captures = DATA_URI.captures(text.trim())?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

/// 签名嗅探结果。
#[derive(Debug, PartialEq, Eq)]
enum Sniff {
    Image,
    Other(&'static str),
    Unknown,
}

fn sniff(bytes: &[u8]) -> Sniff {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Sniff::Image,
        Some(kind) => Sniff::Other(kind.mime_type()),
        None => Sniff::Unknown,
    }
}

/// 完整字节的签名校验：必须识别为图片。
fn require_image(bytes: &[u8]) -> Result<(), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::InvalidFormat("内容为空".to_string()));
    }
    match sniff(bytes) {
        Sniff::Image => Ok(()),
        Sniff::Other(mime) => Err(ImageError::InvalidFormat(format!("签名显示为 {}，不是图片", mime))),
        Sniff::Unknown => Err(ImageError::InvalidFormat("无法从签名识别图片类型".to_string())),
    }
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

fn ensure_within_limit(what: &str, size: u64, limit: u64) -> Result<(), ImageError> {
    if size > limit {
        return Err(ImageError::ResourceLimit(format!(
            "{}过大：{:.2} MB，上限 {:.2} MB",
            what,
            megabytes(size),
            megabytes(limit)
        )));
    }
    Ok(())
}

/// 图片加载器：持有配置与复用的 HTTP 客户端。
pub struct ImageLoader {
    config: ImageConfig,
    client: reqwest::Client,
}

impl ImageLoader {
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        let client = net::build_client(
            Duration::from_secs(config.connect_timeout),
            Some(Duration::from_secs(config.download_timeout)),
            config.max_redirects,
        )
        .map_err(|e| ImageError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub(crate) fn load_from_data_uri(&self, text: &str) -> Result<RawImageData, ImageError> {
        let (_, payload) =
            match_data_uri(text).ok_or_else(|| ImageError::InvalidFormat("不是图片 Data URI".to_string()))?;

        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        // base64 每 4 个字符最多还原 3 个字节
        let estimated = (compact.len() as u64).saturating_add(3) / 4 * 3;
        ensure_within_limit("Base64 负载", estimated, self.config.max_file_size)?;

        let bytes = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))?;
        require_image(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    pub(crate) fn load_from_file(&self, path: &Path) -> Result<RawImageData, ImageError> {
        log::debug!("📁 读取本地图片: {}", path.display());

        let metadata = std::fs::metadata(path)
            .map_err(|e| ImageError::FileSystem(format!("{}：{}", path.display(), e)))?;
        if !metadata.is_file() {
            return Err(ImageError::FileSystem(format!("不是普通文件：{}", path.display())));
        }
        ensure_within_limit("文件", metadata.len(), self.config.max_file_size)?;

        let bytes = std::fs::read(path).map_err(|e| ImageError::FileSystem(format!("读取失败：{}", e)))?;
        require_image(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    pub(crate) async fn load_from_url(&self, url: &str) -> Result<RawImageData, ImageError> {
        log::info!("🌐 开始下载图片: {}", net::redact_url_for_log(url));

        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|e| ImageError::InvalidFormat(format!("URL 格式错误：{}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ImageError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
        }

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(ImageError::Network(format!("HTTP {}: {}", status, net::status_message(status))));
        }

        let declared_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(content_type) = declared_type.filter(|ct| !is_image_content_type(ct)) {
            return Err(ImageError::InvalidFormat(format!("服务端返回 {}，不是图片", content_type)));
        }

        let limit = self.config.max_file_size;
        let declared_len = net::content_length(&response);
        if let Some(len) = declared_len {
            ensure_within_limit("远程图片", len, limit)?;
        }

        let capacity = declared_len.filter(|len| *len > 0).map_or(DEFAULT_BUFFER, |len| len.min(limit) as usize);
        let mut body = Vec::with_capacity(capacity);
        let mut recognized = false;

        loop {
            let (timeout, stage) = if body.is_empty() {
                (self.config.stream_first_byte_timeout_ms, "等待首个数据块超时")
            } else {
                (self.config.stream_chunk_timeout_ms, "数据流读取超时")
            };

            let chunk = tokio::time::timeout(Duration::from_millis(timeout), response.chunk())
                .await
                .map_err(|_| ImageError::Timeout(stage.to_string()))?
                .map_err(|e| ImageError::Network(format!("读取响应失败：{}", e.without_url())))?;

            let Some(chunk) = chunk else { break };
            ensure_within_limit("远程图片", (body.len() + chunk.len()) as u64, limit)?;
            body.extend_from_slice(&chunk);

            if !recognized {
                recognized = match sniff(&body) {
                    Sniff::Image => true,
                    Sniff::Other(mime) => {
                        return Err(ImageError::InvalidFormat(format!("下载内容为 {}，不是图片", mime)));
                    }
                    Sniff::Unknown if body.len() >= SNIFF_WINDOW => {
                        return Err(ImageError::InvalidFormat(format!(
                            "前 {} 字节内无法识别图片类型",
                            SNIFF_WINDOW
                        )));
                    }
                    Sniff::Unknown => false,
                };
            }
        }

        if !recognized {
            require_image(&body)?;
        }

        log::debug!("✅ 图片下载完成 - {} bytes", body.len());
        Ok(RawImageData {
            bytes: body,
            source_hint: "url",
        })
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> ImageError {
        if e.is_timeout() {
            ImageError::Timeout(format!("请求超过 {} 秒", self.config.download_timeout))
        } else if e.is_connect() {
            ImageError::Network(format!("无法连接：{}", e.without_url()))
        } else {
            ImageError::Network(format!("请求失败：{}", e.without_url()))
        }
    }
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
}
