//! # 单文件流式下载
//!
//! ## 实现思路
//!
//! - `response.chunk()` 逐块读取，首包与后续分块分别套 `tokio::time::timeout`
//! - 每块写入 `BufWriter` 后回调 `on_chunk(已下载, 总大小)`
//! - 取消标志在每次读块前后检查；取消时刷新并关闭文件，保留已写入的部分数据
//! - 其他失败删除不完整的文件，避免下次被当作“已存在”而跳过

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use super::config::DownloadConfig;
use super::error::DownloadError;
use crate::net;

const WRITE_BUFFER_CAPACITY: usize = 64 * 1024;

/// 从下载地址取目标文件名（最后一个路径段，百分号解码）。
pub fn file_name_from_url(url: &str) -> Result<String, DownloadError> {
    let parsed = reqwest::Url::parse(url.trim())
        .map_err(|e| DownloadError::InvalidUrl(format!("{}：{}", url, e)))?;

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| DownloadError::InvalidUrl(format!("地址缺少文件名：{}", net::redact_url_for_log(url))))?;

    let name = urlencoding::decode(segment)
        .map_err(|e| DownloadError::InvalidUrl(format!("文件名解码失败：{}", e)))?
        .into_owned();

    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(DownloadError::InvalidUrl(format!("非法文件名：{}", name)));
    }

    Ok(name)
}

pub(crate) struct Fetcher<'a> {
    client: &'a reqwest::Client,
    config: &'a DownloadConfig,
}

impl<'a> Fetcher<'a> {
    pub(crate) fn new(client: &'a reqwest::Client, config: &'a DownloadConfig) -> Self {
        Self { client, config }
    }

    /// 下载到 `dest`，返回写入的字节数。
    pub(crate) async fn fetch_to_file<P, C>(
        &self,
        url: &str,
        dest: &Path,
        on_chunk: P,
        is_cancelled: C,
    ) -> Result<u64, DownloadError>
    where
        P: FnMut(u64, Option<u64>),
        C: Fn() -> bool,
    {
        let result = self.stream_to_file(url, dest, on_chunk, is_cancelled).await;

        if let Err(err) = &result {
            if *err != DownloadError::Cancelled && dest.exists() {
                if let Err(e) = std::fs::remove_file(dest) {
                    log::warn!("⚠️ 清理不完整文件失败 {}: {}", dest.display(), e);
                }
            }
        }

        result
    }

    async fn stream_to_file<P, C>(
        &self,
        url: &str,
        dest: &Path,
        mut on_chunk: P,
        is_cancelled: C,
    ) -> Result<u64, DownloadError>
    where
        P: FnMut(u64, Option<u64>),
        C: Fn() -> bool,
    {
        let parsed = reqwest::Url::parse(url.trim())
            .map_err(|e| DownloadError::InvalidUrl(format!("{}：{}", url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(DownloadError::InvalidUrl("仅支持 HTTP/HTTPS".to_string()));
        }

        let first_byte_timeout = Duration::from_millis(self.config.stream_first_byte_timeout_ms);
        let chunk_timeout = Duration::from_millis(self.config.stream_chunk_timeout_ms);

        let response = tokio::time::timeout(first_byte_timeout, self.client.get(parsed).send())
            .await
            .map_err(|_| DownloadError::Timeout("等待响应超时".to_string()))?
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            return Err(DownloadError::Network(format!(
                "HTTP {}: {}",
                code,
                net::status_message(code)
            )));
        }

        let total_len = net::content_length(&response);
        let mut response = response;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, File::create(dest)?);
        let mut downloaded: u64 = 0;
        let mut received_first_chunk = false;

        on_chunk(0, total_len);

        loop {
            if is_cancelled() {
                return abandon(writer, dest);
            }

            let read_timeout = if received_first_chunk { chunk_timeout } else { first_byte_timeout };
            let next_chunk = tokio::time::timeout(read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    if received_first_chunk {
                        DownloadError::Timeout("下载数据流读取超时".to_string())
                    } else {
                        DownloadError::Timeout("下载首包超时".to_string())
                    }
                })?;

            let Some(chunk) = next_chunk.map_err(map_reqwest_error)? else {
                break;
            };
            received_first_chunk = true;

            if is_cancelled() {
                return abandon(writer, dest);
            }

            writer.write_all(&chunk)?;
            downloaded = downloaded.saturating_add(chunk.len() as u64);
            on_chunk(downloaded, total_len);
        }

        writer.flush()?;
        log::debug!("✅ 文件下载完成 - {} ({} bytes)", dest.display(), downloaded);
        Ok(downloaded)
    }
}

fn abandon(mut writer: BufWriter<File>, dest: &Path) -> Result<u64, DownloadError> {
    if let Err(e) = writer.flush() {
        log::warn!("⚠️ 取消时写入缓冲失败 {}: {}", dest.display(), e);
    }
    drop(writer);
    log::info!("⏹️ 下载已取消，保留部分文件: {}", dest.display());
    Err(DownloadError::Cancelled)
}

fn map_reqwest_error(e: reqwest::Error) -> DownloadError {
    if e.is_timeout() {
        DownloadError::Timeout(format!("请求超时：{}", e.without_url()))
    } else if e.is_connect() {
        DownloadError::Network(format!("无法连接：{}", e.without_url()))
    } else {
        DownloadError::Network(format!("请求失败：{}", e.without_url()))
    }
}
