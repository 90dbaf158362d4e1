//! # 下载任务错误类型
//!
//! 每个变体都带稳定的 `code()` 与 `stage()`，写入 `Failed` 事件，
//! 调用方据此区分“网络问题”与“解压问题”而无需解析文案。

/// 下载 / 解压任务错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    #[error("下载地址无效：{0}")]
    InvalidUrl(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("下载超时：{0}")]
    Timeout(String),

    #[error("文件系统错误：{0}")]
    FileSystem(String),

    #[error("解压工具不存在：{0}")]
    ExtractorMissing(String),

    #[error("解压失败：{0}")]
    Extraction(String),

    #[error("下载任务已取消")]
    Cancelled,

    #[error("下载线程异常：{0}")]
    Worker(String),
}

impl DownloadError {
    /// 机器可读错误码。
    pub fn code(&self) -> &'static str {
        match self {
            DownloadError::InvalidUrl(_) => "invalid_url",
            DownloadError::Network(_) => "network",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::FileSystem(_) => "file_system",
            DownloadError::ExtractorMissing(_) => "extractor_missing",
            DownloadError::Extraction(_) => "extraction",
            DownloadError::Cancelled => "cancelled",
            DownloadError::Worker(_) => "worker",
        }
    }

    /// 出错阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            DownloadError::InvalidUrl(_) | DownloadError::Network(_) | DownloadError::Timeout(_) => {
                "download"
            }
            DownloadError::ExtractorMissing(_) | DownloadError::Extraction(_) => "extract",
            DownloadError::FileSystem(_) => "storage",
            DownloadError::Cancelled => "cancel",
            DownloadError::Worker(_) => "worker",
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        DownloadError::FileSystem(e.to_string())
    }
}
