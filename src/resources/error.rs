use crate::download::DownloadError;

/// 资源索引 / 解析错误
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// 配置文件缺失或格式错误
    #[error("资源配置错误：{0}")]
    Config(String),

    /// 自动下载之后仍未找到
    #[error("资源不可用：{0}")]
    Unavailable(String),

    /// 下载地址表中没有对应条目
    #[error("未配置下载地址：{0}")]
    NoDownloadSource(String),

    #[error("资源下载失败：{0}")]
    DownloadFailed(String),

    #[error("资源下载已取消：{0}")]
    DownloadCancelled(String),

    #[error("{0}")]
    Download(#[from] DownloadError),
}
