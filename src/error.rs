//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各子系统各自定义细分错误（`ImageError` / `DownloadError` / `ResourceError`），
//! 组合根与命令行入口统一使用 `AppError`，通过 `#[from]` 自动上转，无需手动 map。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 实现 `Serialize` 将错误序列化为字符串，便于外部界面直接展示。

use serde::Serialize;

use crate::download::DownloadError;
use crate::image_handler::ImageError;
use crate::resources::ResourceError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 剪贴板读写操作失败
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 图片加载 / 解码错误
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 下载或解压任务错误
    #[error("{0}")]
    Download(#[from] DownloadError),

    /// 资源索引 / 解析错误
    #[error("{0}")]
    Resource(#[from] ResourceError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 存储目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),

    /// 配置加载或校验失败
    #[error("配置错误: {0}")]
    Config(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_serializes_as_plain_message() {
        let err = AppError::Config("快捷键无效".to_string());
        let json = serde_json::to_string(&err).expect("serialize failed");
        assert_eq!(json, "\"配置错误: 快捷键无效\"");
    }

    #[test]
    fn image_error_converts_transparently() {
        let err: AppError = ImageError::Decode("坏数据".to_string()).into();
        assert_eq!(err.to_string(), "解码错误：坏数据");
    }
}
