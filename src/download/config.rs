//! 下载任务配置，嵌入设置文件的 `download` 段。

use serde::{Deserialize, Serialize};

use super::progress::ProgressPlan;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
    /// 首包超时（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 分块读取超时（毫秒）。文档包较大，不设整体超时。
    pub stream_chunk_timeout_ms: u64,
    pub max_redirects: usize,
    /// 解压时覆盖已有文件（`-y`）。
    pub overwrite: bool,
    /// 解压时启用多线程（`-mmt`）。
    pub multithread: bool,
    pub progress: ProgressPlan,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
            stream_first_byte_timeout_ms: 15_000,
            stream_chunk_timeout_ms: 30_000,
            max_redirects: 10,
            overwrite: true,
            multithread: true,
            progress: ProgressPlan::default(),
        }
    }
}
