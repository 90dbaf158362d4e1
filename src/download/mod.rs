//! # 文档包下载模块（download）
//!
//! ## 设计思路
//!
//! 资源解析未命中时，需要在后台把一组文档压缩包下载到本地并解压。
//! 本模块按职责拆分：
//!
//! - `fetch`：单文件流式下载（超时、取消、部分文件处理）
//! - `extract`：调用外部解压工具
//! - `progress`：进度分配与单调跟踪
//! - `worker`：任务编排、线程与事件通道
//! - `job/config/error`：任务视图、配置、错误
//!
//! ```text
//! 调用方线程                     后台线程
//!   spawn ───────────────────▶  download_all ─▶ extract
//!   DownloadHandle ◀── mpsc ──  Progress* … Done | Failed | Cancelled
//! ```

mod config;
mod error;
mod extract;
mod fetch;
mod job;
mod progress;
mod worker;

pub use config::DownloadConfig;
pub use error::DownloadError;
pub use extract::{Extractor, is_archive};
pub use fetch::file_name_from_url;
pub use job::{DownloadEvent, DownloadJob, FailureReport, JobState, Phase, ProgressUpdate};
pub use progress::{ProgressPlan, ProgressTracker};
pub use worker::{DownloadHandle, DownloadWorker};
