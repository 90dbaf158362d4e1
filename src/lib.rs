//! # clipdesk — 剪贴板 / 文档知识库工具库
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            外部界面（悬浮面板 / 内嵌文档查看器）          │
//! │    ClipboardItem 卡片        ResourceLocation / 进度条    │
//! └───────┬───────────────────────────────┬──────────────────┘
//!         ↑ mpsc<ClipboardItem>           ↑ mpsc<DownloadEvent>
//! ┌───────┼───────────────────────────────┼──────────────────┐
//! │  ┌─ clipboard ─────────────────┐  ┌─ resources ───────┐  │
//! │  │  listener (clipboard-master)│  │  index / links    │  │
//! │  │  SuppressionGate (一次性)   │  │  class_index      │  │
//! │  │  classifier ─▶ image_handler│  │  resolver ──┐     │  │
//! │  │  writer (IgnoreGuard)       │  └─────────────┼─────┘  │
//! │  └─────────────────────────────┘                ↓        │
//! │                                   ┌─ download ─────────┐ │
//! │  settings · logging · storage     │ fetch → extract    │ │
//! │  error · net · shortcut           │ worker / progress  │ │
//! │                                   └────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`clipboard`] | 剪贴板监控、内容分类、自身写入抑制、条目回写 |
//! | [`image_handler`] | 从 Data URI / 本地文件 / URL 加载并校验图片 |
//! | [`download`] | 后台下载 + 外部工具解压，进度事件与协作式取消 |
//! | [`resources`] | 资源索引、下载地址表、类名索引、解析器 |
//! | [`settings`] | JSON 设置文件与路径布局 |
//! | [`logging`] | `env_logger` 初始化，追加写入日志文件 |
//! | [`storage`] | 目录创建与占用统计 |
//! | [`shortcut`] | 面板快捷键解析 |

pub mod clipboard;
pub mod download;
pub mod error;
pub mod image_handler;
pub mod logging;
pub mod net;
pub mod resources;
pub mod settings;
pub mod shortcut;
pub mod storage;
