//! # 文档资源模块（resources）
//!
//! ## 设计思路
//!
//! 内置文档浏览器需要把“逻辑资源键”映射为本地文件或远程地址：
//!
//! - `index`：资源树（分类 → 子分类 → 候选路径列表），只读
//! - `links`：资源键 → 下载地址列表
//! - `class_index`：文档包附带的类名索引与搜索
//! - `resolver`：解析、未命中触发下载、成功后重新解析一次
//!
//! ```text
//! resolve ──命中──▶ ResourceLocation ──▶ 外部查看器
//!    └─未命中─▶ start_download ─▶ DownloadWorker ─▶ finish_download ─▶ resolve（仅一次）
//! ```

mod class_index;
mod error;
mod index;
mod links;
mod resolver;

pub use class_index::{ClassEntry, ClassIndex};
pub use error::ResourceError;
pub use index::{ResourceHit, ResourceIndex, ResourceLocation, ResourceNode};
pub use links::{DownloadLinks, LEGACY_DEFAULT_KEY};
pub use resolver::{DownloadLauncher, Resolution, ResourceResolver};
