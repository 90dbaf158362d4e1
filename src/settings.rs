//! 应用设置
//!
//! # 设计思路
//!
//! 不使用全局可变配置：组合根（`main.rs`）构造一个 `AppSettings`，按段分发给各组件。
//! 设置文件为 JSON，每个字段都带默认值，缺失的段或字段回落到默认。
//!
//! # 实现思路
//!
//! - 路径段只记录覆盖项，`resolve()` 统一换算成绝对可用的 `ResolvedPaths`；
//!   相对路径拼到 `base_dir`，解压根目录下的类索引跟随解压根目录。
//! - `load`：文件缺失 → 默认值；格式错误 → 默认值并记录错误。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::download::DownloadConfig;
use crate::error::AppError;
use crate::image_handler::ImageConfig;
use crate::shortcut::Shortcut;

#[cfg(windows)]
const DEFAULT_EXTRACTOR: &str = "jy/7z.exe";
#[cfg(not(windows))]
const DEFAULT_EXTRACTOR: &str = "jy/7z";

/// 路径覆盖项；未设置的项使用基于 `base_dir` 的默认布局。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub base_dir: PathBuf,
    pub download_dir: Option<PathBuf>,
    pub extract_root: Option<PathBuf>,
    pub extractor: Option<PathBuf>,
    pub resource_index: Option<PathBuf>,
    pub download_links: Option<PathBuf>,
    pub class_index: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            download_dir: None,
            extract_root: None,
            extractor: None,
            resource_index: None,
            download_links: None,
            class_index: None,
            log_file: None,
        }
    }
}

/// 换算后的路径布局。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPaths {
    pub base_dir: PathBuf,
    pub download_dir: PathBuf,
    pub extract_root: PathBuf,
    pub extractor: PathBuf,
    pub resource_index: PathBuf,
    pub download_links: PathBuf,
    pub class_index: PathBuf,
    pub log_file: PathBuf,
}

impl PathSettings {
    pub fn resolve(&self) -> ResolvedPaths {
        let base = &self.base_dir;
        let pick = |value: &Option<PathBuf>, default: &str| match value {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join(default),
        };

        let extract_root = pick(&self.extract_root, "extracted");
        let class_index = match &self.class_index {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => extract_root.join("jdk8").join("class_index.json"),
        };

        ResolvedPaths {
            base_dir: base.clone(),
            download_dir: pick(&self.download_dir, "downloads"),
            extractor: pick(&self.extractor, DEFAULT_EXTRACTOR),
            resource_index: pick(&self.resource_index, "zy/resources.json"),
            download_links: pick(&self.download_links, "zy/wd.json"),
            log_file: pick(&self.log_file, "logs.txt"),
            class_index,
            extract_root,
        }
    }
}

/// 日志设置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// 默认过滤级别，`RUST_LOG` 优先。
    pub level: String,
    /// 写入日志文件；关闭时输出到 stderr。
    pub to_file: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            to_file: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub paths: PathSettings,
    pub image: ImageConfig,
    pub download: DownloadConfig,
    pub shortcut: Shortcut,
    pub log: LogSettings,
}

impl AppSettings {
    /// 读取设置文件：`Ok(None)` 表示文件不存在。
    pub fn try_load(path: &Path) -> Result<Option<Self>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<Self>(&content)
            .map_err(|e| AppError::Config(format!("解析设置文件失败: {}", e)))?;
        Ok(Some(parsed))
    }

    /// 读取设置文件；缺失或格式错误时使用默认值。
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                log::info!("⚙️ 未找到设置文件 {}，使用默认设置", path.display());
                Self::default()
            }
            Err(e) => {
                log::error!("❌ 设置文件 {} 无效，使用默认设置: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("创建设置目录失败: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Storage(format!("序列化设置失败: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.paths.base_dir = base_dir.into();
        self
    }

    pub fn resolved_paths(&self) -> ResolvedPaths {
        self.paths.resolve()
    }
}
