//! 类名索引：解压后的文档包附带 `class_index.json`，列出每个类的文档页。
//!
//! ```json
//! [{"class_name": "java.lang.String", "path": "jdk8/api/java/lang/String.html"}]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ResourceError;
use super::index::ResourceLocation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub class_name: String,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ClassIndex {
    entries: Vec<ClassEntry>,
    extract_root: PathBuf,
}

impl ClassIndex {
    pub fn empty(extract_root: impl Into<PathBuf>) -> Self {
        Self {
            entries: Vec::new(),
            extract_root: extract_root.into(),
        }
    }

    pub fn open(index_path: &Path, extract_root: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let json = std::fs::read_to_string(index_path)
            .map_err(|e| ResourceError::Config(format!("无法读取类索引 {}：{}", index_path.display(), e)))?;
        let entries: Vec<ClassEntry> = serde_json::from_str(&json)
            .map_err(|e| ResourceError::Config(format!("类索引格式错误：{}", e)))?;

        Ok(Self {
            entries,
            extract_root: extract_root.into(),
        })
    }

    /// 读取类索引；文档包尚未下载时返回空索引并记录警告。
    pub fn load(index_path: &Path, extract_root: impl Into<PathBuf>) -> Self {
        let extract_root = extract_root.into();
        match Self::open(index_path, extract_root.clone()) {
            Ok(index) => {
                log::info!("📖 已加载类索引（{} 个类）", index.len());
                index
            }
            Err(e) => {
                log::warn!("⚠️ {}", e);
                Self::empty(extract_root)
            }
        }
    }

    /// 类名不区分大小写的子串匹配；空查询无结果。
    pub fn search(&self, query: &str) -> Vec<&ClassEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|entry| entry.class_name.to_lowercase().contains(&needle))
            .collect()
    }

    /// 文档页的本地位置（相对路径拼到解压根目录）。调用方用 `exists()` 判断是否可打开。
    pub fn document_path(&self, path: &str) -> ResourceLocation {
        ResourceLocation::Local(self.extract_root.join(path))
    }

    pub fn entries(&self) -> &[ClassEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
