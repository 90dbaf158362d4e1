//! 本地目录管理模块
//!
//! # 设计思路
//!
//! 下载目录与解压目录都按需创建，上层无需事先判断是否存在。
//! `status` 命令需要展示每个目录的占用情况（文件数 + 总大小）。
//!
//! # 实现思路
//!
//! - 目录不存在时自动 `create_dir_all`。
//! - 统计时递归遍历；单个条目读取失败只跳过，不中断统计。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 目录信息
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub exists: bool,
    pub total_size: u64,
    pub file_count: u64,
}

/// 确保目录存在并返回其路径
///
/// # 返回
/// - `Ok(PathBuf)` — 可用目录
/// - `Err(AppError::Storage)` — 无法创建
pub fn ensure_dir(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            AppError::Storage(format!("创建目录 '{}' 失败: {}", path.display(), e))
        })?;
        log::debug!("📁 已创建目录 {}", path.display());
    }
    Ok(path.to_path_buf())
}

/// 获取目录信息（路径 + 占用大小 + 文件数）；目录不存在时计数为 0
pub fn dir_info(path: &Path) -> StorageInfo {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;
    let exists = path.is_dir();

    if exists {
        accumulate(path, &mut total_size, &mut file_count);
    }

    StorageInfo {
        path: path.to_string_lossy().to_string(),
        exists,
        total_size,
        file_count,
    }
}

fn accumulate(dir: &Path, total_size: &mut u64, file_count: &mut u64) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if metadata.is_dir() {
            accumulate(&entry.path(), total_size, file_count);
        } else if metadata.is_file() {
            *total_size += metadata.len();
            *file_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let nested = dir.path().join("a/b/c");
        let created = ensure_dir(&nested).expect("ensure_dir failed");
        assert!(created.is_dir());
    }

    #[test]
    fn dir_info_counts_files_recursively() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        fs::write(dir.path().join("a.bin"), [0u8; 10]).expect("write failed");
        fs::create_dir(dir.path().join("sub")).expect("mkdir failed");
        fs::write(dir.path().join("sub/b.bin"), [0u8; 5]).expect("write failed");

        let info = dir_info(dir.path());
        assert!(info.exists);
        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 15);
    }

    #[test]
    fn missing_dir_reports_zero() {
        let info = dir_info(Path::new("/definitely/not/a/dir"));
        assert!(!info.exists);
        assert_eq!(info.file_count, 0);
    }
}
