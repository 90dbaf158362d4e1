//! # 外部解压工具
//!
//! 以子进程方式调用 7-Zip 兼容工具：
//!
//! ```text
//! <tool> x <archive> -o<output_dir> [-y] [-mmt]
//! ```
//!
//! 退出码 0 视为成功；其余情况携带 stderr 作为失败原因。

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::error::DownloadError;

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "7z", "tar", "gz", "tgz", "rar"];

/// 是否为需要解压的压缩包。分卷包只处理首卷（`.001`）。
pub fn is_archive(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();

    if ext.len() == 3 && ext.chars().all(|c| c.is_ascii_digit()) {
        return ext == "001";
    }

    ARCHIVE_EXTENSIONS.contains(&ext.as_str())
}

#[derive(Debug, Clone)]
pub struct Extractor {
    program: PathBuf,
    overwrite: bool,
    multithread: bool,
}

impl Extractor {
    pub fn new(program: impl Into<PathBuf>, overwrite: bool, multithread: bool) -> Self {
        Self {
            program: program.into(),
            overwrite,
            multithread,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// 带目录分隔符的配置路径必须真实存在；裸命令名交给 PATH 查找。
    pub fn is_available(&self) -> bool {
        if self.program.components().count() > 1 || self.program.is_absolute() {
            self.program.is_file()
        } else {
            true
        }
    }

    pub(crate) fn build_args(&self, archive: &Path, output_dir: &Path) -> Vec<OsString> {
        let mut out_flag = OsString::from("-o");
        out_flag.push(output_dir.as_os_str());

        let mut args = vec![OsString::from("x"), archive.as_os_str().to_os_string(), out_flag];
        if self.overwrite {
            args.push(OsString::from("-y"));
        }
        if self.multithread {
            args.push(OsString::from("-mmt"));
        }
        args
    }

    /// 解压 `archive` 到 `output_dir`。
    pub fn extract(&self, archive: &Path, output_dir: &Path) -> Result<(), DownloadError> {
        if !self.is_available() {
            return Err(DownloadError::ExtractorMissing(self.program.display().to_string()));
        }

        log::info!("📦 开始解压 {} -> {}", archive.display(), output_dir.display());

        let output = Command::new(&self.program)
            .args(self.build_args(archive, output_dir))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    DownloadError::ExtractorMissing(self.program.display().to_string())
                } else {
                    DownloadError::Extraction(format!("无法启动解压工具：{}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("解压工具退出码 {}", output.status.code().unwrap_or(-1))
            } else {
                stderr
            };
            log::error!("❌ 解压失败 {}: {}", archive.display(), message);
            return Err(DownloadError::Extraction(message));
        }

        log::info!("✅ 解压完成 {}", archive.display());
        Ok(())
    }
}
