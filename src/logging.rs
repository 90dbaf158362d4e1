//! 日志初始化
//!
//! `log` 门面 + `env_logger` 后端。默认追加写入日志文件，每行格式：
//!
//! ```text
//! 2026-10-18 09:30:12,345 - INFO - 📚 已加载资源索引 …
//! ```
//!
//! 日志文件无法打开时退回 stderr，并记录一条警告。

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::settings::LogSettings;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// 初始化全局日志；重复调用只保留第一次的配置。
pub fn init(settings: &LogSettings, log_file: &Path) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.level.as_str()));

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {}",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            record.level(),
            record.args()
        )
    });

    let mut file_error = None;
    if settings.to_file {
        match open_log_file(log_file) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => file_error = Some(e),
        }
    }

    if builder.try_init().is_err() {
        return;
    }

    if let Some(e) = file_error {
        log::warn!("⚠️ 无法打开日志文件 {}，改为输出到 stderr: {}", log_file.display(), e);
    }
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
