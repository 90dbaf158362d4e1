//! # 进度分配与单调跟踪
//!
//! ## 设计思路
//!
//! 一个任务包含 n 个下载文件与 m 个压缩包。进度条按 `ProgressPlan` 分配：
//!
//! - `Split { download_share }`：下载阶段占 `download_share`%，解压阶段占剩余部分
//!   - 下载：`share * (i + f) / n`（i 为已完成文件数，f 为当前文件完成比例）
//!   - 解压：`share + (100 - share) * k / m`
//! - `DownloadOnly`：下载占满 100%，解压阶段保持 100%
//!
//! 服务端未给出大小时 f 固定为 0，只上报字节数，文件结束时才推进百分比。
//!
//! ## 实现思路
//!
//! `ProgressTracker` 记住已发出的最大百分比，任何候选值都取 `max`，
//! 因此同一任务的进度永不回退；同时做轻量节流，避免每个分块都发事件。

use serde::{Deserialize, Serialize};

use super::job::{Phase, ProgressUpdate};

const UNKNOWN_TOTAL_MIN_BYTES_DELTA: u64 = 256 * 1024;

/// 进度条分配方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProgressPlan {
    Split { download_share: u8 },
    DownloadOnly,
}

impl Default for ProgressPlan {
    fn default() -> Self {
        ProgressPlan::Split { download_share: 50 }
    }
}

impl ProgressPlan {
    pub fn download_share(&self) -> u8 {
        match self {
            ProgressPlan::Split { download_share } => (*download_share).min(100),
            ProgressPlan::DownloadOnly => 100,
        }
    }

    /// 下载阶段百分比；`fraction` 为当前文件完成比例（0..=1）。
    pub fn download_percent(&self, finished_files: usize, file_count: usize, fraction: f64) -> u8 {
        if file_count == 0 {
            return self.download_share();
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let done = (finished_files as f64 + fraction).min(file_count as f64);
        let percent = f64::from(self.download_share()) * done / file_count as f64;
        percent.floor().clamp(0.0, 100.0) as u8
    }

    /// 解压阶段百分比。
    pub fn extract_percent(&self, finished_archives: usize, archive_count: usize) -> u8 {
        let share = u32::from(self.download_share());
        if archive_count == 0 {
            return 100;
        }
        let finished = finished_archives.min(archive_count) as u32;
        let percent = share + (100 - share) * finished / archive_count as u32;
        percent.min(100) as u8
    }
}

/// 单任务进度跟踪器。
#[derive(Debug)]
pub struct ProgressTracker {
    plan: ProgressPlan,
    file_count: usize,
    last_percent: u8,
    last_phase: Option<Phase>,
    last_file: Option<usize>,
    last_bytes: u64,
}

impl ProgressTracker {
    pub fn new(plan: ProgressPlan, file_count: usize) -> Self {
        Self {
            plan,
            file_count,
            last_percent: 0,
            last_phase: None,
            last_file: None,
            last_bytes: 0,
        }
    }

    pub fn percent(&self) -> u8 {
        self.last_percent
    }

    /// 下载中收到数据块。`file_index` 从 0 开始，同时等于已完成文件数。
    pub fn on_bytes(&mut self, file_index: usize, downloaded: u64, total: Option<u64>) -> Option<ProgressUpdate> {
        let fraction = match total {
            Some(total) if total > 0 => downloaded as f64 / total as f64,
            _ => 0.0,
        };
        let candidate = self.plan.download_percent(file_index, self.file_count, fraction);

        let new_file = self.last_file != Some(file_index) || self.last_phase != Some(Phase::Downloading);
        let bytes_advanced = total.is_none()
            && downloaded.saturating_sub(self.last_bytes) >= UNKNOWN_TOTAL_MIN_BYTES_DELTA;

        if !new_file && !bytes_advanced && candidate <= self.last_percent {
            return None;
        }

        self.last_file = Some(file_index);
        self.last_bytes = downloaded;
        Some(self.record(candidate, Phase::Downloading, file_index, downloaded, total))
    }

    /// 文件下载完成（或已存在被跳过）。
    pub fn on_file_done(&mut self, file_index: usize, size: u64) -> ProgressUpdate {
        let candidate = self.plan.download_percent(file_index + 1, self.file_count, 0.0);
        self.last_file = Some(file_index);
        self.last_bytes = size;
        self.record(candidate, Phase::Downloading, file_index, size, Some(size))
    }

    /// 第 `finished` 个压缩包解压完成（共 `archive_count` 个）。
    pub fn on_extracted(&mut self, finished: usize, archive_count: usize) -> ProgressUpdate {
        let candidate = self.plan.extract_percent(finished, archive_count);
        self.record(candidate, Phase::Extracting, finished, 0, None)
    }

    /// 进入解压阶段。
    pub fn on_extract_start(&mut self, archive_count: usize) -> ProgressUpdate {
        let candidate = self.plan.extract_percent(0, archive_count);
        self.record(candidate, Phase::Extracting, 0, 0, None)
    }

    fn record(
        &mut self,
        candidate: u8,
        phase: Phase,
        file_index: usize,
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
    ) -> ProgressUpdate {
        self.last_percent = self.last_percent.max(candidate.min(100));
        self.last_phase = Some(phase);
        ProgressUpdate {
            percent: self.last_percent,
            phase,
            file_index,
            file_count: self.file_count,
            downloaded_bytes,
            total_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plan_allocates_half_to_download() {
        let plan = ProgressPlan::default();
        assert_eq!(plan.download_percent(0, 2, 0.5), 12);
        assert_eq!(plan.download_percent(1, 2, 0.0), 25);
        assert_eq!(plan.download_percent(2, 2, 0.0), 50);
        assert_eq!(plan.extract_percent(1, 2), 75);
        assert_eq!(plan.extract_percent(2, 2), 100);
    }

    #[test]
    fn download_only_plan_fills_bar_during_download() {
        let plan = ProgressPlan::DownloadOnly;
        assert_eq!(plan.download_percent(1, 1, 0.0), 100);
        assert_eq!(plan.extract_percent(0, 3), 100);
    }

    #[test]
    fn no_archives_jumps_to_complete() {
        assert_eq!(ProgressPlan::default().extract_percent(0, 0), 100);
    }

    #[test]
    fn unknown_total_does_not_advance_percent() {
        let mut tracker = ProgressTracker::new(ProgressPlan::default(), 1);
        let first = tracker.on_bytes(0, 1024, None).expect("first chunk should emit");
        assert_eq!(first.percent, 0);
        assert_eq!(first.total_bytes, None);

        assert!(tracker.on_bytes(0, 2048, None).is_none());

        let later = tracker
            .on_bytes(0, 1024 + UNKNOWN_TOTAL_MIN_BYTES_DELTA, None)
            .expect("byte milestone should emit");
        assert_eq!(later.percent, 0);

        assert_eq!(tracker.on_file_done(0, 400_000).percent, 50);
    }

    #[test]
    fn tracker_never_goes_backwards() {
        let mut tracker = ProgressTracker::new(ProgressPlan::default(), 2);
        tracker.on_bytes(0, 90, Some(100));
        let before = tracker.percent();

        // 第二个文件大小未知：候选值低于当前值时保持不变
        let update = tracker.on_bytes(1, 10, None).expect("new file should emit");
        assert!(update.percent >= before);
    }

    #[test]
    fn plan_deserializes_from_tagged_json() {
        let plan: ProgressPlan =
            serde_json::from_str(r#"{"mode":"split","download_share":80}"#).expect("parse failed");
        assert_eq!(plan, ProgressPlan::Split { download_share: 80 });

        let plan: ProgressPlan = serde_json::from_str(r#"{"mode":"download_only"}"#).expect("parse failed");
        assert_eq!(plan, ProgressPlan::DownloadOnly);
    }
}
