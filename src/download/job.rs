//! 下载任务模型与事件。
//!
//! 工作线程只产生 `DownloadEvent`；`DownloadJob` 是调用方一侧的视图，
//! 通过 `apply` 吸收事件。终态之后的事件一律忽略。

use std::path::{Path, PathBuf};

use super::error::DownloadError;

/// 任务状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Downloading,
    Extracting,
    Done,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::Cancelled)
    }
}

/// 进度所处阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Downloading,
    Extracting,
}

/// 进度事件负载。`total_bytes` 为 `None` 表示服务端未给出大小。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub phase: Phase,
    pub file_index: usize,
    pub file_count: usize,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
}

/// 失败事件负载。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub code: &'static str,
    pub stage: &'static str,
    pub message: String,
}

impl From<&DownloadError> for FailureReport {
    fn from(err: &DownloadError) -> Self {
        Self {
            code: err.code(),
            stage: err.stage(),
            message: err.to_string(),
        }
    }
}

/// 工作线程发往调用方的事件。每个任务恰好以一个终态事件结束。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Progress(ProgressUpdate),
    Done(PathBuf),
    Failed(FailureReport),
    Cancelled,
}

impl DownloadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DownloadEvent::Progress(_))
    }
}

#[derive(Debug, Clone)]
pub struct DownloadJob {
    resource_key: String,
    urls: Vec<String>,
    target_dir: PathBuf,
    progress: u8,
    state: JobState,
    failure: Option<FailureReport>,
}

impl DownloadJob {
    pub fn new(resource_key: impl Into<String>, urls: Vec<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            resource_key: resource_key.into(),
            urls,
            target_dir: target_dir.into(),
            progress: 0,
            state: JobState::Pending,
            failure: None,
        }
    }

    pub fn resource_key(&self) -> &str {
        &self.resource_key
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn failure(&self) -> Option<&FailureReport> {
        self.failure.as_ref()
    }

    /// 吸收一个事件；返回 `false` 表示事件被忽略（任务已结束）。
    pub fn apply(&mut self, event: &DownloadEvent) -> bool {
        if self.state.is_terminal() {
            log::debug!("⏭️ 任务 {} 已结束，忽略事件 {:?}", self.resource_key, event);
            return false;
        }

        match event {
            DownloadEvent::Progress(update) => {
                self.progress = self.progress.max(update.percent);
                self.state = match update.phase {
                    Phase::Downloading => JobState::Downloading,
                    Phase::Extracting => JobState::Extracting,
                };
            }
            DownloadEvent::Done(_) => {
                self.progress = 100;
                self.state = JobState::Done;
            }
            DownloadEvent::Failed(report) => {
                self.failure = Some(report.clone());
                self.state = JobState::Failed;
            }
            DownloadEvent::Cancelled => {
                self.state = JobState::Cancelled;
            }
        }
        true
    }
}
