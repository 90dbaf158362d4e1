//! # 后台下载 + 解压工作线程
//!
//! ## 设计思路
//!
//! 一个任务占用一个后台线程：顺序下载地址列表中的文件，再逐个调用外部工具解压。
//! 调用方线程永不阻塞，通过 `DownloadHandle` 上的单生产者 / 单消费者通道按需拉取事件。
//!
//! ## 实现思路
//!
//! - 线程内部创建单线程 tokio 运行时驱动 reqwest 流式下载
//! - 下载目录中已存在同名文件时跳过（只看是否存在，不校验内容），并计为已完成
//! - 取消是协作式的：`Arc<AtomicBool>` 在分块与文件边界检查
//! - `run` 的最终 `Result` 映射为恰好一个终态事件，且一定是最后一个事件
//! - 接收端被丢弃时自动置取消标志，线程尽快退出

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::config::DownloadConfig;
use super::error::DownloadError;
use super::extract::{Extractor, is_archive};
use super::fetch::{Fetcher, file_name_from_url};
use super::job::{DownloadEvent, FailureReport};
use super::progress::ProgressTracker;
use crate::net;

#[derive(Debug, Clone)]
pub struct DownloadWorker {
    config: DownloadConfig,
    download_dir: PathBuf,
    extractor: Extractor,
}

impl DownloadWorker {
    pub fn new(config: DownloadConfig, download_dir: impl Into<PathBuf>, extractor_program: impl Into<PathBuf>) -> Self {
        let extractor = Extractor::new(extractor_program, config.overwrite, config.multithread);
        Self {
            config,
            download_dir: download_dir.into(),
            extractor,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// 在后台线程启动任务。
    pub fn spawn(&self, key: &str, urls: Vec<String>, target_dir: PathBuf) -> Result<DownloadHandle, DownloadError> {
        let (sender, receiver) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker = self.clone();
        let thread_cancel = Arc::clone(&cancel);
        let job_key = key.to_string();

        let thread = thread::Builder::new()
            .name(format!("download-{}", key))
            .spawn(move || {
                let mut emit = |event: DownloadEvent| {
                    if sender.send(event).is_err() && !thread_cancel.swap(true, Ordering::SeqCst) {
                        log::info!("⏹️ 事件接收端已关闭，取消任务 {}", job_key);
                    }
                };

                let result = worker.run(&urls, &target_dir, &thread_cancel, &mut emit);
                emit(terminal_event(&job_key, result));
            })
            .map_err(|e| DownloadError::Worker(format!("无法启动下载线程：{}", e)))?;

        log::info!("🚀 下载任务已启动: {}", key);
        Ok(DownloadHandle {
            key: key.to_string(),
            events: receiver,
            cancel,
            thread: Some(thread),
            finished: false,
            release: None,
        })
    }

    /// 同步执行任务（在调用线程上），返回解压目录。
    pub fn run(
        &self,
        urls: &[String],
        target_dir: &Path,
        cancel: &AtomicBool,
        emit: &mut dyn FnMut(DownloadEvent),
    ) -> Result<PathBuf, DownloadError> {
        std::fs::create_dir_all(&self.download_dir)?;
        std::fs::create_dir_all(target_dir)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DownloadError::Worker(format!("创建下载运行时失败：{}", e)))?;

        let mut tracker = ProgressTracker::new(self.config.progress, urls.len());
        let files = runtime.block_on(self.download_all(urls, cancel, &mut tracker, emit))?;

        let archives: Vec<&PathBuf> = files.iter().filter(|path| is_archive(path)).collect();
        emit(DownloadEvent::Progress(tracker.on_extract_start(archives.len())));

        for (index, archive) in archives.iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                return Err(DownloadError::Cancelled);
            }
            self.extractor.extract(archive, target_dir)?;
            emit(DownloadEvent::Progress(tracker.on_extracted(index + 1, archives.len())));
        }

        Ok(target_dir.to_path_buf())
    }

    async fn download_all(
        &self,
        urls: &[String],
        cancel: &AtomicBool,
        tracker: &mut ProgressTracker,
        emit: &mut dyn FnMut(DownloadEvent),
    ) -> Result<Vec<PathBuf>, DownloadError> {
        let client = net::build_client(
            Duration::from_secs(self.config.connect_timeout),
            None,
            self.config.max_redirects,
        )
        .map_err(|e| DownloadError::Network(format!("创建 HTTP 客户端失败：{}", e)))?;
        let fetcher = Fetcher::new(&client, &self.config);

        let mut files = Vec::with_capacity(urls.len());

        for (index, url) in urls.iter().enumerate() {
            if cancel.load(Ordering::SeqCst) {
                return Err(DownloadError::Cancelled);
            }

            let dest = self.download_dir.join(file_name_from_url(url)?);

            if dest.exists() {
                log::info!("⏭️ 文件已存在，跳过下载: {}", dest.display());
                let size = std::fs::metadata(&dest).map(|meta| meta.len()).unwrap_or(0);
                emit(DownloadEvent::Progress(tracker.on_file_done(index, size)));
                files.push(dest);
                continue;
            }

            log::info!(
                "⬇️ 开始下载 ({}/{}) {}",
                index + 1,
                urls.len(),
                net::redact_url_for_log(url)
            );

            let size = fetcher
                .fetch_to_file(
                    url,
                    &dest,
                    |downloaded, total| {
                        if let Some(update) = tracker.on_bytes(index, downloaded, total) {
                            emit(DownloadEvent::Progress(update));
                        }
                    },
                    || cancel.load(Ordering::SeqCst),
                )
                .await?;

            emit(DownloadEvent::Progress(tracker.on_file_done(index, size)));
            files.push(dest);
        }

        Ok(files)
    }
}

fn terminal_event(key: &str, result: Result<PathBuf, DownloadError>) -> DownloadEvent {
    match result {
        Ok(path) => {
            log::info!("✅ 任务 {} 完成: {}", key, path.display());
            DownloadEvent::Done(path)
        }
        Err(DownloadError::Cancelled) => {
            log::info!("⏹️ 任务 {} 已取消", key);
            DownloadEvent::Cancelled
        }
        Err(err) => {
            log::error!("❌ 任务 {} 失败 [{}:{}]: {}", key, err.stage(), err.code(), err);
            DownloadEvent::Failed(FailureReport::from(&err))
        }
    }
}

/// 调用方持有的任务句柄。
///
/// 句柄被丢弃时（无论是否读到终态）执行一次 `on_release` 登记的回调。
pub struct DownloadHandle {
    key: String,
    events: Receiver<DownloadEvent>,
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    finished: bool,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl DownloadHandle {
    /// 由外部生产者驱动的句柄（无后台线程）。
    pub fn detached(key: impl Into<String>, events: Receiver<DownloadEvent>) -> Self {
        Self {
            key: key.into(),
            events,
            cancel: Arc::new(AtomicBool::new(false)),
            thread: None,
            finished: false,
            release: None,
        }
    }

    /// 登记句柄释放时的回调；重复登记时先前的回调立即执行。
    pub fn on_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        if let Some(previous) = self.release.replace(Box::new(release)) {
            previous();
        }
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 请求取消；工作线程在下一个分块或文件边界退出。
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 非阻塞拉取一个事件。
    pub fn try_next(&mut self) -> Option<DownloadEvent> {
        if self.finished {
            return None;
        }
        match self.events.try_recv() {
            Ok(event) => Some(self.observe(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.lost_worker()),
        }
    }

    /// 阻塞等待下一个事件；终态之后返回 `None`。
    pub fn recv(&mut self) -> Option<DownloadEvent> {
        if self.finished {
            return None;
        }
        match self.events.recv() {
            Ok(event) => Some(self.observe(event)),
            Err(_) => Some(self.lost_worker()),
        }
    }

    /// 最多等待 `timeout`；超时返回 `None`。
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<DownloadEvent> {
        if self.finished {
            return None;
        }
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(self.observe(event)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.lost_worker()),
        }
    }

    /// 排空事件直到终态，依次交给 `on_event`，返回终态事件。
    pub fn wait(mut self, mut on_event: impl FnMut(&DownloadEvent)) -> DownloadEvent {
        loop {
            let Some(event) = self.recv() else {
                return self.lost_worker();
            };
            on_event(&event);
            if event.is_terminal() {
                self.join();
                return event;
            }
        }
    }

    fn observe(&mut self, event: DownloadEvent) -> DownloadEvent {
        if event.is_terminal() {
            self.finished = true;
        }
        event
    }

    fn lost_worker(&mut self) -> DownloadEvent {
        self.finished = true;
        let err = DownloadError::Worker("下载线程未发送结束事件".to_string());
        log::error!("❌ 任务 {} 异常结束: {}", self.key, err);
        DownloadEvent::Failed(FailureReport::from(&err))
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("❌ 下载线程 {} 发生 panic", self.key);
            }
        }
    }
}

impl Drop for DownloadHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_handle_stops_after_terminal_event() {
        let (sender, receiver) = mpsc::channel();
        sender.send(DownloadEvent::Cancelled).expect("send failed");
        sender.send(DownloadEvent::Done(PathBuf::from("/x"))).expect("send failed");

        let mut handle = DownloadHandle::detached("jdk8", receiver);
        assert_eq!(handle.recv(), Some(DownloadEvent::Cancelled));
        assert!(handle.is_finished());
        assert_eq!(handle.recv(), None);
    }

    #[test]
    fn dropped_producer_without_terminal_reports_worker_failure() {
        let (sender, receiver) = mpsc::channel::<DownloadEvent>();
        drop(sender);

        let handle = DownloadHandle::detached("jdk8", receiver);
        match handle.wait(|_| {}) {
            DownloadEvent::Failed(report) => assert_eq!(report.code, "worker"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn release_callback_runs_once_on_drop() {
        let (_sender, receiver) = mpsc::channel::<DownloadEvent>();
        let released = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&released);

        let handle = DownloadHandle::detached("jdk8", receiver)
            .on_release(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(handle);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_url_list_without_archives_completes() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let worker = DownloadWorker::new(
            DownloadConfig::default(),
            dir.path().join("downloads"),
            "/no/such/7z",
        );
        let target = dir.path().join("extracted");

        let terminal = worker
            .spawn("empty", Vec::new(), target.clone())
            .expect("spawn failed")
            .wait(|_| {});

        assert_eq!(terminal, DownloadEvent::Done(target));
    }
}
