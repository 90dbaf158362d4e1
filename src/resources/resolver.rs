//! # 资源解析器
//!
//! ## 设计思路
//!
//! `resolve(分类, 子分类)` 返回第一个存在的候选位置；全部不存在时报告“未命中”，
//! 并给出下载地址表中对应的键。调用方可随即 `start_download`，任务成功后
//! `finish_download` 恰好重新解析一次；第二次仍未命中即“资源不可用”，不再重试。
//!
//! ## 实现思路
//!
//! - 下载通过 `DownloadLauncher` 注入，生产环境为 `DownloadWorker`
//! - 不对同一键的并发请求去重，只暴露 `is_downloading` 供调用方先行检查
//! - 进行中的任务按键计数（`Arc<Mutex<HashMap<键, 任务数>>>`），锁中毒时继续使用恢复数据
//! - 计数在句柄释放时递减：正常 `finish_download`、取消后丢弃、直接丢弃都一样

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::error::ResourceError;
use super::index::{ResourceIndex, ResourceLocation};
use super::links::DownloadLinks;
use crate::download::{DownloadError, DownloadEvent, DownloadHandle, DownloadWorker};

/// 启动下载任务的协作者。
pub trait DownloadLauncher {
    fn launch(&self, key: &str, urls: Vec<String>, target_dir: PathBuf) -> Result<DownloadHandle, DownloadError>;
}

impl DownloadLauncher for DownloadWorker {
    fn launch(&self, key: &str, urls: Vec<String>, target_dir: PathBuf) -> Result<DownloadHandle, DownloadError> {
        self.spawn(key, urls, target_dir)
    }
}

/// 一次解析的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResourceLocation),
    /// 所有候选都不存在；`download_key` 为下载地址表中的键（未配置时为 `None`）。
    Missing { download_key: Option<String> },
}

pub struct ResourceResolver<L: DownloadLauncher> {
    index: ResourceIndex,
    links: DownloadLinks,
    launcher: L,
    in_flight: Arc<Mutex<HashMap<String, usize>>>,
    resolve_count: AtomicUsize,
}

impl<L: DownloadLauncher> ResourceResolver<L> {
    pub fn new(index: ResourceIndex, links: DownloadLinks, launcher: L) -> Self {
        Self {
            index,
            links,
            launcher,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            resolve_count: AtomicUsize::new(0),
        }
    }

    pub fn index(&self) -> &ResourceIndex {
        &self.index
    }

    pub fn links(&self) -> &DownloadLinks {
        &self.links
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn extract_root(&self) -> &Path {
        self.index.extract_root()
    }

    /// 已执行的解析次数。
    pub fn resolve_count(&self) -> usize {
        self.resolve_count.load(Ordering::SeqCst)
    }

    pub fn resolve(&self, category: &str, subcategory: &str) -> Resolution {
        self.resolve_count.fetch_add(1, Ordering::SeqCst);

        if let Some(location) = self.index.first_existing(category, subcategory) {
            log::debug!("📍 解析 {}/{} -> {}", category, subcategory, location);
            return Resolution::Found(location);
        }

        let download_key = self.links.download_key_for(category, subcategory);
        log::warn!(
            "⚠️ 资源未找到 {}/{}（下载键: {}）",
            category,
            subcategory,
            download_key.as_deref().unwrap_or("无")
        );
        Resolution::Missing { download_key }
    }

    /// 该键是否仍有未释放的下载任务。
    pub fn is_downloading(&self, key: &str) -> bool {
        lock_in_flight(&self.in_flight).get(key).is_some_and(|jobs| *jobs > 0)
    }

    /// 为未命中的资源启动下载任务（解压到解压根目录）。
    pub fn start_download(&self, category: &str, subcategory: &str) -> Result<DownloadHandle, ResourceError> {
        let key = self
            .links
            .download_key_for(category, subcategory)
            .ok_or_else(|| ResourceError::NoDownloadSource(format!("{}/{}", category, subcategory)))?;
        let urls = self.links.urls(&key).map(<[String]>::to_vec).unwrap_or_default();

        if self.is_downloading(&key) {
            log::warn!("⚠️ 资源 {} 已有下载任务在进行", key);
        }

        let handle = self
            .launcher
            .launch(&key, urls, self.index.extract_root().to_path_buf())?;
        *lock_in_flight(&self.in_flight).entry(key.clone()).or_insert(0) += 1;

        let in_flight = Arc::clone(&self.in_flight);
        Ok(handle.on_release(move || release_in_flight(&in_flight, &key)))
    }

    /// 排空任务事件直到终态；成功后恰好重新解析一次。
    pub fn finish_download(
        &self,
        handle: DownloadHandle,
        category: &str,
        subcategory: &str,
        on_event: impl FnMut(&DownloadEvent),
    ) -> Result<ResourceLocation, ResourceError> {
        let key = handle.key().to_string();
        let terminal = handle.wait(on_event);

        match terminal {
            DownloadEvent::Done(_) => match self.resolve(category, subcategory) {
                Resolution::Found(location) => Ok(location),
                Resolution::Missing { .. } => {
                    log::error!("❌ 下载完成后仍未找到资源 {}/{}", category, subcategory);
                    Err(ResourceError::Unavailable(format!("{}/{}", category, subcategory)))
                }
            },
            DownloadEvent::Failed(report) => Err(ResourceError::DownloadFailed(report.message)),
            DownloadEvent::Cancelled => Err(ResourceError::DownloadCancelled(key)),
            DownloadEvent::Progress(_) => Err(ResourceError::DownloadFailed("任务未正常结束".to_string())),
        }
    }

    /// 解析；未命中时自动下载一次并重新解析。
    pub fn resolve_or_download(
        &self,
        category: &str,
        subcategory: &str,
        on_event: impl FnMut(&DownloadEvent),
    ) -> Result<ResourceLocation, ResourceError> {
        match self.resolve(category, subcategory) {
            Resolution::Found(location) => Ok(location),
            Resolution::Missing { download_key: None } => {
                Err(ResourceError::NoDownloadSource(format!("{}/{}", category, subcategory)))
            }
            Resolution::Missing { download_key: Some(_) } => {
                let handle = self.start_download(category, subcategory)?;
                self.finish_download(handle, category, subcategory, on_event)
            }
        }
    }
}

fn lock_in_flight(in_flight: &Mutex<HashMap<String, usize>>) -> MutexGuard<'_, HashMap<String, usize>> {
    match in_flight.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("下载任务状态锁中毒，继续使用恢复数据");
            poisoned.into_inner()
        }
    }
}

fn release_in_flight(in_flight: &Mutex<HashMap<String, usize>>, key: &str) {
    let mut jobs = lock_in_flight(in_flight);
    if let Some(count) = jobs.get_mut(key) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            jobs.remove(key);
        }
    }
}
