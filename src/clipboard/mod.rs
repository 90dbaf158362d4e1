//! 剪贴板管理模块
//!
//! # 设计思路
//!
//! 统一管理剪贴板捕获管线：
//! - **监控**：`clipboard-master` 监听系统剪贴板变化（见 `listener`）
//! - **分类**：把快照归类为文本 / 图片 / 文件条目（见 `classifier`）
//! - **抑制**：应用自己写入剪贴板后，下一次变化通知只忽略一次
//! - **回写**：把条目写回剪贴板（见 `writer`）
//!
//! # 实现思路
//!
//! - 抑制标志是 `SuppressionGate` 里的 `AtomicBool`，监控器用 `swap(false)` 消费，
//!   保证“恰好一次”：无论内容如何，下一次通知都被吞掉，随后立即复位。
//! - 门由组合根创建并以 `Arc` 分发给写入端与监控端，不使用全局静态变量。
//! - `IgnoreGuard` 采用 RAII：构造时置位；写入成功调用 `commit()` 保留标志，
//!   写入失败时 `Drop` 自动撤销，避免把下一次外部变化误吞。

pub mod classifier;
pub mod item;
pub mod items;
pub mod listener;
pub mod mime;
pub mod writer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use classifier::{ClipboardSnapshot, ContentClassifier, file_uri_to_path};
pub use item::{ClipboardItem, ItemKind, ItemPayload};
pub use items::ItemList;
pub use listener::{ArboardSource, start_monitoring};
pub use writer::{ArboardSink, ClipboardSink, ClipboardWriter, path_to_file_uri};

use crate::error::AppError;

// ============================================================================
// 自身写入抑制
// ============================================================================

/// 一次性抑制门：置位后吞掉下一次剪贴板变化通知。
#[derive(Debug, Default)]
pub struct SuppressionGate {
    armed: AtomicBool,
}

impl SuppressionGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 置位：下一次变化通知将被忽略。
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
        log::debug!("🚫 已设置剪贴板忽略标志 - 下一次剪贴板变化将被忽略");
    }

    /// 撤销尚未消费的抑制。
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    /// 消费标志；返回 `true` 表示本次通知应被忽略。
    pub fn consume(&self) -> bool {
        self.armed.swap(false, Ordering::SeqCst)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

/// 剪贴板忽略标志的 RAII 守卫
///
/// ```rust,no_run
/// use clipdesk::clipboard::{IgnoreGuard, SuppressionGate};
///
/// let gate = SuppressionGate::new();
/// let guard = IgnoreGuard::new(&gate);
/// // ... 写入剪贴板 ...
/// guard.commit();
/// ```
pub struct IgnoreGuard<'a> {
    gate: &'a SuppressionGate,
    committed: bool,
}

impl<'a> IgnoreGuard<'a> {
    /// 创建守卫并立即设置忽略标志
    pub fn new(gate: &'a SuppressionGate) -> Self {
        gate.arm();
        Self { gate, committed: false }
    }

    /// 写入已成功：保留标志，交由监控器消费。
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for IgnoreGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.gate.disarm();
            log::debug!("↩️ 剪贴板写入未完成，已撤销忽略标志");
        }
    }
}

// ============================================================================
// 快照读取与监控
// ============================================================================

/// 剪贴板快照来源（系统剪贴板或测试替身）。
pub trait ClipboardSource {
    fn read_snapshot(&mut self) -> Result<ClipboardSnapshot, AppError>;
}

/// 变化通知的处理核心：先过抑制门，再读取快照并分类。
pub struct ClipboardMonitor {
    gate: Arc<SuppressionGate>,
    classifier: ContentClassifier,
}

impl ClipboardMonitor {
    pub fn new(gate: Arc<SuppressionGate>, classifier: ContentClassifier) -> Self {
        Self { gate, classifier }
    }

    pub fn gate(&self) -> &Arc<SuppressionGate> {
        &self.gate
    }

    /// 处理一次变化通知；被抑制、读取失败或分类无结果时返回 `None`。
    pub fn on_change(&self, source: &mut dyn ClipboardSource) -> Option<ClipboardItem> {
        if self.gate.consume() {
            log::debug!("⏭️  忽略应用主动触发的剪贴板变化");
            return None;
        }

        let snapshot = match source.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("⚠️ 读取剪贴板失败: {}", err);
                return None;
            }
        };

        let item = self.classifier.classify(&snapshot)?;
        log::info!("📋 捕获剪贴板条目: {}", item.summary());
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_handler::{ImageConfig, ImageError, ImageFetcher, ImagePayload};

    struct OfflineFetcher;

    impl ImageFetcher for OfflineFetcher {
        fn fetch(&self, _url: &str) -> Result<ImagePayload, ImageError> {
            Err(ImageError::Network("offline".to_string()))
        }
    }

    struct FixedSource(ClipboardSnapshot);

    impl ClipboardSource for FixedSource {
        fn read_snapshot(&mut self) -> Result<ClipboardSnapshot, AppError> {
            Ok(self.0.clone())
        }
    }

    fn monitor() -> ClipboardMonitor {
        let classifier = ContentClassifier::with_fetcher(ImageConfig::default(), Box::new(OfflineFetcher))
            .expect("classifier init failed");
        ClipboardMonitor::new(SuppressionGate::new(), classifier)
    }

    #[test]
    fn committed_guard_suppresses_exactly_one_notification() {
        let monitor = monitor();
        let mut source = FixedSource(ClipboardSnapshot::Text("copied by app".to_string()));

        IgnoreGuard::new(monitor.gate()).commit();

        assert!(monitor.on_change(&mut source).is_none());
        assert!(!monitor.gate().is_armed());

        let item = monitor.on_change(&mut source).expect("second change should be captured");
        assert_eq!(item.as_text(), Some("copied by app"));
    }

    #[test]
    fn dropped_guard_disarms_gate() {
        let gate = SuppressionGate::new();
        {
            let _guard = IgnoreGuard::new(&gate);
            assert!(gate.is_armed());
        }
        assert!(!gate.is_armed());
    }

    #[test]
    fn consume_resets_flag() {
        let gate = SuppressionGate::new();
        gate.arm();
        assert!(gate.consume());
        assert!(!gate.consume());
    }

    #[test]
    fn read_failure_produces_no_item() {
        struct Broken;
        impl ClipboardSource for Broken {
            fn read_snapshot(&mut self) -> Result<ClipboardSnapshot, AppError> {
                Err(AppError::Clipboard("locked".to_string()))
            }
        }

        assert!(monitor().on_change(&mut Broken).is_none());
    }
}
