use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clipboard_master::{CallbackResult, ClipboardHandler, Master};

use super::{ClipboardItem, ClipboardMonitor, ClipboardSnapshot, ClipboardSource};
use crate::error::AppError;

const MONITOR_RESTART_BASE_DELAY_MS: u64 = 100;
const MONITOR_RESTART_MAX_DELAY_MS: u64 = 5_000;

fn compute_restart_backoff_ms(restart_attempt: u32) -> u64 {
    let exp = 1_u64 << restart_attempt.saturating_sub(1).min(6);
    MONITOR_RESTART_BASE_DELAY_MS
        .saturating_mul(exp)
        .min(MONITOR_RESTART_MAX_DELAY_MS)
}

/// 基于 arboard 的系统剪贴板读取；剪贴板句柄懒创建，出错后丢弃重建。
#[derive(Default)]
pub struct ArboardSource {
    clipboard: Option<arboard::Clipboard>,
}

impl ArboardSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn clipboard(&mut self) -> Result<&mut arboard::Clipboard, AppError> {
        if self.clipboard.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| AppError::Clipboard(format!("打开剪贴板失败: {}", e)))?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| AppError::Clipboard("剪贴板不可用".to_string()))
    }

    fn read_inner(&mut self) -> Result<ClipboardSnapshot, AppError> {
        let clipboard = self.clipboard()?;

        match clipboard.get_text() {
            Ok(text) if !text.is_empty() => return Ok(ClipboardSnapshot::Text(text)),
            Ok(_) | Err(arboard::Error::ContentNotAvailable) => {}
            Err(e) => return Err(AppError::Clipboard(format!("读取文本失败: {}", e))),
        }

        match clipboard.get_image() {
            Ok(image) => Ok(ClipboardSnapshot::Image {
                width: image.width as u32,
                height: image.height as u32,
                rgba: image.bytes.into_owned(),
            }),
            Err(arboard::Error::ContentNotAvailable) => Ok(ClipboardSnapshot::Empty),
            Err(e) => Err(AppError::Clipboard(format!("读取图片失败: {}", e))),
        }
    }
}

impl ClipboardSource for ArboardSource {
    fn read_snapshot(&mut self) -> Result<ClipboardSnapshot, AppError> {
        let result = self.read_inner();
        if result.is_err() {
            self.clipboard = None;
        }
        result
    }
}

/// 剪贴板事件处理器（内部实现）
///
/// 每次变化通知交给 `ClipboardMonitor`，得到的条目经通道送往调用方。
/// 接收端关闭后停止监听，外层循环不再重启。
struct Handler {
    monitor: Arc<ClipboardMonitor>,
    source: ArboardSource,
    sender: Sender<ClipboardItem>,
    receiver_gone: Arc<AtomicBool>,
}

impl ClipboardHandler for Handler {
    fn on_clipboard_change(&mut self) -> CallbackResult {
        let Some(item) = self.monitor.on_change(&mut self.source) else {
            return CallbackResult::Next;
        };

        if self.sender.send(item).is_err() {
            log::info!("📋 条目接收端已关闭，停止剪贴板监听");
            self.receiver_gone.store(true, Ordering::SeqCst);
            return CallbackResult::Stop;
        }

        CallbackResult::Next
    }

    fn on_clipboard_error(&mut self, error: std::io::Error) -> CallbackResult {
        log::error!("剪贴板错误：{}", error);
        CallbackResult::Next
    }
}

/// 在后台线程启动剪贴板监控
///
/// 监听意外退出时按指数退避重启；接收端关闭时线程结束。
pub fn start_monitoring(monitor: Arc<ClipboardMonitor>, sender: Sender<ClipboardItem>) -> JoinHandle<()> {
    thread::spawn(move || {
        let receiver_gone = Arc::new(AtomicBool::new(false));
        let mut restart_attempt: u32 = 0;

        loop {
            let handler = Handler {
                monitor: Arc::clone(&monitor),
                source: ArboardSource::new(),
                sender: sender.clone(),
                receiver_gone: Arc::clone(&receiver_gone),
            };

            match Master::new(handler) {
                Ok(mut master) => {
                    restart_attempt = 0;
                    log::info!("📋 剪贴板监听已启动");
                    if let Err(err) = master.run() {
                        log::warn!("📋 剪贴板监听异常: {}", err);
                    }
                }
                Err(err) => {
                    log::error!("📋 创建剪贴板监听失败: {}", err);
                }
            }

            if receiver_gone.load(Ordering::SeqCst) {
                break;
            }

            restart_attempt = restart_attempt.saturating_add(1);
            let backoff_ms = compute_restart_backoff_ms(restart_attempt);
            log::warn!("📋 剪贴板监听 {}ms 后重试（attempt={}）", backoff_ms, restart_attempt);
            thread::sleep(Duration::from_millis(backoff_ms));
        }
    })
}
