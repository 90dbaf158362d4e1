//! 内存中的条目列表（新条目追加在末尾，不做持久化）。

use super::item::ClipboardItem;

#[derive(Debug, Default)]
pub struct ItemList {
    items: Vec<ClipboardItem>,
}

impl ItemList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ClipboardItem) {
        self.items.push(item);
    }

    /// 清空面板；返回被丢弃的条目数。
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        if removed > 0 {
            log::info!("🧹 已清空 {} 个剪贴板条目", removed);
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClipboardItem> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ClipboardItem> {
        self.items.get(index)
    }

    pub fn latest(&self) -> Option<&ClipboardItem> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
