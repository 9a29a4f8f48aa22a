//! 分页同步事件
//!
//! 宿主 UI 订阅这些事件来驱动下拉刷新指示器、底部加载动画等，无需轮询协调器状态。

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// 分页同步事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSyncEvent {
    /// 页面开始拉取
    PageSyncStarted {
        page_number: usize,
        reason: Option<String>,
    },
    /// 页面拉取完成
    PageSyncFinished {
        page_number: usize,
        success: bool,
    },
    /// 内部状态已清空（手动全量刷新）
    StateReset,
}

impl PageSyncEvent {
    /// 获取事件类型字符串
    pub fn event_type(&self) -> &'static str {
        match self {
            PageSyncEvent::PageSyncStarted { .. } => "page_sync_started",
            PageSyncEvent::PageSyncFinished { .. } => "page_sync_finished",
            PageSyncEvent::StateReset => "state_reset",
        }
    }

    /// 事件关联的页码
    pub fn page_number(&self) -> Option<usize> {
        match self {
            PageSyncEvent::PageSyncStarted { page_number, .. }
            | PageSyncEvent::PageSyncFinished { page_number, .. } => Some(*page_number),
            PageSyncEvent::StateReset => None,
        }
    }
}

/// 事件广播
#[derive(Debug, Clone)]
pub struct PageSyncEventBus {
    sender: broadcast::Sender<PageSyncEvent>,
}

impl PageSyncEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件
    pub fn emit(&self, event: PageSyncEvent) {
        debug!("Emitting page sync event: {}", event.event_type());

        // 无订阅者时 send 会失败，属正常场景
        if let Err(e) = self.sender.send(event) {
            debug!("Failed to broadcast page sync event (no active receivers): {}", e);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageSyncEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
