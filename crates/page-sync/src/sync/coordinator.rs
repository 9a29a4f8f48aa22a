/// 分页同步协调器
///
/// 职责：
/// - 记录每页最近一次成功同步的时间（页面新鲜度）
/// - 记录正在拉取中的页面
/// - 根据“第 N 条已可见”判断是否需要预取下一页
/// - 通过 PageFetcher 执行拉取，并在完成后更新记账
///
/// 协调器不重试、不超时、不取消：失败的页面保持失效，由下一次滚动或手动刷新重新拉取；
/// 永远不完成的拉取会让该页一直处于拉取中（只影响这一页的自动预取）。

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::PageSyncConfig;
use crate::error::Result;
use crate::events::{PageSyncEvent, PageSyncEventBus};
use crate::fetcher::{PageFetcher, PageRequest};
use crate::sync::bookkeeping::SyncBookkeeping;

/// 同步完成回调（无参数，只表示“这一轮拉取结束了”）
pub type SyncCompletion = Box<dyn FnOnce() + Send + 'static>;

/// 分页同步协调器
///
/// 每个分页列表一个实例，随列表页一起销毁，不产生持久化副作用。
/// 协调器只持有 PageFetcher 的弱引用，拉取器的生命周期由宿主管理；
/// 单次拉取期间，派发出去的任务会临时持有一个强引用。
pub struct PageSyncCoordinator {
    /// 配置（构造后不可变）
    config: PageSyncConfig,

    /// 记账状态，与拉取完成任务共享
    state: Arc<Mutex<SyncBookkeeping>>,

    /// 拉取器（弱引用）
    fetcher: RwLock<Option<Weak<dyn PageFetcher>>>,

    /// 时钟
    clock: Arc<dyn Clock>,

    /// 事件广播
    events: PageSyncEventBus,
}

/// 协调器统计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSyncStats {
    /// 首页序号
    pub page_first_index: usize,

    /// 每页条数
    pub page_size: usize,

    /// 页面过期时间（秒）
    pub page_ttl_secs: u64,

    /// 成功同步过的页数
    pub synced_pages: usize,

    /// 仍在有效期内的页数
    pub fresh_pages: usize,

    /// 拉取中的页面（升序）
    pub pages_in_flight: Vec<usize>,

    /// 拉取中的最大页码
    pub highest_page_being_synced: Option<usize>,
}

impl PageSyncCoordinator {
    /// 创建协调器（使用系统时钟）
    pub fn new(config: PageSyncConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// 使用自定义时钟创建协调器
    pub fn with_clock(config: PageSyncConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        debug!(
            "创建分页同步协调器: page_first_index={}, page_size={}, page_ttl_secs={}",
            config.page_first_index, config.page_size, config.page_ttl_secs
        );

        Ok(Self {
            events: PageSyncEventBus::new(config.event_buffer_size),
            config,
            state: Arc::new(Mutex::new(SyncBookkeeping::new())),
            fetcher: RwLock::new(None),
            clock,
        })
    }

    // ============================================================
    // 拉取器
    // ============================================================

    /// 注册拉取器（只保存弱引用）
    pub fn set_fetcher<F: PageFetcher + 'static>(&self, fetcher: &Arc<F>) {
        let weak: Weak<F> = Arc::downgrade(fetcher);
        let weak: Weak<dyn PageFetcher> = weak;
        *self.fetcher.write() = Some(weak);
    }

    /// 移除拉取器
    pub fn clear_fetcher(&self) {
        *self.fetcher.write() = None;
    }

    /// 是否有可用的拉取器
    pub fn has_fetcher(&self) -> bool {
        self.fetcher
            .read()
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    // ============================================================
    // 同步触发
    // ============================================================

    /// 确保下一页已同步
    ///
    /// 只有当 `last_visible_index`（跨页展开后的 0 基下标）是所在页最后一条时才会继续；
    /// 下一页正在拉取或仍在有效期内则不做任何事。返回派发的拉取任务句柄。
    pub fn ensure_next_page_is_synchronized(
        &self,
        last_visible_index: usize,
    ) -> Option<JoinHandle<()>> {
        if !self.is_last_element_in_page(last_visible_index) {
            return None;
        }

        let Some(next_page) = self.page_number(last_visible_index).checked_add(1) else {
            debug!("页码溢出，跳过预取: last_visible_index={}", last_visible_index);
            return None;
        };
        if self.is_page_being_synced(next_page) {
            debug!("下一页正在同步，跳过: page_number={}", next_page);
            return None;
        }
        if !self.is_cache_invalid(next_page) {
            debug!("下一页仍在有效期内，跳过: page_number={}", next_page);
            return None;
        }

        Some(self.synchronize(next_page, None, None))
    }

    /// 同步首页
    ///
    /// 无条件拉取，不检查新鲜度和拉取中状态。`on_completion` 在拉取结束（成功或失败）后恰好调用一次。
    pub fn synchronize_first_page(
        &self,
        reason: Option<&str>,
        on_completion: Option<SyncCompletion>,
    ) -> JoinHandle<()> {
        self.synchronize(
            self.config.page_first_index,
            reason.map(str::to_string),
            on_completion,
        )
    }

    /// 全量重新同步（例如下拉刷新）：清空记账后重新拉取首页
    pub fn resynchronize(
        &self,
        reason: Option<&str>,
        on_completion: Option<SyncCompletion>,
    ) -> JoinHandle<()> {
        self.reset_internal_state();
        self.synchronize_first_page(reason, on_completion)
    }

    /// 清空新鲜度和拉取中记录，配置不变
    pub fn reset_internal_state(&self) {
        self.state.lock().reset();
        info!("分页同步状态已重置");
        self.events.emit(PageSyncEvent::StateReset);
    }

    // ============================================================
    // 查询
    // ============================================================

    /// 元素下标所在的页码（超出 usize 范围时取 usize::MAX）
    pub fn page_number(&self, object_index: usize) -> usize {
        (object_index / self.config.page_size).saturating_add(self.config.page_first_index)
    }

    /// 页面是否需要重新拉取
    ///
    /// 没有同步记录，或距上次成功同步超过 TTL 时返回 true。
    /// 取时间差绝对值：时钟回拨超过 TTL 同样视为失效。
    pub fn is_cache_invalid(&self, page_number: usize) -> bool {
        let Some(refreshed_at) = self.state.lock().refreshed_at(page_number) else {
            return true;
        };
        self.is_expired(refreshed_at, self.clock.now())
    }

    /// 是否是所在页的最后一条
    pub fn is_last_element_in_page(&self, element_index: usize) -> bool {
        element_index % self.config.page_size == self.config.page_size - 1
    }

    /// 页面是否正在拉取
    pub fn is_page_being_synced(&self, page_number: usize) -> bool {
        self.state.lock().is_in_flight(page_number)
    }

    /// 拉取中的最大页码
    pub fn highest_page_being_synced(&self) -> Option<usize> {
        self.state.lock().highest_in_flight()
    }

    /// 是否正在拉取已加载条目之外的页面（列表底部加载动画用）
    pub fn is_fetching_beyond(&self, loaded_count: usize) -> bool {
        self.highest_page_being_synced()
            .is_some_and(|page| page.saturating_mul(self.config.page_size) > loaded_count)
    }

    /// 获取统计信息
    pub fn stats(&self) -> PageSyncStats {
        let now = self.clock.now();
        let state = self.state.lock();
        let fresh_pages = state
            .refresh_timestamps()
            .filter(|(_, at)| !self.is_expired(*at, now))
            .count();

        PageSyncStats {
            page_first_index: self.config.page_first_index,
            page_size: self.config.page_size,
            page_ttl_secs: self.config.page_ttl_secs,
            synced_pages: state.synced_page_count(),
            fresh_pages,
            pages_in_flight: state.pages_in_flight(),
            highest_page_being_synced: state.highest_in_flight(),
        }
    }

    /// 订阅同步事件
    pub fn subscribe(&self) -> broadcast::Receiver<PageSyncEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &PageSyncConfig {
        &self.config
    }

    pub fn page_first_index(&self) -> usize {
        self.config.page_first_index
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn page_ttl(&self) -> Duration {
        self.config.page_ttl()
    }

    // ============================================================
    // 私有方法
    // ============================================================

    fn is_expired(&self, refreshed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // abs() 之后必然非负，to_std 不会失败
        now.signed_duration_since(refreshed_at)
            .abs()
            .to_std()
            .map_or(true, |age| age > self.config.page_ttl())
    }

    /// 取出拉取器；未注册或已释放属于接线错误，直接 panic
    fn resolve_fetcher(&self, page_number: usize) -> Arc<dyn PageFetcher> {
        let fetcher = self.fetcher.read().as_ref().and_then(Weak::upgrade);
        match fetcher {
            Some(fetcher) => fetcher,
            None => {
                error!(
                    "⛔️ 分页同步缺少 PageFetcher，无法同步: page_number={}",
                    page_number
                );
                panic!(
                    "PageSyncCoordinator: no PageFetcher registered (page_number={})",
                    page_number
                );
            }
        }
    }

    /// 派发单页拉取
    fn synchronize(
        &self,
        page_number: usize,
        reason: Option<String>,
        on_completion: Option<SyncCompletion>,
    ) -> JoinHandle<()> {
        let fetcher = self.resolve_fetcher(page_number);
        let generation = self.state.lock().begin(page_number);

        info!(
            "开始同步页面: page_number={}, page_size={}, reason={:?}",
            page_number, self.config.page_size, reason
        );
        self.events.emit(PageSyncEvent::PageSyncStarted {
            page_number,
            reason: reason.clone(),
        });

        let request = PageRequest::new(page_number, self.config.page_size, reason);
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let events = self.events.clone();

        tokio::spawn(async move {
            let success = match fetcher.fetch_page(request).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("页面同步失败: page_number={}, error={}", page_number, e);
                    false
                }
            };
            drop(fetcher);

            let current = {
                let refreshed_at = success.then(|| clock.now());
                state.lock().finish(page_number, generation, refreshed_at)
            };
            if !current {
                debug!("重置前发出的页面同步已完成: page_number={}", page_number);
            }
            debug!(
                "页面同步完成: page_number={}, success={}",
                page_number, success
            );

            events.emit(PageSyncEvent::PageSyncFinished {
                page_number,
                success,
            });

            if let Some(on_completion) = on_completion {
                on_completion();
            }
        })
    }
}
