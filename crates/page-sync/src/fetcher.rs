//! 页面拉取接口
//!
//! 协调器只负责记账，真正的拉取（网络请求 + 写入本地存储）由宿主实现 `PageFetcher`。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;

/// 首页“视图即将出现”类拉取的默认最小间隔（秒）
pub const DEFAULT_MIN_FULL_SYNC_INTERVAL_SECS: u64 = 30;

/// 单页拉取请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 页码
    pub page_number: usize,
    /// 每页条数
    pub page_size: usize,
    /// 触发原因（仅用于诊断/统计，协调器不解释）
    pub reason: Option<String>,
}

impl PageRequest {
    pub fn new(page_number: usize, page_size: usize, reason: Option<String>) -> Self {
        Self {
            page_number,
            page_size,
            reason,
        }
    }

    /// 解析触发原因
    pub fn sync_reason(&self) -> Option<SyncReason> {
        self.reason.as_deref().and_then(SyncReason::parse)
    }
}

/// 页面拉取器
///
/// 每次调用返回的 future 只完成一次：
/// - `Ok(())` 表示该页数据已写入宿主存储，协调器会把该页标记为新鲜
/// - `Err(_)` 表示任意原因的失败，该页保持失效，等待后续滚动或手动刷新重新拉取
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<()>;
}

#[async_trait]
impl<F: PageFetcher + ?Sized> PageFetcher for Arc<F> {
    async fn fetch_page(&self, request: PageRequest) -> Result<()> {
        (**self).fetch_page(request).await
    }
}

/// 常见的同步触发原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncReason {
    /// 列表页即将显示
    ViewWillAppear,
    /// 下拉刷新
    PullToRefresh,
    /// 筛选条件变化
    NewFiltersApplied,
}

impl SyncReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncReason::ViewWillAppear => "view_will_appear",
            SyncReason::PullToRefresh => "pull_to_refresh",
            SyncReason::NewFiltersApplied => "new_filters_applied",
        }
    }

    /// 未知字符串返回 None（原因对协调器是不透明的）
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view_will_appear" => Some(SyncReason::ViewWillAppear),
            "pull_to_refresh" => Some(SyncReason::PullToRefresh),
            "new_filters_applied" => Some(SyncReason::NewFiltersApplied),
            _ => None,
        }
    }
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 首页节流拉取器
///
/// 列表页每次出现都会触发首页重新同步。若距离上次成功的首页拉取不足 `min_interval`，
/// 原因为 `ViewWillAppear` 的首页请求直接返回成功，不访问内层拉取器。
/// 其它请求（下拉刷新、筛选变化、翻页）一律透传。
pub struct ThrottledFetcher<F> {
    inner: F,
    page_first_index: usize,
    min_interval: Duration,
    clock: Arc<dyn Clock>,
    /// 上次成功的首页拉取时间
    last_full_sync: Mutex<Option<DateTime<Utc>>>,
}

impl<F: PageFetcher> ThrottledFetcher<F> {
    pub fn new(inner: F, page_first_index: usize) -> Self {
        Self::with_clock(
            inner,
            page_first_index,
            Duration::from_secs(DEFAULT_MIN_FULL_SYNC_INTERVAL_SECS),
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        inner: F,
        page_first_index: usize,
        min_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            page_first_index,
            min_interval,
            clock,
            last_full_sync: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// 上次成功的首页拉取时间
    pub fn last_full_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_full_sync.lock()
    }

    fn should_skip(&self, request: &PageRequest) -> bool {
        if request.page_number != self.page_first_index
            || request.sync_reason() != Some(SyncReason::ViewWillAppear)
        {
            return false;
        }

        let Some(last) = *self.last_full_sync.lock() else {
            return false;
        };
        match self.clock.now().signed_duration_since(last).to_std() {
            Ok(elapsed) => elapsed < self.min_interval,
            // 时钟回拨
            Err(_) => true,
        }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for ThrottledFetcher<F> {
    async fn fetch_page(&self, request: PageRequest) -> Result<()> {
        if self.should_skip(&request) {
            debug!(
                "首页同步节流，跳过拉取: page_number={}, min_interval={:?}",
                request.page_number, self.min_interval
            );
            return Ok(());
        }

        let is_first_page = request.page_number == self.page_first_index;
        self.inner.fetch_page(request).await?;

        if is_first_page {
            *self.last_full_sync.lock() = Some(self.clock.now());
        }
        Ok(())
    }
}
