//! 协调器测试用的拉取器

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{PageSyncError, Result};
use crate::fetcher::{PageFetcher, PageRequest};

/// 记录所有请求的拉取器
///
/// gated 模式下每次拉取都要等 `release` 放行，不放行就永远不完成。
pub(crate) struct ScriptedFetcher {
    requests: Mutex<Vec<PageRequest>>,
    failing_pages: Mutex<HashSet<usize>>,
    gated: bool,
    permits: Semaphore,
}

impl ScriptedFetcher {
    fn build(gated: bool) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            failing_pages: Mutex::new(HashSet::new()),
            gated,
            permits: Semaphore::new(0),
        })
    }

    /// 立即完成
    pub(crate) fn immediate() -> Arc<Self> {
        Self::build(false)
    }

    /// 等待放行
    pub(crate) fn gated() -> Arc<Self> {
        Self::build(true)
    }

    pub(crate) fn fail_page(&self, page_number: usize) {
        self.failing_pages.lock().insert(page_number);
    }

    pub(crate) fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    pub(crate) fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn fetch_count(&self, page_number: usize) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.page_number == page_number)
            .count()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, request: PageRequest) -> Result<()> {
        let page_number = request.page_number;
        self.requests.lock().push(request);

        if self.gated {
            if let Ok(permit) = self.permits.acquire().await {
                permit.forget();
            }
        }

        if self.failing_pages.lock().contains(&page_number) {
            Err(PageSyncError::fetch(format!("page {} unavailable", page_number)))
        } else {
            Ok(())
        }
    }
}

/// 让已派发的拉取任务跑到各自的等待点
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
