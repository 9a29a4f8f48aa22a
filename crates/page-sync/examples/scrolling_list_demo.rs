//! 模拟一个订单列表页：出现时同步首页，滚动到页尾时预取下一页，最后下拉刷新。
//!
//! 运行：cargo run -p page-sync --example scrolling_list_demo

use async_trait::async_trait;
use page_sync::{
    PageFetcher, PageRequest, PageSyncConfig, PageSyncCoordinator, PageSyncError, PageSyncEvent,
    SyncReason, ThrottledFetcher,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 模拟服务端：共 60 条订单，第 3 页第一次请求失败
struct FakeOrdersApi {
    total: usize,
    loaded: Mutex<Vec<usize>>,
    page_three_failed_once: AtomicBool,
}

impl FakeOrdersApi {
    fn new(total: usize) -> Self {
        Self {
            total,
            loaded: Mutex::new(Vec::new()),
            page_three_failed_once: AtomicBool::new(false),
        }
    }

    fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }
}

#[async_trait]
impl PageFetcher for FakeOrdersApi {
    async fn fetch_page(&self, request: PageRequest) -> page_sync::Result<()> {
        tokio::time::sleep(Duration::from_millis(50)).await;

        if request.page_number == 3 && !self.page_three_failed_once.swap(true, Ordering::SeqCst) {
            return Err(PageSyncError::fetch("502 Bad Gateway"));
        }

        let start = (request.page_number - 1) * request.page_size;
        let end = (start + request.page_size).min(self.total);
        let mut loaded = self.loaded.lock();
        for order_id in start..end {
            if !loaded.contains(&order_id) {
                loaded.push(order_id);
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = PageSyncConfig::builder().page_size(25).build();
    let coordinator = PageSyncCoordinator::new(config)?;
    let api = Arc::new(ThrottledFetcher::new(
        FakeOrdersApi::new(60),
        coordinator.page_first_index(),
    ));
    coordinator.set_fetcher(&api);

    let mut events = coordinator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let PageSyncEvent::PageSyncFinished { page_number, success } = event {
                println!("📡 第 {} 页同步结束: success={}", page_number, success);
            }
        }
    });

    // 1. 列表页出现
    coordinator
        .synchronize_first_page(Some(SyncReason::ViewWillAppear.as_str()), None)
        .await?;
    println!("✅ 首页已加载: {} 条", api.inner().loaded_count());

    // 2. 切走再回来，30 秒内不会重复拉取首页
    coordinator
        .synchronize_first_page(Some(SyncReason::ViewWillAppear.as_str()), None)
        .await?;

    // 3. 滚动到第 25 条，预取第 2 页
    if let Some(handle) = coordinator.ensure_next_page_is_synchronized(24) {
        println!("⏳ 底部加载中: {}", coordinator.is_fetching_beyond(api.inner().loaded_count()));
        handle.await?;
    }
    println!("✅ 已加载: {} 条", api.inner().loaded_count());

    // 4. 滚动到第 50 条，第 3 页第一次失败
    if let Some(handle) = coordinator.ensure_next_page_is_synchronized(49) {
        handle.await?;
    }
    println!("⚠️ 第 3 页仍然失效: {}", coordinator.is_cache_invalid(3));

    // 5. 再次滚动到底部时重新拉取
    if let Some(handle) = coordinator.ensure_next_page_is_synchronized(49) {
        handle.await?;
    }
    println!("✅ 已加载: {} 条", api.inner().loaded_count());

    // 6. 下拉刷新
    coordinator
        .resynchronize(
            Some(SyncReason::PullToRefresh.as_str()),
            Some(Box::new(|| println!("🔄 下拉刷新结束"))),
        )
        .await?;

    println!("📊 {}", serde_json::to_string_pretty(&coordinator.stats())?);
    Ok(())
}
