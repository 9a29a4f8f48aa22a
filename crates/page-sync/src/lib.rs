//! Page Sync - 分页列表同步协调器
//!
//! 列表页在用户滚动时按页从服务端拉取数据。本 crate 负责决定“什么时候拉哪一页”：
//! - 📄 页码换算与页尾检测
//! - ⏱️ 页面新鲜度（TTL）记录，过期才重新拉取
//! - 🔄 拉取中状态跟踪，避免同一页重复预取
//! - 📡 同步事件广播，驱动下拉刷新和底部加载动画
//!
//! 实际的网络请求和本地存储由宿主实现 [`PageFetcher`]。
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use page_sync::{PageFetcher, PageRequest, PageSyncConfig, PageSyncCoordinator, SyncReason};
//!
//! struct OrdersFetcher;
//!
//! #[async_trait]
//! impl PageFetcher for OrdersFetcher {
//!     async fn fetch_page(&self, request: PageRequest) -> page_sync::Result<()> {
//!         println!("拉取第 {} 页，每页 {} 条", request.page_number, request.page_size);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let coordinator = PageSyncCoordinator::new(PageSyncConfig::default())?;
//!     let fetcher = Arc::new(OrdersFetcher);
//!     coordinator.set_fetcher(&fetcher);
//!
//!     // 列表页出现：拉取首页
//!     coordinator
//!         .synchronize_first_page(Some(SyncReason::ViewWillAppear.as_str()), None)
//!         .await?;
//!
//!     // 第 25 条（下标 24）可见：预取第 2 页
//!     if let Some(handle) = coordinator.ensure_next_page_is_synchronized(24) {
//!         handle.await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod sync;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{PageSyncConfig, PageSyncConfigBuilder};
pub use error::{PageSyncError, Result};
pub use events::{PageSyncEvent, PageSyncEventBus};
pub use fetcher::{PageFetcher, PageRequest, SyncReason, ThrottledFetcher};
pub use sync::{PageSyncCoordinator, PageSyncStats, SyncCompletion};

/// crate semver，来自 Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
