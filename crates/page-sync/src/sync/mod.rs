/// 分页同步模块
///
/// 职责：
/// - 页面新鲜度（TTL）与拉取中状态记账
/// - 滚动到页尾时预取下一页
/// - 首页同步与全量重新同步（下拉刷新）

mod bookkeeping;
pub mod coordinator;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{PageSyncCoordinator, PageSyncStats, SyncCompletion};
