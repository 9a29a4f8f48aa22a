//! 页面同步记账
//!
//! 只记录两件事：每页最近一次成功同步的时间，以及正在拉取中的页面。

use chrono::{DateTime, Utc};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// 页面同步记账
///
/// `pages_in_flight` 按页计数：显式的首页同步可以在同一页上重叠，
/// 该页要等最后一次拉取完成才离开“拉取中”状态。
#[derive(Debug, Default)]
pub(crate) struct SyncBookkeeping {
    /// 页码 -> 最近一次成功同步时间
    refresh_timestamps: HashMap<usize, DateTime<Utc>>,

    /// 页码 -> 未完成的拉取次数
    pages_in_flight: BTreeMap<usize, usize>,

    /// 每次重置加一，用来识别重置前发出的拉取
    generation: u64,
}

impl SyncBookkeeping {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 标记页面开始拉取，返回本次拉取所属的代
    pub(crate) fn begin(&mut self, page_number: usize) -> u64 {
        *self.pages_in_flight.entry(page_number).or_insert(0) += 1;
        self.generation
    }

    /// 标记页面拉取完成
    ///
    /// 成功时记录刷新时间（无论是否跨越了重置，数据都已经写入）。
    /// 重置前发出的拉取不再影响重置后的拉取中状态。返回 false 表示这是一次过期的完成。
    pub(crate) fn finish(
        &mut self,
        page_number: usize,
        generation: u64,
        refreshed_at: Option<DateTime<Utc>>,
    ) -> bool {
        if let Some(at) = refreshed_at {
            self.refresh_timestamps.insert(page_number, at);
        }

        if generation != self.generation {
            return false;
        }

        if let Entry::Occupied(mut entry) = self.pages_in_flight.entry(page_number) {
            *entry.get_mut() -= 1;
            if *entry.get() == 0 {
                entry.remove();
            }
        }
        true
    }

    pub(crate) fn reset(&mut self) {
        self.refresh_timestamps.clear();
        self.pages_in_flight.clear();
        self.generation += 1;
    }

    pub(crate) fn refreshed_at(&self, page_number: usize) -> Option<DateTime<Utc>> {
        self.refresh_timestamps.get(&page_number).copied()
    }

    pub(crate) fn is_in_flight(&self, page_number: usize) -> bool {
        self.pages_in_flight.contains_key(&page_number)
    }

    pub(crate) fn highest_in_flight(&self) -> Option<usize> {
        self.pages_in_flight.keys().next_back().copied()
    }

    pub(crate) fn pages_in_flight(&self) -> Vec<usize> {
        self.pages_in_flight.keys().copied().collect()
    }

    pub(crate) fn refresh_timestamps(&self) -> impl Iterator<Item = (usize, DateTime<Utc>)> + '_ {
        self.refresh_timestamps.iter().map(|(page, at)| (*page, *at))
    }

    pub(crate) fn synced_page_count(&self) -> usize {
        self.refresh_timestamps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_finish_success() {
        let mut book = SyncBookkeeping::new();
        let generation = book.begin(2);
        assert!(book.is_in_flight(2));
        assert_eq!(book.refreshed_at(2), None);

        let now = Utc::now();
        assert!(book.finish(2, generation, Some(now)));
        assert!(!book.is_in_flight(2));
        assert_eq!(book.refreshed_at(2), Some(now));
        assert_eq!(book.synced_page_count(), 1);
    }

    #[test]
    fn test_failure_keeps_previous_timestamp() {
        let mut book = SyncBookkeeping::new();
        let earlier = Utc::now();
        let generation = book.begin(3);
        book.finish(3, generation, Some(earlier));

        let generation = book.begin(3);
        book.finish(3, generation, None);
        assert_eq!(book.refreshed_at(3), Some(earlier));
        assert!(!book.is_in_flight(3));
    }

    #[test]
    fn test_overlapping_fetches_counted() {
        let mut book = SyncBookkeeping::new();
        let first = book.begin(1);
        let second = book.begin(1);
        assert_eq!(book.pages_in_flight(), vec![1]);

        book.finish(1, first, None);
        assert!(book.is_in_flight(1));

        book.finish(1, second, None);
        assert!(!book.is_in_flight(1));
    }

    #[test]
    fn test_highest_in_flight() {
        let mut book = SyncBookkeeping::new();
        assert_eq!(book.highest_in_flight(), None);
        book.begin(2);
        book.begin(5);
        book.begin(3);
        assert_eq!(book.highest_in_flight(), Some(5));
        assert_eq!(book.pages_in_flight(), vec![2, 3, 5]);
    }

    #[test]
    fn test_stale_completion_after_reset() {
        let mut book = SyncBookkeeping::new();
        let stale = book.begin(1);
        book.reset();

        let fresh = book.begin(1);
        let now = Utc::now();

        // 重置前的拉取完成：记录时间，但不把新一代的拉取移出
        assert!(!book.finish(1, stale, Some(now)));
        assert!(book.is_in_flight(1));
        assert_eq!(book.refreshed_at(1), Some(now));

        assert!(book.finish(1, fresh, None));
        assert!(!book.is_in_flight(1));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut book = SyncBookkeeping::new();
        let generation = book.begin(1);
        book.finish(1, generation, Some(Utc::now()));
        book.begin(2);

        book.reset();
        assert_eq!(book.synced_page_count(), 0);
        assert_eq!(book.refresh_timestamps().count(), 0);
        assert!(book.pages_in_flight().is_empty());
    }
}
