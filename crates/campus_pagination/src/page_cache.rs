use std::ops::Range;

use fxhash::{FxHashMap, FxHashSet};

/// Stamp of one in-flight request for a page slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    page: u32,
    seq: u64,
}

impl RequestTicket {
    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Flat, index-addressable item store partitioned into pages of `limit`
/// items. Page `p` lives at `[(p - 1) * limit, p * limit)`.
pub struct PageCache<T> {
    limit: u32,
    slots: Vec<Option<T>>,
    fetched: FxHashSet<u32>,
    latest_ticket: FxHashMap<u32, u64>,
    next_seq: u64,
}

impl<T> PageCache<T> {
    pub fn new(limit: u32) -> Self {
        PageCache {
            limit: limit.max(1),
            slots: Vec::new(),
            fetched: FxHashSet::default(),
            latest_ticket: FxHashMap::default(),
            next_seq: 0,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn range(&self, page: u32) -> Range<usize> {
        let limit = self.limit as usize;
        let start = (page.max(1) as usize - 1) * limit;
        start..start + limit
    }

    /// Number of stored items across all pages.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_page(&self, page: u32) -> bool {
        self.fetched.contains(&page)
    }

    pub fn cached_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.fetched.iter().copied().collect();
        pages.sort_unstable();
        pages
    }

    /// Drops every item and invalidates all outstanding tickets.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.fetched.clear();
        self.latest_ticket.clear();
    }

    /// Overwrites exactly the range of `page`. Extra items are truncated, a
    /// short page leaves the rest of its range empty.
    pub fn replace_page(&mut self, page: u32, items: Vec<T>) {
        let range = self.range(page);

        if self.slots.len() < range.end {
            self.slots.resize_with(range.end, || None);
        }

        let mut items = items.into_iter().take(range.len());
        for slot in &mut self.slots[range] {
            *slot = items.next();
        }

        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }

        self.fetched.insert(page);
    }

    /// Supersedes every ticket previously issued for `page`.
    pub fn issue_ticket(&mut self, page: u32) -> RequestTicket {
        self.next_seq += 1;
        self.latest_ticket.insert(page, self.next_seq);

        RequestTicket {
            page,
            seq: self.next_seq,
        }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest_ticket.get(&ticket.page) == Some(&ticket.seq)
    }

    /// Stores `items` only if no newer request for the same page was issued
    /// since `ticket`. Returns whether the items were stored.
    pub fn apply(&mut self, ticket: RequestTicket, items: Vec<T>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.replace_page(ticket.page, items);
        true
    }

    /// Items of `page`, empty if it was never fetched.
    pub fn slice(&self, page: u32) -> Vec<&T> {
        let range = self.range(page);
        let end = range.end.min(self.slots.len());

        if range.start >= end {
            return Vec::new();
        }

        self.slots[range.start..end].iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_items(page: u32, count: u32) -> Vec<String> {
        (0..count).map(|i| format!("p{page}-{i}")).collect()
    }

    #[test]
    fn test_replace_page_only_touches_its_range() {
        let mut cache = PageCache::new(3);
        cache.replace_page(1, page_items(1, 3));
        cache.replace_page(2, page_items(2, 3));
        cache.replace_page(3, page_items(3, 3));

        cache.replace_page(2, vec!["new".to_string()]);

        assert_eq!(cache.slice(1), vec!["p1-0", "p1-1", "p1-2"]);
        assert_eq!(cache.slice(2), vec!["new"]);
        assert_eq!(cache.slice(3), vec!["p3-0", "p3-1", "p3-2"]);
        assert_eq!(cache.len(), 7);
    }

    #[test]
    fn test_truncates_oversized_page() {
        let mut cache = PageCache::new(2);
        cache.replace_page(1, page_items(1, 5));

        assert_eq!(cache.slice(1).len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_gap_pages_stay_empty() {
        let mut cache = PageCache::new(20);
        cache.replace_page(1, page_items(1, 20));
        cache.replace_page(3, page_items(3, 5));

        assert!(cache.slice(2).is_empty());
        assert!(!cache.contains_page(2));
        assert_eq!(cache.slice(3).len(), 5);
        assert_eq!(cache.len(), 25);
        assert_eq!(cache.cached_pages(), vec![1, 3]);
    }

    #[test]
    fn test_empty_page_is_still_cached() {
        let mut cache: PageCache<String> = PageCache::new(10);
        cache.replace_page(4, Vec::new());

        assert!(cache.contains_page(4));
        assert!(cache.slice(4).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stale_ticket_is_rejected() {
        let mut cache = PageCache::new(2);
        let first = cache.issue_ticket(2);
        let second = cache.issue_ticket(2);

        assert!(cache.apply(second, vec!["fresh".to_string()]));
        assert!(!cache.apply(first, vec!["stale".to_string()]));
        assert_eq!(cache.slice(2), vec!["fresh"]);
    }

    #[test]
    fn test_clear_invalidates_tickets() {
        let mut cache = PageCache::new(2);
        let ticket = cache.issue_ticket(1);
        cache.clear();

        assert!(!cache.apply(ticket, vec!["old".to_string()]));
        assert!(cache.is_empty());
        assert!(!cache.contains_page(1));
    }
}
