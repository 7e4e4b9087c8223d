use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

/// Tracks the visible page. `current_page` always stays within
/// `[1, max(total_pages, 1)]`; out-of-range moves are ignored.
#[derive(Debug, Clone)]
pub struct PaginationController {
    current_page: u32,
    total_pages: u32,
    // First page seen shorter than the limit.
    last_page: Option<u32>,
}

impl PaginationController {
    pub fn new() -> Self {
        PaginationController {
            current_page: 1,
            total_pages: 1,
            last_page: None,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    fn upper_bound(&self) -> u32 {
        self.total_pages.max(1)
    }

    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
            && self.last_page.is_none_or(|last| self.current_page < last)
    }

    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }

    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.upper_bound() {
            return false;
        }

        self.current_page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }

        self.current_page += 1;
        true
    }

    pub fn prev(&mut self) -> bool {
        if !self.has_prev_page() {
            return false;
        }

        self.current_page -= 1;
        true
    }

    /// Records the metadata of a response received for `page`.
    pub fn update(&mut self, page: u32, total_pages: u32, is_last_page: bool) {
        self.total_pages = total_pages;

        if is_last_page {
            self.last_page = Some(page);
        } else if self.last_page.is_some_and(|last| last <= page) {
            self.last_page = None;
        }

        self.current_page = self.current_page.clamp(1, self.upper_bound());
    }

    pub fn reset(&mut self) {
        *self = PaginationController::new();
    }

    pub fn state(&self) -> PaginationState {
        PaginationState {
            current_page: self.current_page,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page(),
            has_prev_page: self.has_prev_page(),
        }
    }
}

impl Default for PaginationController {
    fn default() -> Self {
        PaginationController::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller_with_pages(total_pages: u32) -> PaginationController {
        let mut controller = PaginationController::new();
        controller.update(1, total_pages, false);
        controller
    }

    #[test]
    fn test_initial_state() {
        let controller = PaginationController::new();
        assert_eq!(
            controller.state(),
            PaginationState {
                current_page: 1,
                total_pages: 1,
                has_next_page: false,
                has_prev_page: false,
            }
        );
    }

    #[test]
    fn test_go_to_every_valid_page() {
        let mut controller = controller_with_pages(7);

        for page in 1..=7 {
            assert!(controller.go_to_page(page));
            assert_eq!(controller.current_page(), page);
        }
    }

    #[test]
    fn test_go_to_out_of_range_is_noop() {
        let mut controller = controller_with_pages(4);
        controller.go_to_page(2);

        assert!(!controller.go_to_page(0));
        assert!(!controller.go_to_page(5));
        assert_eq!(controller.current_page(), 2);
    }

    #[test]
    fn test_next_and_prev_at_bounds() {
        let mut controller = controller_with_pages(3);

        assert!(!controller.prev());
        assert_eq!(controller.current_page(), 1);

        assert!(controller.next());
        assert!(controller.next());
        assert!(!controller.next());
        assert_eq!(controller.current_page(), 3);
        assert!(controller.has_prev_page());
    }

    #[test]
    fn test_short_page_disables_next() {
        let mut controller = PaginationController::new();
        controller.update(1, 5, true);

        assert_eq!(controller.total_pages(), 5);
        assert!(!controller.has_next_page());
        assert!(!controller.next());
    }

    #[test]
    fn test_full_page_clears_stale_last_page() {
        let mut controller = PaginationController::new();
        controller.update(1, 3, true);
        controller.update(1, 3, false);

        assert!(controller.has_next_page());
    }

    #[test]
    fn test_shrinking_total_clamps_current_page() {
        let mut controller = controller_with_pages(5);
        controller.go_to_page(5);
        controller.update(5, 2, false);

        assert_eq!(controller.current_page(), 2);
    }

    #[test]
    fn test_empty_collection_stays_on_first_page() {
        let mut controller = PaginationController::new();
        controller.update(1, 0, true);

        assert_eq!(controller.current_page(), 1);
        assert!(!controller.has_next_page());
        assert!(!controller.go_to_page(2));
    }
}
