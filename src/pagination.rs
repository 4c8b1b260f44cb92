// 📄 Pagination Engine - 1-indexed pages over the filtered result set

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizeChoice {
    Fixed(usize),
    /// Every match at selection time; not recomputed when matches grow
    All,
}

/// Page sizes offered to the user, in cycling order
pub const PAGE_SIZE_MENU: [PageSizeChoice; 5] = [
    PageSizeChoice::Fixed(50),
    PageSizeChoice::Fixed(100),
    PageSizeChoice::Fixed(200),
    PageSizeChoice::Fixed(500),
    PageSizeChoice::All,
];

/// `ceil(len / page_size)`, zero when there are no matches
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if len == 0 || page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Slice `matches[(page-1)*size .. page*size]`, clamped to the bounds
pub fn paginate<T>(matches: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }

    let start = (page - 1).saturating_mul(page_size);
    if start >= matches.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(matches.len());
    &matches[start..end]
}

// ============================================================================
// PAGER STATE
// ============================================================================

/// Current page and page size for one result view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
    choice: PageSizeChoice,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new()
    }
}

impl Pager {
    pub fn new() -> Self {
        Pager {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            choice: PageSizeChoice::Fixed(DEFAULT_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn choice(&self) -> PageSizeChoice {
        self.choice
    }

    pub fn total_pages(&self, len: usize) -> usize {
        total_pages(len, self.page_size)
    }

    /// Back to page 1 (query changed)
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Jump to `page`; outside `[1, total_pages]` nothing changes
    pub fn go_to(&mut self, page: usize, len: usize) -> bool {
        if page >= 1 && page <= self.total_pages(len) {
            self.page = page;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self, len: usize) -> bool {
        self.go_to(self.page + 1, len)
    }

    pub fn previous(&mut self, len: usize) -> bool {
        match self.page.checked_sub(1) {
            Some(page) => self.go_to(page, len),
            None => false,
        }
    }

    /// Apply a menu choice; `All` snapshots the current match count
    pub fn select_size(&mut self, choice: PageSizeChoice, len: usize) {
        self.choice = choice;
        self.page_size = match choice {
            PageSizeChoice::Fixed(size) => size.max(1),
            PageSizeChoice::All => len.max(1),
        };
        self.page = 1;
    }

    /// Move to the next entry of `PAGE_SIZE_MENU`, wrapping around
    pub fn cycle_size(&mut self, len: usize) {
        let position = PAGE_SIZE_MENU
            .iter()
            .position(|c| *c == self.choice)
            .unwrap_or(0);
        let next = PAGE_SIZE_MENU[(position + 1) % PAGE_SIZE_MENU.len()];
        self.select_size(next, len);
    }

    /// Keep the page valid after the match set shrank underneath it
    pub fn clamp(&mut self, len: usize) {
        let total = self.total_pages(len);
        self.page = self.page.min(total).max(1);
    }

    pub fn slice<'a, T>(&self, matches: &'a [T]) -> &'a [T] {
        paginate(matches, self.page, self.page_size)
    }

    /// 1-based `(first, last)` item numbers shown on the current page
    pub fn window(&self, len: usize) -> Option<(usize, usize)> {
        let start = (self.page - 1) * self.page_size;
        if start >= len {
            return None;
        }
        Some((start + 1, (start + self.page_size).min(len)))
    }
}
