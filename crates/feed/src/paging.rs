/// Articles shown per feed page.
pub const ITEMS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

pub fn total_pages(len: usize) -> usize {
    len.div_ceil(ITEMS_PER_PAGE)
}

/// Items on 1-based `page`; empty past the end.
pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(ITEMS_PER_PAGE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + ITEMS_PER_PAGE).min(items.len());
    &items[start..end]
}

/// Numbered buttons around `current`, first and last always shown.
pub fn page_list(current: usize, total: usize) -> Vec<PageItem> {
    let mut pages = Vec::new();
    if total <= 1 {
        return pages;
    }

    pages.push(PageItem::Page(1));
    if current > 3 {
        pages.push(PageItem::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (total - 1).min(current + 1);
    for i in start..=end {
        pages.push(PageItem::Page(i));
    }

    if current + 2 < total {
        pages.push(PageItem::Ellipsis);
    }
    pages.push(PageItem::Page(total));
    pages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub current: usize,
    pub total: usize,
}

impl Pager {
    pub fn new(len: usize) -> Self {
        Self {
            current: 1,
            total: total_pages(len),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total
    }

    /// Jump to `page`, clamped to the valid range.
    pub fn go_to(&mut self, page: usize) {
        self.current = page.clamp(1, self.total.max(1));
    }

    pub fn previous(&mut self) {
        if self.has_previous() {
            self.current -= 1;
        }
    }

    pub fn next(&mut self) {
        if self.has_next() {
            self.current += 1;
        }
    }

    pub fn items(&self) -> Vec<PageItem> {
        page_list(self.current, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::{PageItem::Ellipsis, PageItem::Page, Pager, page_list, page_slice, total_pages};
    use pretty_assertions::assert_eq;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
    }

    #[test]
    fn single_page_has_no_buttons() {
        assert!(page_list(1, 0).is_empty());
        assert!(page_list(1, 1).is_empty());
    }

    #[test]
    fn page_lists() {
        assert_eq!(page_list(1, 2), vec![Page(1), Page(2)]);
        assert_eq!(page_list(1, 10), vec![Page(1), Page(2), Ellipsis, Page(10)]);
        assert_eq!(
            page_list(5, 10),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
        assert_eq!(page_list(10, 10), vec![Page(1), Ellipsis, Page(9), Page(10)]);
        assert_eq!(page_list(3, 5), vec![Page(1), Page(2), Page(3), Page(4), Page(5)]);
    }

    #[test]
    fn slices_pages() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(page_slice(&items, 1), &items[0..10]);
        assert_eq!(page_slice(&items, 3), &items[20..25]);
        assert!(page_slice(&items, 4).is_empty());
        assert_eq!(page_slice(&items, 0), &items[0..10]);
    }

    #[test]
    fn pager_bounds() {
        let mut pager = Pager::new(25);
        assert!(!pager.has_previous());
        pager.previous();
        assert_eq!(pager.current, 1);
        pager.go_to(99);
        assert_eq!(pager.current, 3);
        assert!(!pager.has_next());
        pager.next();
        assert_eq!(pager.current, 3);
        pager.previous();
        assert_eq!(pager.current, 2);
    }
}
