//! Fixed-size pagination of result sets.
//!
//! Out-of-range page numbers never fail: they are clamped to the nearest
//! valid page. Missing or malformed numbers select the first page.

use serde::Serialize;

/// Default number of posts per listing page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A resolved, always valid slice of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub number: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of pages for `count` items. An empty set still has one page.
    pub fn num_pages(&self, count: u64) -> u64 {
        if count == 0 {
            1
        } else {
            count.div_ceil(self.per_page)
        }
    }

    /// Map a raw `?page=` value onto a valid page of a `count`-item set.
    ///
    /// `None`, blank or non-numeric → 1; `"last"` and numbers beyond the end
    /// → last page; zero and negatives → 1.
    pub fn resolve(&self, count: u64, requested: Option<&str>) -> PageRequest {
        let last = self.num_pages(count);
        let raw = requested.map(str::trim).unwrap_or_default();

        let number = if raw == "last" {
            last
        } else {
            match raw.parse::<i64>() {
                Ok(n) if n < 1 => 1,
                Ok(n) => (n as u64).min(last),
                Err(_) if is_overflowing_number(raw) => last,
                Err(_) => 1,
            }
        };

        PageRequest {
            number,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

fn is_overflowing_number(raw: &str) -> bool {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// One page of results plus the navigation data listings need.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub count: u64,
    pub per_page: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, count: u64, num_pages: u64) -> Self {
        Self {
            items,
            number: request.number,
            num_pages,
            count,
            per_page: request.limit,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    /// 1-based index of the first item on this page, 0 for an empty set.
    pub fn start_index(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            (self.number - 1) * self.per_page + 1
        }
    }

    /// 1-based index of the last item on this page.
    pub fn end_index(&self) -> u64 {
        if self.number == self.num_pages {
            self.count
        } else {
            self.number * self.per_page
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_in_range() {
        let paginator = Paginator::new(10);

        let first = paginator.resolve(25, Some("1"));
        assert_eq!((first.number, first.offset, first.limit), (1, 0, 10));

        let third = paginator.resolve(25, Some("3"));
        assert_eq!((third.number, third.offset), (3, 20));
    }

    #[test]
    fn test_resolve_clamps_to_nearest_page() {
        let paginator = Paginator::new(10);

        assert_eq!(paginator.resolve(25, Some("99")).number, 3);
        assert_eq!(paginator.resolve(25, Some("0")).number, 1);
        assert_eq!(paginator.resolve(25, Some("-4")).number, 1);
        assert_eq!(paginator.resolve(25, Some("last")).number, 3);
        assert_eq!(
            paginator.resolve(25, Some("123456789012345678901234567890")).number,
            3
        );
    }

    #[test]
    fn test_resolve_malformed_is_first_page() {
        let paginator = Paginator::new(10);

        assert_eq!(paginator.resolve(25, None).number, 1);
        assert_eq!(paginator.resolve(25, Some("")).number, 1);
        assert_eq!(paginator.resolve(25, Some("two")).number, 1);
    }

    #[test]
    fn test_empty_set_has_one_page() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.num_pages(0), 1);

        let request = paginator.resolve(0, Some("5"));
        assert_eq!((request.number, request.offset), (1, 0));

        let page: Page<u8> = Page::new(vec![], request, 0, 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
        assert_eq!(page.start_index(), 0);
        assert_eq!(page.end_index(), 0);
    }

    #[test]
    fn test_page_navigation() {
        let paginator = Paginator::new(10);
        let request = paginator.resolve(25, Some("2"));
        let page = Page::new((11..=20).collect::<Vec<u64>>(), request, 25, 3);

        assert_eq!(page.previous_page_number(), Some(1));
        assert_eq!(page.next_page_number(), Some(3));
        assert_eq!(page.start_index(), 11);
        assert_eq!(page.end_index(), 20);

        let last = Page::new((21..=25).collect::<Vec<u64>>(), paginator.resolve(25, Some("3")), 25, 3);
        assert_eq!(last.next_page_number(), None);
        assert_eq!(last.end_index(), 25);
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        assert_eq!(Paginator::new(0).per_page(), 1);
    }
}
