// 📄 Page Slicer
// 1-based pages over a filtered result; the total always counts the same filter.

use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: u64,
    per_page: u64,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    /// Values below 1 are clamped to 1.
    pub fn new(page: i64, per_page: i64) -> Self {
        Page {
            page: page.max(1) as u64,
            per_page: per_page.max(1) as u64,
        }
    }

    /// Parse raw query values. Unparseable values fall back to the defaults.
    pub fn from_params(page: Option<&str>, per_page: Option<&str>) -> Self {
        let parse = |raw: Option<&str>, default: u64| {
            raw.and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(default as i64)
        };

        Page::new(
            parse(page, DEFAULT_PAGE),
            parse(per_page, DEFAULT_PER_PAGE),
        )
    }

    pub fn number(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Index of the first item on this page
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Items `[offset, offset + per_page)` of `items`; empty past the last page.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let len = usize::try_from(self.per_page).unwrap_or(usize::MAX);

        items.iter().skip(start).take(len).cloned().collect()
    }
}

/// List response: one page of records plus the pre-slice total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub transactions: Vec<T>,
    pub total: u64,
}
