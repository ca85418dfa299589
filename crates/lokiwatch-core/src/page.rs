// ── Paged result sets ──

use serde::{Deserialize, Serialize};

/// One page of a list view.
///
/// Invariants: `page >= 1`, `page_size >= 1`, `items.len() <= page_size`,
/// and `total_count == 0` implies `items` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Build a page from a server-paginated response.
    ///
    /// Clamps `page`/`page_size` to at least 1 and drops surplus items so
    /// the invariants hold even if the backend misbehaves.
    pub fn new(mut items: Vec<T>, total_count: u64, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        if total_count == 0 {
            items.clear();
        }
        items.truncate(usize::try_from(page_size).unwrap_or(usize::MAX));
        Self {
            items,
            total_count,
            page,
            page_size,
        }
    }

    /// Paginate a complete list client-side.
    ///
    /// Pages past the end come back empty with the real `total_count`.
    pub fn slice(all: Vec<T>, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_count = u64::try_from(all.len()).unwrap_or(u64::MAX);

        let size = usize::try_from(page_size).unwrap_or(usize::MAX);
        let skip = usize::try_from(page - 1)
            .unwrap_or(usize::MAX)
            .saturating_mul(size);
        let items = all.into_iter().skip(skip).take(size).collect();

        Self {
            items,
            total_count,
            page,
            page_size,
        }
    }

    /// `ceil(total_count / page_size)`; 0 for an empty result set.
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

pub(crate) fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let pages = total_count.div_ceil(u64::from(page_size.max(1)));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
