use serde::{Deserialize, Serialize};

/// Slice out 1-indexed `page` of `list`.
///
/// No clamping: page 0, a page past the end, or a zero page size yield an
/// empty slice.
pub fn paginate<T>(list: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let Some(start) = (page - 1).checked_mul(page_size) else {
        return &[];
    };
    if start >= list.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(list.len());
    &list[start..end]
}

/// Number of pages for `len` rows; an empty list still has one (empty) page.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// One page of results plus the counters a pager needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    pub fn of(list: &[T], page: usize, page_size: usize) -> Self {
        Self {
            items: paginate(list, page, page_size).to_vec(),
            page,
            page_size,
            total_items: list.len(),
            total_pages: page_count(list.len(), page_size),
        }
    }
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
