use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const CANDIDATES_PER_PAGE: usize = 15;

pub fn total_pages(count: usize) -> usize {
    count.div_ceil(CANDIDATES_PER_PAGE)
}

/// A page past the end, or page 0, goes back to page 1 rather than clamping.
pub fn effective_page(page: usize, total_pages: usize) -> usize {
    if page == 0 || page > total_pages {
        1
    } else {
        page
    }
}

pub fn page_bounds(page: usize, count: usize) -> Range<usize> {
    let start = page
        .saturating_sub(1)
        .saturating_mul(CANDIDATES_PER_PAGE)
        .min(count);
    let end = (start + CANDIDATES_PER_PAGE).min(count);
    start..end
}

/// Page rotation step: wraps from the last page to page 1.
pub fn next_page(page: usize, total_pages: usize) -> usize {
    if page < total_pages {
        page + 1
    } else {
        1
    }
}

pub fn previous_page(page: usize, total_pages: usize) -> usize {
    if page > 1 && page <= total_pages {
        page - 1
    } else {
        total_pages.max(1)
    }
}

/// 1-based department carousel index, reset to 1 when the selection shrank
/// below it.
pub fn department_index(index: usize, selected: usize) -> usize {
    if index == 0 || index > selected {
        1
    } else {
        index
    }
}

pub fn next_department(index: usize, selected: usize) -> usize {
    if selected == 0 {
        return 1;
    }
    if index < selected {
        index + 1
    } else {
        1
    }
}

pub fn prev_department(index: usize, selected: usize) -> usize {
    if selected == 0 {
        return 1;
    }
    if index > 1 && index <= selected {
        index - 1
    } else {
        selected
    }
}

pub fn rotate_unassigned(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (index + 1) % len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: usize,
    pub total_pages: usize,
    pub count: usize,
    pub start: usize,
    pub end: usize,
}

impl PageInfo {
    pub fn resolve(requested: usize, count: usize) -> Self {
        let total_pages = total_pages(count);
        let page = effective_page(requested, total_pages);
        let range = page_bounds(page, count);
        Self {
            page,
            total_pages,
            count,
            start: range.start,
            end: range.end,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn rotates(&self) -> bool {
        self.total_pages > 1
    }
}
