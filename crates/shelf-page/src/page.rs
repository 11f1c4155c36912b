use serde::{Deserialize, Serialize};

use crate::error::{PageError, PageResult};

/// One window over a paginated sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// 1-based index of the first item in the full sequence.
    pub start: usize,
    /// 1-based index of the last item in the full sequence.
    pub end: usize,
    /// The items of this page, in original order.
    pub items: Vec<T>,
    /// Length of the full sequence.
    pub total: usize,
    /// Requested page size. The last page may hold fewer items.
    pub per_page: usize,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-based page number. A page with no size counts as the first.
    pub fn number(&self) -> usize {
        self.start
            .saturating_sub(1)
            .checked_div(self.per_page)
            .map_or(1, |index| index + 1)
    }

    /// Returns `true` if no page follows this one.
    pub fn is_last(&self) -> bool {
        self.end == self.total
    }
}

/// Divide `items` into pages of at most `per_page` elements.
///
/// An empty input yields no pages, not one empty page.
pub fn paginate<T: Clone>(per_page: usize, items: &[T]) -> PageResult<Vec<Page<T>>> {
    if per_page == 0 {
        return Err(PageError::ZeroPageSize);
    }
    let total = items.len();
    let pages = items
        .chunks(per_page)
        .enumerate()
        .map(|(index, chunk)| {
            let offset = index * per_page;
            Page {
                start: offset + 1,
                end: offset + chunk.len(),
                items: chunk.to_vec(),
                total,
                per_page,
            }
        })
        .collect();
    Ok(pages)
}
