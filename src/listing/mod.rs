//! Client-side list view: filters an in-memory record set and slices the
//! result into fixed-size pages.
//!
//! Records keep the order they were loaded in; nothing here sorts.

pub mod criteria;
pub mod page;

use serde::Serialize;
use tracing::debug;

use crate::models::Animal;

pub use criteria::FilterCriteria;
pub use page::{page_buttons, total_pages, PageError, PageWindow};

pub const DEFAULT_PAGE_SIZE: usize = 6;

pub fn filter_records<'a>(records: &'a [Animal], criteria: &FilterCriteria) -> Vec<&'a Animal> {
    records.iter().filter(|a| criteria.matches(a)).collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListingStats {
    pub total: usize,
    pub dogs: usize,
    pub cats: usize,
    pub others: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<'a> {
    pub items: Vec<&'a Animal>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_filtered: usize,
    pub buttons: Vec<usize>,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageView<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ListController {
    records: Vec<Animal>,
    filtered: Vec<usize>,
    criteria: FilterCriteria,
    page_size: usize,
    page: usize,
}

impl ListController {
    pub fn new(records: Vec<Animal>, page_size: usize) -> Result<Self, PageError> {
        if page_size == 0 {
            return Err(PageError::InvalidPageSize);
        }
        let filtered = (0..records.len()).collect();
        Ok(Self {
            records,
            filtered,
            criteria: FilterCriteria::default(),
            page_size,
            page: 1,
        })
    }

    pub fn records(&self) -> &[Animal] {
        &self.records
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn page_number(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered.len(), self.page_size)
    }

    pub fn filtered(&self) -> impl Iterator<Item = &Animal> + '_ {
        self.filtered.iter().map(move |&i| &self.records[i])
    }

    /// Replaces the criteria, refilters, and goes back to page 1.
    pub fn apply(&mut self, criteria: FilterCriteria) {
        self.filtered = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, a)| criteria.matches(a))
            .map(|(i, _)| i)
            .collect();
        debug!(
            keys = ?criteria.active_keys(),
            matched = self.filtered.len(),
            total = self.records.len(),
            "applied filters"
        );
        self.criteria = criteria;
        self.page = 1;
    }

    pub fn reset(&mut self) {
        self.apply(FilterCriteria::default());
    }

    pub fn set_page(&mut self, page: usize) -> Result<(), PageError> {
        PageWindow::compute(self.filtered.len(), self.page_size, page)?;
        self.page = page;
        Ok(())
    }

    pub fn next_page(&mut self) -> bool {
        if self.page < self.total_pages() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn window(&self) -> PageWindow {
        // `page` only changes through set_page/next/prev/apply, so it is
        // always valid for the current filtered count.
        PageWindow::compute(self.filtered.len(), self.page_size, self.page).unwrap_or(PageWindow {
            page: 1,
            page_size: self.page_size,
            total_pages: self.total_pages(),
            range: 0..0,
        })
    }

    pub fn view(&self) -> PageView<'_> {
        let window = self.window();
        let items = self.filtered[window.range.clone()]
            .iter()
            .map(|&i| &self.records[i])
            .collect();
        PageView {
            items,
            page: window.page,
            page_size: self.page_size,
            total_pages: window.total_pages,
            total_filtered: self.filtered.len(),
            buttons: page_buttons(window.page, window.total_pages),
            has_prev: window.has_prev(),
            has_next: window.has_next(),
        }
    }

    pub fn stats(&self) -> ListingStats {
        let mut stats = ListingStats {
            total: self.filtered.len(),
            ..ListingStats::default()
        };
        for animal in self.filtered() {
            if animal.is_dog() {
                stats.dogs += 1;
            } else if animal.is_cat() {
                stats.cats += 1;
            } else {
                stats.others += 1;
            }
        }
        stats
    }
}
