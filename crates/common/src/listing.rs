//! Pagination, sorting, and search parameters for listing endpoints.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the number of records a single page may hold.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Direction in which a listing is sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses a direction case-insensitively (`asc`, `ascending`, `desc`, `descending`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    /// Orients an ascending comparison result according to this direction.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Query parameters for a paginated, sortable, searchable listing.
///
/// Pages are 1-based. Out-of-range values are normalized rather than rejected:
/// page 0 becomes page 1 and the size is clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub size: u32,
    /// Field to sort by. `None` selects the listing's default field.
    pub sort_by: Option<String>,
    pub direction: SortDirection,
    /// Case-insensitive substring filter. Blank terms match everything.
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            direction: SortDirection::Asc,
            search: None,
        }
    }
}

impl ListQuery {
    /// Creates a query for the first page with default size and ordering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the 1-based page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Sets the page size.
    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Sets the sort field and direction.
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.direction = direction;
        self
    }

    /// Sets the search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Returns the effective page number (at least 1).
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Returns the effective page size (clamped to `1..=MAX_PAGE_SIZE`).
    pub fn effective_size(&self) -> u32 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Number of records skipped before the current page.
    pub fn offset(&self) -> usize {
        (self.effective_page() as usize - 1) * self.effective_size() as usize
    }

    /// Returns the lowercased search needle, or `None` if the term is blank.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    /// Cuts the current page out of an already filtered and sorted list.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.effective_size() as usize)
            .collect();
        Page {
            items,
            total,
            page: self.effective_page(),
            size: self.effective_size(),
        }
    }
}

/// One page of a listing together with the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of records matching the filter, across all pages.
    pub total: usize,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    /// Converts every item on the page, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

/// Returns true if `haystack` contains the (already lowercased) `needle`,
/// ignoring case.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
