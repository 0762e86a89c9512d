//! Query/filter layer: pure filtering, sorting and pagination over read models.
//!
//! Nothing here reads a clock or a store. Callers pass views whose derived
//! fields (item status, loan status) were computed at a single `now`.

pub mod catalog;
pub mod items;
pub mod loans;
pub mod page;
pub mod summary;

pub use catalog::{CatalogFilter, filter_catalog};
pub use items::{ItemFilter, filter_items};
pub use loans::{LoanFilter, LoanSort, StatusTab, filter_loans, sort_loans};
pub use page::{Page, page_count, paginate};
pub use summary::{InventorySummary, StatusCounts, summarize};

/// Case-insensitive substring search over a fixed field set.
///
/// A blank query matches everything.
pub(crate) fn search_matches<'a>(query: &str, fields: impl IntoIterator<Item = &'a str>) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .any(|field| field.to_lowercase().contains(&query))
}
