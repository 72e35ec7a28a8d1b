//! Types shared by every crate in the warehouse workspace.

pub mod listing;
pub mod types;

pub use listing::{ListQuery, Page, SortDirection};
pub use types::RecordId;
