/// State management module
///
/// This module handles all review state, including:
/// - Shared data structures (data.rs)
/// - Status and tracked-data joins (merge.rs)
/// - Status and column filters (filter.rs)
/// - Paging over the filtered view (page.rs)
/// - Per-record edits on the working table (edit.rs)
/// - The session context tying them together (session.rs)

pub mod data;
pub mod edit;
pub mod filter;
pub mod merge;
pub mod page;
pub mod session;
