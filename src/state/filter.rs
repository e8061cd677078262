/// Record filters for the review view and exports
///
/// Two independent filters, combined with AND:
/// - a status selection (which statuses to keep, absent status included)
/// - one exact-match value per filterable column, or `All`
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::data::{Column, Record, Status};

/// Label of the wildcard column filter
pub const ALL: &str = "All";

/// One column's filter value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnFilter {
    #[default]
    All,
    Value(String),
}

impl ColumnFilter {
    /// Build from a picker label, where "All" means no filter
    pub fn from_choice(choice: &str) -> Self {
        if choice == ALL {
            ColumnFilter::All
        } else {
            ColumnFilter::Value(choice.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            ColumnFilter::All => true,
            ColumnFilter::Value(wanted) => wanted == value,
        }
    }
}

impl fmt::Display for ColumnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnFilter::All => f.write_str(ALL),
            ColumnFilter::Value(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    /// None keeps every status
    statuses: Option<HashSet<Option<Status>>>,
    columns: HashMap<Column, ColumnFilter>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only records whose status is in `selected`
    pub fn select_statuses(&mut self, selected: impl IntoIterator<Item = Option<Status>>) {
        self.statuses = Some(selected.into_iter().collect());
    }

    /// Drop the status selection (keep everything)
    pub fn clear_statuses(&mut self) {
        self.statuses = None;
    }

    pub fn status_selected(&self, status: Option<Status>) -> bool {
        self.statuses.as_ref().map_or(true, |s| s.contains(&status))
    }

    /// Toggle one status in the selection, starting from `available` when
    /// nothing has been deselected yet
    pub fn toggle_status(&mut self, status: Option<Status>, available: &[Option<Status>]) {
        let selection = self
            .statuses
            .get_or_insert_with(|| available.iter().copied().collect());
        if !selection.remove(&status) {
            selection.insert(status);
        }
    }

    pub fn set_column(&mut self, column: Column, filter: ColumnFilter) {
        match filter {
            ColumnFilter::All => {
                self.columns.remove(&column);
            }
            value => {
                self.columns.insert(column, value);
            }
        }
    }

    pub fn column(&self, column: Column) -> ColumnFilter {
        self.columns.get(&column).cloned().unwrap_or_default()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.status_selected(record.status)
            && self
                .columns
                .iter()
                .all(|(column, filter)| filter.matches(&record.value(*column)))
    }

    /// Positions of the matching records, in table order
    pub fn apply(&self, records: &[Record]) -> Vec<usize> {
        records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.matches(r))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Distinct values of a column in first-seen order
pub fn column_options(records: &[Record], column: Column) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.value(column))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Distinct statuses present (absent status included) in first-seen order
pub fn status_options(records: &[Record]) -> Vec<Option<Status>> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.status)
        .filter(|s| seen.insert(*s))
        .collect()
}
