/// Reviewer edits applied to the working table
///
/// The working table is the single mutable copy of the records under
/// review. Edits address a row by Clash ID and row position together, so
/// an edit made on one page of a filtered view still lands on the right
/// record after the filters or page change.
use chrono::NaiveDate;

use super::data::{Record, Usage};
use crate::error::{Error, Result};

/// Address of one row in the working table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditKey {
    pub clash_id: String,
    /// Index in the working table (not in the filtered view)
    pub position: usize,
}

impl EditKey {
    pub fn new(clash_id: impl Into<String>, position: usize) -> Self {
        Self {
            clash_id: clash_id.into(),
            position,
        }
    }
}

/// One reviewer change to a record
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Notes(String),
    Usage(Usage),
    DueDate(NaiveDate),
}

/// The session's mutable record table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingTable {
    records: Vec<Record>,
}

impl WorkingTable {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// Key for the record at `position`
    pub fn key(&self, position: usize) -> Option<EditKey> {
        self.records
            .get(position)
            .map(|r| EditKey::new(r.clash_id.clone(), position))
    }

    /// Apply an edit in place
    ///
    /// Fails with `Error::StaleEdit` when the row at the key's position no
    /// longer holds the key's Clash ID (the table was rebuilt underneath).
    pub fn apply(&mut self, key: &EditKey, edit: Edit) -> Result<()> {
        let record = self
            .records
            .get_mut(key.position)
            .filter(|r| r.clash_id == key.clash_id)
            .ok_or_else(|| Error::StaleEdit {
                clash_id: key.clash_id.clone(),
                position: key.position,
            })?;

        match edit {
            Edit::Notes(notes) => record.notes = notes,
            Edit::Usage(usage) => record.usage = usage,
            Edit::DueDate(date) => record.due_date = date,
        }
        Ok(())
    }

    /// Replace the records, e.g. after merging tracked data
    pub fn replace(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    /// Clone the records at the given positions
    pub fn select(&self, positions: &[usize]) -> Vec<Record> {
        positions
            .iter()
            .filter_map(|&i| self.records.get(i).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::fixtures::record;

    fn table() -> WorkingTable {
        WorkingTable::new(vec![record("C001", None), record("C002", None), record("C001", None)])
    }

    #[test]
    fn test_edit_hits_position_not_first_id() {
        let mut table = table();
        table
            .apply(&EditKey::new("C001", 2), Edit::Notes("second copy".to_string()))
            .unwrap();
        assert_eq!(table.get(0).unwrap().notes, "");
        assert_eq!(table.get(2).unwrap().notes, "second copy");
    }

    #[test]
    fn test_all_edit_kinds() {
        let mut table = table();
        let key = table.key(1).unwrap();
        let due = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        table.apply(&key, Edit::Usage(Usage::HighPriority)).unwrap();
        table.apply(&key, Edit::DueDate(due)).unwrap();
        table.apply(&key, Edit::Notes("a\nb".to_string())).unwrap();

        let record = table.get(1).unwrap();
        assert_eq!(record.usage, Usage::HighPriority);
        assert_eq!(record.due_date, due);
        assert_eq!(record.notes, "a\nb");
    }

    #[test]
    fn test_stale_edit_rejected() {
        let mut table = table();
        let err = table
            .apply(&EditKey::new("C002", 0), Edit::Usage(Usage::NotUsed))
            .unwrap_err();
        assert!(matches!(err, Error::StaleEdit { position: 0, .. }));
        assert!(table.apply(&EditKey::new("C001", 7), Edit::Usage(Usage::NotUsed)).is_err());
        assert_eq!(table, self::table());
    }

    #[test]
    fn test_not_used_leaves_status_alone() {
        let mut table = WorkingTable::new(vec![record("C001", None)]);
        table
            .apply(&EditKey::new("C001", 0), Edit::Usage(Usage::NotUsed))
            .unwrap();
        assert_eq!(table.get(0).unwrap().status, None);
    }
}
