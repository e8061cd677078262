/// Merge pipeline
///
/// Pure functions over input tables. Both joins are left outer joins: every
/// input record comes out exactly once and in its original order, whether
/// or not the right-hand table has a match.
use std::collections::HashMap;

use super::data::Record;
use crate::import::spreadsheet::TrackedRow;
use crate::import::status::ViewStatus;

/// Attach viewpoint statuses to records by view name
///
/// Records whose view is not filed under a status folder keep no status.
/// When a view appears more than once, its last row wins.
pub fn join_statuses(records: &[Record], statuses: &[ViewStatus]) -> Vec<Record> {
    let by_view: HashMap<&str, &ViewStatus> = statuses
        .iter()
        .map(|s| (s.view_name.as_str(), s))
        .collect();

    records
        .iter()
        .map(|record| Record {
            status: by_view.get(record.view_name.as_str()).map(|s| s.status),
            ..record.clone()
        })
        .collect()
}

/// Carry notes, usage and date-found over from tracked data by Clash ID
///
/// Field by field, a present tracked value replaces the parsed one. Status
/// always stays as parsed. When an ID is tracked more than once, its last
/// row wins.
pub fn merge_tracked(records: &[Record], tracked: &[TrackedRow]) -> Vec<Record> {
    let by_id: HashMap<&str, &TrackedRow> = tracked
        .iter()
        .map(|t| (t.clash_id.as_str(), t))
        .collect();

    let mut matched = 0;
    let merged: Vec<Record> = records
        .iter()
        .map(|record| {
            let Some(row) = by_id.get(record.clash_id.as_str()) else {
                return record.clone();
            };
            matched += 1;
            Record {
                notes: row.notes.clone().unwrap_or_else(|| record.notes.clone()),
                usage: row.usage.unwrap_or(record.usage),
                date_found: row.date_found.unwrap_or(record.date_found),
                ..record.clone()
            }
        })
        .collect();

    tracing::info!(matched, total = records.len(), "merged tracked annotations");
    merged
}
