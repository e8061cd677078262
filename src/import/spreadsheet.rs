/// Spreadsheet reader for previously exported note sheets
///
/// A sheet can be read two ways:
/// - as tracked data, merged back onto a fresh parse (only Clash ID, Notes,
///   Usage and Date Found are needed)
/// - as a complete working table, when no HTML/XML export is at hand
use chrono::{Local, NaiveDate};
use csv::StringRecord;
use std::collections::HashMap;

use super::date::parse_date_lenient;
use crate::error::{Error, Result};
use crate::state::data::{Column, Record, Status, Usage, UNASSIGNED};

/// UTF-8 byte order mark written by (and tolerated from) spreadsheet tools
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Annotations carried over from an earlier export
///
/// `None` means the cell was blank or unreadable, so the fresh value stays.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRow {
    pub clash_id: String,
    pub notes: Option<String>,
    pub usage: Option<Usage>,
    pub date_found: Option<NaiveDate>,
}

/// Columns a tracked sheet must provide
const TRACKED_COLUMNS: [Column; 4] = [
    Column::ClashId,
    Column::Notes,
    Column::Usage,
    Column::DateFound,
];

/// Header lookup over one sheet
struct Sheet {
    index: HashMap<Column, usize>,
    rows: Vec<StringRecord>,
}

impl Sheet {
    fn read(data: &[u8]) -> Result<Self> {
        let data = data.strip_prefix(BOM).unwrap_or(data);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let index = reader
            .headers()?
            .iter()
            .enumerate()
            .filter_map(|(i, name)| Column::from_name(name).map(|c| (c, i)))
            .collect();

        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Sheet { index, rows })
    }

    fn require(&self, columns: &[Column]) -> Result<()> {
        match columns.iter().find(|c| !self.index.contains_key(c)) {
            Some(missing) => Err(Error::MissingColumn(missing.name().to_string())),
            None => Ok(()),
        }
    }

    /// Cell text, `None` when the column is absent or the cell is blank
    fn cell<'r>(&self, row: &'r StringRecord, column: Column) -> Option<&'r str> {
        self.index
            .get(&column)
            .and_then(|&i| row.get(i))
            .filter(|s| !s.trim().is_empty())
    }
}

/// Read tracked annotations from an exported note sheet
pub fn read_tracked(data: &[u8]) -> Result<Vec<TrackedRow>> {
    let sheet = Sheet::read(data)?;
    sheet.require(&TRACKED_COLUMNS)?;

    let mut tracked = Vec::with_capacity(sheet.rows.len());
    for row in &sheet.rows {
        let Some(clash_id) = sheet.cell(row, Column::ClashId) else {
            continue;
        };

        let usage = sheet.cell(row, Column::Usage).and_then(|label| {
            let usage = Usage::from_label(label);
            if usage.is_none() {
                tracing::warn!(clash_id, label, "unknown usage label in tracked sheet");
            }
            usage
        });

        tracked.push(TrackedRow {
            clash_id: clash_id.trim().to_string(),
            notes: sheet.cell(row, Column::Notes).map(|s| s.to_string()),
            usage,
            date_found: sheet.cell(row, Column::DateFound).and_then(parse_date_lenient),
        });
    }

    tracing::info!(rows = tracked.len(), "read tracked sheet");
    Ok(tracked)
}

/// Read a complete exported sheet as working-table records
///
/// Rows without a Clash ID or with an unreadable Date Found are dropped,
/// the same as unparseable headings.
pub fn read_records(data: &[u8]) -> Result<Vec<Record>> {
    let sheet = Sheet::read(data)?;
    sheet.require(&[Column::ClashId, Column::DateFound])?;

    let today = Local::now().date_naive();
    let text = |row: &StringRecord, column| {
        sheet.cell(row, column).unwrap_or_default().to_string()
    };

    let mut records = Vec::with_capacity(sheet.rows.len());
    let mut dropped = 0;
    for row in &sheet.rows {
        let clash_id = text(row, Column::ClashId);
        let date_found = sheet.cell(row, Column::DateFound).and_then(parse_date_lenient);
        let Some(date_found) = date_found.filter(|_| !clash_id.trim().is_empty()) else {
            dropped += 1;
            continue;
        };

        records.push(Record {
            clash_id,
            view_name: text(row, Column::ViewName),
            date_found,
            main_zone: text(row, Column::MainZone),
            sub_zone: text(row, Column::SubZone),
            level: text(row, Column::Level),
            issue_type: text(row, Column::IssuesType),
            status: sheet.cell(row, Column::IssuesStatus).and_then(Status::from_label),
            description: text(row, Column::Description),
            discipline: text(row, Column::Discipline),
            image: sheet.cell(row, Column::Image).map(|s| s.to_string()),
            notes: text(row, Column::Notes),
            usage: sheet
                .cell(row, Column::Usage)
                .and_then(Usage::from_label)
                .unwrap_or_default(),
            assign_to: sheet
                .cell(row, Column::AssignTo)
                .unwrap_or(UNASSIGNED)
                .to_string(),
            due_date: sheet
                .cell(row, Column::DueDate)
                .and_then(parse_date_lenient)
                .unwrap_or(today),
        });
    }

    if dropped > 0 {
        tracing::warn!(dropped, "dropped sheet rows without a clash ID or readable date");
    }
    Ok(records)
}
