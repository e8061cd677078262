/// Spreadsheet export
///
/// UTF-8 CSV with a byte order mark, so spreadsheet tools pick the right
/// encoding. Multi-line notes are quoted and kept intact.
use crate::error::{Error, Result};
use crate::import::spreadsheet::BOM;
use crate::state::data::{Column, Record};

/// Write `records` with the given columns, header row first
pub fn write_csv(records: &[Record], columns: &[Column]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(BOM.to_vec());
    writer.write_record(columns.iter().map(|c| c.name()))?;
    for record in records {
        writer.write_record(columns.iter().map(|&c| record.value(c)))?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Full note sheet: every column, readable back as tracked data
pub fn note_sheet(records: &[Record]) -> Result<Vec<u8>> {
    write_csv(records, &Column::ALL)
}

/// Parsed columns only, without the reviewer annotations
pub fn core_sheet(records: &[Record]) -> Result<Vec<u8>> {
    write_csv(records, &Column::CORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::spreadsheet::{read_records, read_tracked};
    use crate::state::data::fixtures::record;
    use crate::state::data::{Status, Usage};

    fn records() -> Vec<Record> {
        let mut records = vec![record("C001", Some(Status::Unresolved)), record("C002", None)];
        records[0].notes = "line one\nline two, with comma".to_string();
        records[0].usage = Usage::HighPriority;
        records[1].image = None;
        records
    }

    #[test]
    fn test_note_sheet_header_and_bom() {
        let data = note_sheet(&records()).unwrap();
        assert!(data.starts_with(BOM));
        let text = String::from_utf8(data[BOM.len()..].to_vec()).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "Clash ID,View Name,Date Found,Main Zone,Sub Zone,Level,Issues Type,\
             Issues Status,Description,Discipline,Image,Notes,Usage,Assign To,Due Date"
        );
        assert!(text.contains("\"line one\nline two, with comma\""));
    }

    #[test]
    fn test_note_sheet_reads_back() {
        let original = records();
        let data = note_sheet(&original).unwrap();

        assert_eq!(read_records(&data).unwrap(), original);

        let tracked = read_tracked(&data).unwrap();
        assert_eq!(tracked[0].notes.as_deref(), Some("line one\nline two, with comma"));
        assert_eq!(tracked[0].usage, Some(Usage::HighPriority));
        assert_eq!(tracked[1].notes, None);
    }

    #[test]
    fn test_core_sheet_has_no_annotations() {
        let data = core_sheet(&records()).unwrap();
        let mut reader = csv::Reader::from_reader(&data[BOM.len()..]);
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 11);
        assert_eq!(headers.get(10), Some("Image"));
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn test_empty_sheet_is_header_only() {
        let data = note_sheet(&[]).unwrap();
        let mut reader = csv::Reader::from_reader(&data[BOM.len()..]);
        assert_eq!(reader.records().count(), 0);
    }
}
