/// Date normalization for heading dates and spreadsheet cells
///
/// Two policies:
/// - `normalize_date` is strict and used on parsed headings. A `None`
///   result means the record is dropped.
/// - `normalize_date_lenient` is used on cells read back from spreadsheets
///   and never fails; unknown formats come back unchanged.
use chrono::NaiveDate;

use crate::state::data::DATE_FORMAT;

/// Formats tried, in order, by the lenient normalizer
const LENIENT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Normalize a heading date to `YYYY-MM-DD`
///
/// Accepts the canonical form (returned unchanged) or the compact `YYMMDD`
/// form, read as `20YY-MM-DD`. Anything else, including impossible
/// calendar dates, yields `None`.
pub fn normalize_date(text: &str) -> Option<String> {
    if is_canonical_shape(text) {
        return NaiveDate::parse_from_str(text, DATE_FORMAT)
            .ok()
            .map(|_| text.to_string());
    }

    if text.len() == 6 && text.bytes().all(|b| b.is_ascii_digit()) {
        let expanded = format!("20{}-{}-{}", &text[..2], &text[2..4], &text[4..6]);
        return NaiveDate::parse_from_str(&expanded, DATE_FORMAT)
            .ok()
            .map(|_| expanded);
    }

    None
}

/// Strict normalization straight to a calendar date
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    normalize_date(text.trim()).and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
}

/// Normalize a spreadsheet date cell, falling back to the original text
pub fn normalize_date_lenient(text: &str) -> String {
    let trimmed = text.trim();
    for format in LENIENT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format(DATE_FORMAT).to_string();
        }
    }
    text.to_string()
}

/// Lenient parse of a spreadsheet cell into a calendar date
///
/// Cells the lenient formats cannot read still get a chance as a heading
/// date (`YYMMDD`) before being treated as absent.
pub fn parse_date_lenient(text: &str) -> Option<NaiveDate> {
    parse_date(&normalize_date_lenient(text))
}

/// `YYYY-MM-DD` with digits in every numeric position
fn is_canonical_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
