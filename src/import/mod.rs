/// Upload readers
///
/// Each reader turns one kind of uploaded file into plain data:
/// - HTML view report → issue records (viewpoints.rs)
/// - XML viewpoint tree → view statuses (status.rs)
/// - Loose images and zip archives → image bundle (bundle.rs)
/// - Exported note sheets → tracked rows or records (spreadsheet.rs)
/// - Date strings → canonical dates (date.rs)

pub mod bundle;
pub mod date;
pub mod spreadsheet;
pub mod status;
pub mod viewpoints;
