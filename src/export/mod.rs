/// Export renderers
///
/// Four outputs over the filtered working table:
/// - note sheet: every column as CSV
/// - core sheet: the parsed columns as CSV
/// - note report: A4 portrait PDF with snapshots, details and notes
/// - wide report: A3 landscape PDF with the parsed columns
pub mod pdf;
pub mod spreadsheet;

use chrono::NaiveDate;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::import::bundle::ImageBundle;
use crate::state::data::Record;
use pdf::Decorations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    NoteSheet,
    CoreSheet,
    NoteReport,
    WideReport,
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::NoteSheet,
        ExportKind::CoreSheet,
        ExportKind::NoteReport,
        ExportKind::WideReport,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExportKind::NoteSheet => "Note CSV",
            ExportKind::CoreSheet => "Navisworks CSV",
            ExportKind::NoteReport => "Note Report PDF",
            ExportKind::WideReport => "Wide Report PDF",
        }
    }

    fn stem(&self) -> &'static str {
        match self {
            ExportKind::NoteSheet => "CSV-Note",
            ExportKind::CoreSheet => "CSV-Naviswork",
            ExportKind::NoteReport => "PDF-ClashNoteReport",
            ExportKind::WideReport => "PDF-Wide-ClashReport",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::NoteSheet | ExportKind::CoreSheet => "csv",
            ExportKind::NoteReport | ExportKind::WideReport => "pdf",
        }
    }

    /// `{YYYYMMDD}_{stem}_{project}.{ext}`
    pub fn file_name(&self, project: &str, date: NaiveDate) -> String {
        format!(
            "{}_{}_{}.{}",
            date.format("%Y%m%d"),
            self.stem(),
            sanitize(project),
            self.extension()
        )
    }

    /// Produce the file contents
    pub fn render(&self, records: &[Record], images: &ImageBundle, decorations: &Decorations) -> Result<Vec<u8>> {
        match self {
            ExportKind::NoteSheet => spreadsheet::note_sheet(records),
            ExportKind::CoreSheet => spreadsheet::core_sheet(records),
            ExportKind::NoteReport => Ok(pdf::note_report::render(records, images, decorations)),
            ExportKind::WideReport => Ok(pdf::wide_report::render(records, images, decorations)),
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Keep project names from escaping the output directory
fn sanitize(project: &str) -> String {
    project
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect()
}

/// Render and write one export into `dir`, returning the file path
pub fn write_export(
    kind: ExportKind,
    dir: &Path,
    records: &[Record],
    images: &ImageBundle,
    decorations: &Decorations,
) -> Result<PathBuf> {
    let bytes = kind.render(records, images, decorations)?;
    let date = decorations.generated_at.date();
    let path = dir.join(kind.file_name(&decorations.title, date));

    fs::create_dir_all(dir)?;
    fs::write(&path, &bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), kind = %kind, "export written");
    Ok(path)
}
