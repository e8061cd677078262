/// Headless pipeline: load uploads from disk, filter, write exports
use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Config;
use crate::export::pdf::Decorations;
use crate::export::{write_export, ExportKind};
use crate::state::data::{Column, Status};
use crate::state::filter::ColumnFilter;
use crate::state::session::Session;

/// A status to keep; "none" keeps records without a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChoice(pub Option<Status>);

/// `Column=value` filter from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChoice {
    pub column: Column,
    pub value: String,
}

fn parse_status(s: &str) -> std::result::Result<StatusChoice, String> {
    if s.trim().eq_ignore_ascii_case("none") {
        return Ok(StatusChoice(None));
    }
    Status::from_label(s)
        .map(|status| StatusChoice(Some(status)))
        .ok_or_else(|| {
            let labels: Vec<&str> = Status::ALL.iter().map(|s| s.label()).collect();
            format!("unknown status '{}' (expected one of {}, or none)", s, labels.join(", "))
        })
}

fn parse_filter(s: &str) -> std::result::Result<ColumnChoice, String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Column=value, got '{}'", s))?;
    let column = Column::from_name(name)
        .filter(|c| Column::FILTERABLE.contains(c))
        .ok_or_else(|| format!("'{}' is not a filterable column", name.trim()))?;
    Ok(ColumnChoice {
        column,
        value: value.to_string(),
    })
}

/// Run the report pipeline without opening a window
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// HTML view report exported from the viewpoint tool
    #[arg(long, value_name = "FILE", requires = "xml", required_unless_present = "spreadsheet")]
    html: Option<PathBuf>,

    /// XML viewpoint tree carrying the status folders
    #[arg(long, value_name = "FILE", requires = "html")]
    xml: Option<PathBuf>,

    /// Snapshot images or zip archives of them
    #[arg(long, value_name = "FILE", num_args = 1..)]
    images: Vec<PathBuf>,

    /// Earlier note sheet whose notes, usage and dates are carried over
    #[arg(long, value_name = "CSV")]
    tracked: Option<PathBuf>,

    /// Complete earlier note sheet to use instead of HTML and XML
    #[arg(long, value_name = "CSV", conflicts_with_all = ["html", "xml"])]
    spreadsheet: Option<PathBuf>,

    /// Project name, used in report titles and file names
    #[arg(long, env = "CLASH_REPORT_PROJECT")]
    project: String,

    /// Output directory (defaults to the configured one)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Keep only these statuses (repeatable)
    #[arg(long = "status", value_name = "STATUS", value_parser = parse_status)]
    statuses: Vec<StatusChoice>,

    /// Keep only records whose column equals the value (repeatable)
    #[arg(long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
    filters: Vec<ColumnChoice>,

    /// Write the full note sheet
    #[arg(long)]
    csv: bool,

    /// Write the parsed-columns sheet
    #[arg(long)]
    core_csv: bool,

    /// Write the A4 note report
    #[arg(long)]
    note_pdf: bool,

    /// Write the A3 wide report
    #[arg(long)]
    wide_pdf: bool,
}

impl BatchArgs {
    /// Requested exports; all four when none is named
    fn kinds(&self) -> Vec<ExportKind> {
        let flagged: Vec<ExportKind> = [
            (self.csv, ExportKind::NoteSheet),
            (self.core_csv, ExportKind::CoreSheet),
            (self.note_pdf, ExportKind::NoteReport),
            (self.wide_pdf, ExportKind::WideReport),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect();

        if flagged.is_empty() {
            ExportKind::ALL.to_vec()
        } else {
            flagged
        }
    }
}

fn load_session(args: &BatchArgs, config: &Config) -> Result<Session> {
    let mut session = Session::new(config.rows_per_page);
    session.project_name = args.project.clone();

    if let Some(path) = &args.spreadsheet {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let count = session
            .load_spreadsheet(&data)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        info!(records = count, "loaded spreadsheet");
    } else if let (Some(html), Some(xml)) = (&args.html, &args.xml) {
        let text = fs::read_to_string(html).with_context(|| format!("Failed to read {}", html.display()))?;
        session
            .load_html(&text)
            .with_context(|| format!("Failed to parse {}", html.display()))?;
        for (heading, reason) in session.rejected() {
            warn!(%heading, %reason, "heading skipped");
        }

        let text = fs::read_to_string(xml).with_context(|| format!("Failed to read {}", xml.display()))?;
        session
            .load_xml(&text)
            .with_context(|| format!("Failed to parse {}", xml.display()))?;
    } else {
        bail!("either --spreadsheet or both --html and --xml are required");
    }

    if !args.images.is_empty() {
        let skipped = session.load_images(&args.images);
        info!(images = session.images.len(), skipped = skipped.len(), "loaded images");
    }

    if let Some(path) = &args.tracked {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let count = session
            .load_tracked(&data)
            .with_context(|| format!("Failed to load tracked sheet {}", path.display()))?;
        info!(rows = count, "applied tracked sheet");
    }

    if !args.statuses.is_empty() {
        session.select_statuses(args.statuses.iter().map(|s| s.0));
    }
    for filter in &args.filters {
        session.set_column_filter(filter.column, ColumnFilter::from_choice(&filter.value));
    }

    Ok(session)
}

pub fn run(args: BatchArgs, config: &Config) -> Result<()> {
    let session = load_session(&args, config)?;
    let records = session.export_records()?;
    info!(
        records = records.len(),
        total = session.working().map_or(0, |w| w.len()),
        "records selected for export"
    );

    let decorations = Decorations::new(session.project_name.clone())
        .with_letterhead(config.letterhead_bytes())
        .with_fonts(config.fonts());
    let dir = args.out.clone().unwrap_or_else(|| config.output_dir());

    for kind in args.kinds() {
        let path = write_export(kind, &dir, &records, &session.images, &decorations)
            .with_context(|| format!("Failed to write {}", kind))?;
        println!("{}", path.display());
    }
    Ok(())
}
