/// Review window
///
/// Sidebar on the left (project, uploads, filters, exports), the current
/// page of record cards on the right. Every handler goes through the
/// [`Session`]; widgets only hold editor state for the visible page.
mod card;

use iced::widget::{
    button, checkbox, column, container, horizontal_rule, pick_list, row, scrollable, text, text_editor,
    text_input, Column,
};
use iced::{Element, Length, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::pdf::Decorations;
use crate::export::ExportKind;
use crate::import::bundle::{ImageBundle, ARCHIVE_EXTENSIONS, IMAGE_EXTENSIONS};
use crate::import::date::parse_date_lenient;
use crate::state::data::{status_label, Column as DataColumn, Record, Status, Usage};
use crate::state::edit::{Edit, EditKey};
use crate::state::filter::ColumnFilter;
use crate::state::session::Session;

/// Checkbox label for records without a status
const NO_STATUS: &str = "(no status)";

pub fn run(config: Config) -> iced::Result {
    iced::application("Clash Report", ReviewApp::update, ReviewApp::view)
        .theme(ReviewApp::theme)
        .centered()
        .run_with(move || ReviewApp::new(config))
}

/// Per-card editor state for the visible page
struct CardEditor {
    notes: text_editor::Content,
    due_date: String,
}

impl CardEditor {
    fn new(record: &Record) -> Self {
        Self {
            notes: text_editor::Content::with_text(&record.notes),
            due_date: record.due_date.format(crate::state::data::DATE_FORMAT).to_string(),
        }
    }
}

struct ReviewApp {
    config: Config,
    session: Session,
    editors: HashMap<EditKey, CardEditor>,
    /// Status line shown under the sidebar
    status: String,
    exporting: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    ProjectNameChanged(String),
    PickHtml,
    PickXml,
    PickImages,
    PickTracked,
    PickSpreadsheet,
    StatusToggled(Option<Status>),
    ColumnFilterChanged(DataColumn, String),
    PreviousPage,
    NextPage,
    NotesEdited(EditKey, text_editor::Action),
    UsageSelected(EditKey, Usage),
    DueDateChanged(EditKey, String),
    DueDateSubmitted(EditKey),
    Export(ExportKind),
    ExportFinished(std::result::Result<PathBuf, String>),
}

fn pick_file(title: &str, filter: &str, extensions: &[&str]) -> Option<PathBuf> {
    FileDialog::new()
        .set_title(title)
        .add_filter(filter, extensions)
        .pick_file()
}

fn read_text(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

impl ReviewApp {
    fn new(config: Config) -> (Self, Task<Message>) {
        let session = Session::new(config.rows_per_page);
        (
            ReviewApp {
                config,
                session,
                editors: HashMap::new(),
                status: "Upload the HTML and XML exports, or an earlier note sheet.".to_string(),
                exporting: false,
            },
            Task::none(),
        )
    }

    /// Rebuild editor state after the visible page changed
    fn sync_editors(&mut self) {
        self.editors = self
            .session
            .page_rows()
            .into_iter()
            .map(|(key, record)| (key, CardEditor::new(record)))
            .collect();
    }

    /// Match editors to the visible page after an edit
    ///
    /// An edit can move records in or out of the filtered view. Cards that
    /// stay on the page keep their editor state.
    fn refresh_editors(&mut self) {
        let rows = self.session.page_rows();
        if rows.len() == self.editors.len() && rows.iter().all(|(key, _)| self.editors.contains_key(key)) {
            return;
        }
        let mut previous = std::mem::take(&mut self.editors);
        self.editors = rows
            .into_iter()
            .map(|(key, record)| {
                let editor = previous.remove(&key).unwrap_or_else(|| CardEditor::new(record));
                (key, editor)
            })
            .collect();
    }

    /// Show the outcome of an upload and refresh the page
    fn report(&mut self, outcome: Result<String>) {
        self.status = match outcome {
            Ok(message) => {
                tracing::info!("{}", message);
                message
            }
            Err(e) => {
                tracing::error!(error = %e, "upload failed");
                format!("Error: {}", e)
            }
        };
        self.sync_editors();
    }

    fn apply_edit(&mut self, key: &EditKey, edit: Edit) {
        match self.session.apply_edit(key, edit) {
            Ok(()) => self.refresh_editors(),
            Err(e) => {
                tracing::warn!(error = %e, "edit rejected");
                self.status = format!("Error: {}", e);
                self.sync_editors();
            }
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ProjectNameChanged(name) => {
                self.session.project_name = name;
            }
            Message::PickHtml => {
                if let Some(path) = pick_file("Select HTML view report", "HTML", &["html", "htm"]) {
                    let outcome = read_text(&path).and_then(|html| self.session.load_html(&html)).map(|count| {
                        let rejected = self.session.rejected().len();
                        format!("Parsed {} records ({} headings did not match the issue format)", count, rejected)
                    });
                    self.report(outcome);
                }
            }
            Message::PickXml => {
                if let Some(path) = pick_file("Select XML viewpoint export", "XML", &["xml"]) {
                    let outcome = read_text(&path)
                        .and_then(|xml| self.session.load_xml(&xml))
                        .map(|count| format!("Read {} viewpoint statuses", count));
                    self.report(outcome);
                }
            }
            Message::PickImages => {
                let extensions: Vec<&str> = IMAGE_EXTENSIONS.iter().chain(ARCHIVE_EXTENSIONS.iter()).copied().collect();
                if let Some(paths) = FileDialog::new()
                    .set_title("Select snapshot images or a zip archive")
                    .add_filter("Images and archives", &extensions)
                    .pick_files()
                {
                    let skipped = self.session.load_images(&paths);
                    let mut message = format!("{} images available", self.session.images.len());
                    if !skipped.is_empty() {
                        let names: Vec<&str> = skipped.iter().map(|(name, _)| name.as_str()).collect();
                        message.push_str(&format!("; skipped {}", names.join(", ")));
                    }
                    self.report(Ok(message));
                }
            }
            Message::PickTracked => {
                if let Some(path) = pick_file("Select tracked note sheet", "CSV", &["csv"]) {
                    let outcome = fs::read(&path)
                        .map_err(Error::from)
                        .and_then(|data| self.session.load_tracked(&data))
                        .map(|count| format!("Applied {} tracked rows", count));
                    self.report(outcome);
                }
            }
            Message::PickSpreadsheet => {
                if let Some(path) = pick_file("Select earlier note sheet", "CSV", &["csv"]) {
                    let outcome = fs::read(&path)
                        .map_err(Error::from)
                        .and_then(|data| self.session.load_spreadsheet(&data))
                        .map(|count| format!("Loaded {} records from sheet", count));
                    self.report(outcome);
                }
            }
            Message::StatusToggled(status) => {
                self.session.toggle_status(status);
                self.sync_editors();
            }
            Message::ColumnFilterChanged(column, choice) => {
                self.session.set_column_filter(column, ColumnFilter::from_choice(&choice));
                self.sync_editors();
            }
            Message::PreviousPage => {
                let page = self.session.pagination().page;
                self.session.set_page(page.saturating_sub(1));
                self.sync_editors();
            }
            Message::NextPage => {
                let page = self.session.pagination().page;
                self.session.set_page(page + 1);
                self.sync_editors();
            }
            Message::NotesEdited(key, action) => {
                let is_edit = action.is_edit();
                let Some(editor) = self.editors.get_mut(&key) else {
                    return Task::none();
                };
                editor.notes.perform(action);
                if is_edit {
                    let notes = editor.notes.text().trim_end_matches('\n').to_string();
                    self.apply_edit(&key, Edit::Notes(notes));
                }
            }
            Message::UsageSelected(key, usage) => {
                self.apply_edit(&key, Edit::Usage(usage));
            }
            Message::DueDateChanged(key, value) => {
                // Stored as soon as it reads as a date so paging away keeps it
                let date = parse_date_lenient(&value);
                if let Some(editor) = self.editors.get_mut(&key) {
                    editor.due_date = value;
                }
                if let Some(date) = date {
                    self.apply_edit(&key, Edit::DueDate(date));
                }
            }
            Message::DueDateSubmitted(key) => {
                let value = self.editors.get(&key).map(|e| e.due_date.clone()).unwrap_or_default();
                match parse_date_lenient(&value) {
                    Some(date) => self.apply_edit(&key, Edit::DueDate(date)),
                    None => self.status = format!("'{}' is not a date (use YYYY-MM-DD)", value),
                }
            }
            Message::Export(kind) => return self.start_export(kind),
            Message::ExportFinished(result) => {
                self.exporting = false;
                self.status = match result {
                    Ok(path) => format!("Saved {}", path.display()),
                    Err(e) => {
                        tracing::error!(error = %e, "export failed");
                        format!("Export failed: {}", e)
                    }
                };
            }
        }
        Task::none()
    }

    fn start_export(&mut self, kind: ExportKind) -> Task<Message> {
        let records = match self.session.export_records() {
            Ok(records) => records,
            Err(e) => {
                self.status = format!("Error: {}", e);
                return Task::none();
            }
        };

        let project = self.session.project_name.trim().to_string();
        let date = chrono::Local::now().date_naive();
        let Some(path) = FileDialog::new()
            .set_title(format!("Save {}", kind))
            .set_directory(self.config.output_dir())
            .set_file_name(kind.file_name(&project, date))
            .save_file()
        else {
            return Task::none();
        };

        let decorations = Decorations::new(project)
            .with_letterhead(self.config.letterhead_bytes())
            .with_fonts(self.config.fonts());
        let images = self.session.images.clone();
        self.exporting = true;
        self.status = format!("Writing {}...", kind);

        Task::perform(
            export_async(kind, path, records, images, decorations),
            Message::ExportFinished,
        )
    }

    fn view(&self) -> Element<Message> {
        row![self.sidebar(), self.records_view()]
            .height(Length::Fill)
            .into()
    }

    fn sidebar(&self) -> Element<Message> {
        let has_table = self.session.working().is_some();

        let uploads = column![
            text("Uploads").size(18),
            button("HTML view report").on_press(Message::PickHtml),
            button("XML viewpoints").on_press(Message::PickXml),
            button("Images / zip").on_press(Message::PickImages),
            button("Tracked note sheet").on_press(Message::PickTracked),
            button("Earlier note sheet").on_press(Message::PickSpreadsheet),
        ]
        .spacing(6);

        let statuses = self.session.status_options().into_iter().fold(
            column![text("Issues Status").size(18)].spacing(4),
            |col, status| {
                let label = if status.is_some() { status_label(status) } else { NO_STATUS };
                col.push(
                    checkbox(label, self.session.filters().status_selected(status))
                        .on_toggle(move |_| Message::StatusToggled(status)),
                )
            },
        );

        let filters = DataColumn::FILTERABLE.into_iter().fold(
            column![text("Filters").size(18)].spacing(4),
            |col, column| {
                let selected = self.session.filters().column(column).to_string();
                col.push(text(column.name()).size(12)).push(
                    pick_list(self.session.column_choices(column), Some(selected), move |choice| {
                        Message::ColumnFilterChanged(column, choice)
                    })
                    .width(Length::Fill),
                )
            },
        );

        let exports = ExportKind::ALL.into_iter().fold(
            column![text("Export").size(18)].spacing(6),
            |col, kind| {
                col.push(button(text(kind.label())).on_press_maybe(
                    (has_table && !self.exporting).then_some(Message::Export(kind)),
                ))
            },
        );

        let content = column![
            text("Project").size(18),
            text_input("Project name", &self.session.project_name).on_input(Message::ProjectNameChanged),
            horizontal_rule(1),
            uploads,
            horizontal_rule(1),
            statuses,
            filters,
            horizontal_rule(1),
            exports,
            horizontal_rule(1),
            text(&self.status).size(13),
        ]
        .spacing(12)
        .padding(16);

        container(scrollable(content)).width(300).height(Length::Fill).into()
    }

    fn records_view(&self) -> Element<Message> {
        let pagination = self.session.pagination();
        let rows = self.session.page_rows();

        let cards: Column<Message> = rows.iter().fold(Column::new().spacing(12), |col, (key, record)| {
            col.push(self.card(key, record))
        });

        let pager = row![
            button("Previous").on_press_maybe((pagination.page > 1).then_some(Message::PreviousPage)),
            text(format!(
                "Page {} of {} ({} records)",
                pagination.page,
                pagination.total_pages.max(1),
                self.session.visible().len()
            )),
            button("Next").on_press_maybe((pagination.page < pagination.total_pages).then_some(Message::NextPage)),
        ]
        .spacing(12);

        column![scrollable(cards.padding(16)).height(Length::Fill), pager]
            .spacing(8)
            .padding(8)
            .width(Length::Fill)
            .into()
    }

    fn card<'a>(&'a self, key: &EditKey, record: &'a Record) -> Element<'a, Message> {
        match self.editors.get(key) {
            Some(editor) => card::view(key, record, &self.session.images, &editor.notes, &editor.due_date),
            None => text(format!("{} (refreshing)", record.clash_id)).into(),
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Render and write an export on a blocking worker
async fn export_async(
    kind: ExportKind,
    path: PathBuf,
    records: Vec<Record>,
    images: ImageBundle,
    decorations: Decorations,
) -> std::result::Result<PathBuf, String> {
    tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        let bytes = kind.render(&records, &images, &decorations)?;
        fs::write(&path, &bytes)?;
        tracing::info!(path = %path.display(), records = records.len(), kind = %kind, "export written");
        Ok(path)
    })
    .await
    .map_err(|e| e.to_string())?
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::pdf::document::test_support::png_bytes;
    use crate::export::spreadsheet::note_sheet;
    use crate::state::data::fixtures::record;
    use chrono::NaiveDate;

    /// A review window holding `count` records, first page shown
    fn app_with(count: usize) -> ReviewApp {
        let records: Vec<Record> = (0..count).map(|i| record(&format!("C{:03}", i + 1), None)).collect();
        let (mut app, _) = ReviewApp::new(Config::default());
        let count = app.session.load_spreadsheet(&note_sheet(&records).unwrap()).unwrap();
        app.report(Ok(format!("Loaded {} records from sheet", count)));
        app
    }

    fn key(app: &ReviewApp, clash_id: &str) -> EditKey {
        app.session
            .page_rows()
            .into_iter()
            .map(|(key, _)| key)
            .find(|key| key.clash_id == clash_id)
            .unwrap()
    }

    fn record_of<'a>(app: &'a ReviewApp, key: &EditKey) -> &'a Record {
        app.session.working().unwrap().get(key.position).unwrap()
    }

    #[test]
    fn test_typed_due_date_survives_paging() {
        let mut app = app_with(15);
        let first = key(&app, "C001");

        let _ = app.update(Message::DueDateChanged(first.clone(), "2030-12-31".to_string()));
        let _ = app.update(Message::NextPage);
        assert_eq!(app.session.pagination().page, 2);
        let _ = app.update(Message::PreviousPage);

        let expected = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();
        assert_eq!(record_of(&app, &first).due_date, expected);
        assert_eq!(app.editors[&first].due_date, "2030-12-31");
    }

    #[test]
    fn test_partial_due_date_is_not_stored() {
        let mut app = app_with(3);
        let first = key(&app, "C001");
        let before = record_of(&app, &first).due_date;

        let _ = app.update(Message::DueDateChanged(first.clone(), "2030-1".to_string()));
        assert_eq!(record_of(&app, &first).due_date, before);
        assert_eq!(app.editors[&first].due_date, "2030-1");

        let _ = app.update(Message::DueDateSubmitted(first.clone()));
        assert!(app.status.contains("is not a date"));
    }

    #[test]
    fn test_every_visible_card_has_an_editor_after_usage_change() {
        let mut app = app_with(15);
        let _ = app.update(Message::ColumnFilterChanged(DataColumn::Usage, "Tracking".to_string()));
        let first = key(&app, "C001");

        let _ = app.update(Message::UsageSelected(first.clone(), Usage::HighPriority));

        let rows = app.session.page_rows();
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().any(|(key, _)| key.clash_id == "C011"));
        assert!(rows.iter().all(|(key, _)| app.editors.contains_key(key)));
        assert!(!app.editors.contains_key(&first));
        assert_eq!(app.editors.len(), rows.len());
    }

    #[test]
    fn test_notes_editor_kept_when_page_is_unchanged() {
        let mut app = app_with(3);
        let first = key(&app, "C001");

        let _ = app.update(Message::NotesEdited(
            first.clone(),
            text_editor::Action::Edit(text_editor::Edit::Insert('x')),
        ));
        assert_eq!(record_of(&app, &first).notes, "x");
        assert_eq!(app.editors.len(), 3);
    }

    #[tokio::test]
    async fn test_export_async_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        let mut images = ImageBundle::new();
        images.insert("c001.jpg", png_bytes(32, 32));

        let written = export_async(
            ExportKind::NoteReport,
            path.clone(),
            vec![record("C001", None)],
            images,
            Decorations::new("Tower B"),
        )
        .await
        .unwrap();
        assert_eq!(written, path);
        assert!(fs::read(&path).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_async_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sheet.csv");
        let result = export_async(
            ExportKind::NoteSheet,
            path,
            Vec::new(),
            ImageBundle::new(),
            Decorations::new("Tower B"),
        )
        .await;
        assert!(result.is_err());
    }
}
