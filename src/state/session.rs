/// Review session
///
/// Holds everything one review needs: the project name, the parsed
/// uploads, the image bundle, the working table, the filter selections
/// and the page cursor. Both the desktop window and the batch command
/// drive the pipeline through this one object.
use std::path::Path;

use super::data::{Column, Record, Status};
use super::edit::{Edit, EditKey, WorkingTable};
use super::filter::{self, ColumnFilter, Filters};
use super::merge::{join_statuses, merge_tracked};
use super::page::{calculate_pagination, Pagination, DEFAULT_ROWS_PER_PAGE};
use crate::error::{Error, Result};
use crate::import::bundle::ImageBundle;
use crate::import::spreadsheet::{self, TrackedRow};
use crate::import::status::{self, ViewStatus};
use crate::import::viewpoints::{self, Rejection, ViewList};

#[derive(Debug, Clone)]
pub struct Session {
    pub project_name: String,
    pub images: ImageBundle,
    view_list: Option<ViewList>,
    statuses: Option<Vec<ViewStatus>>,
    tracked: Vec<TrackedRow>,
    working: Option<WorkingTable>,
    filters: Filters,
    page: usize,
    rows_per_page: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS_PER_PAGE)
    }
}

impl Session {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            project_name: String::new(),
            images: ImageBundle::new(),
            view_list: None,
            statuses: None,
            tracked: Vec::new(),
            working: None,
            filters: Filters::new(),
            page: 1,
            rows_per_page: rows_per_page.max(1),
        }
    }

    // ========== Uploads ==========

    /// Parse an HTML view report and rebuild the table if the XML is loaded
    ///
    /// Returns the number of records parsed; rejected headings are kept
    /// for [`Session::rejected`].
    pub fn load_html(&mut self, html: &str) -> Result<usize> {
        let list = viewpoints::parse_view_list(html)?;
        if !list.rejected.is_empty() {
            tracing::warn!(count = list.rejected.len(), "headings did not match the issue schema");
        }
        let count = list.records.len();
        self.view_list = Some(list);
        self.rebuild();
        Ok(count)
    }

    /// Parse the XML viewpoint tree and rebuild the table if the HTML is loaded
    pub fn load_xml(&mut self, xml: &str) -> Result<usize> {
        let statuses = status::parse_view_statuses(xml)?;
        let count = statuses.len();
        self.statuses = Some(statuses);
        self.rebuild();
        Ok(count)
    }

    /// Add uploaded images and archives to the bundle
    ///
    /// Returns the files that were skipped and why.
    pub fn load_images<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<(String, Error)> {
        self.images.load_files(paths)
    }

    /// Merge annotations from an earlier note sheet into the table
    ///
    /// The rows are kept, so they are re-applied whenever the HTML or XML is
    /// reloaded.
    pub fn load_tracked(&mut self, data: &[u8]) -> Result<usize> {
        let tracked = spreadsheet::read_tracked(data)?;
        let count = tracked.len();
        self.tracked = tracked;

        if self.view_list.is_some() && self.statuses.is_some() {
            self.rebuild();
        } else if let Some(working) = self.working.as_mut() {
            let merged = merge_tracked(working.records(), &self.tracked);
            working.replace(merged);
        }
        Ok(count)
    }

    /// Seed the working table from a complete exported sheet
    ///
    /// Replaces any HTML/XML uploads, so a later tracked sheet merges onto
    /// these rows instead.
    pub fn load_spreadsheet(&mut self, data: &[u8]) -> Result<usize> {
        let records = spreadsheet::read_records(data)?;
        let count = records.len();
        self.view_list = None;
        self.statuses = None;
        self.set_working(records);
        tracing::info!(records = count, "working table seeded from spreadsheet");
        Ok(count)
    }

    /// Join the parsed uploads into a fresh working table
    fn rebuild(&mut self) {
        let (Some(list), Some(statuses)) = (&self.view_list, &self.statuses) else {
            return;
        };

        let mut records = join_statuses(&list.records, statuses);
        if !self.tracked.is_empty() {
            records = merge_tracked(&records, &self.tracked);
        }
        tracing::info!(records = records.len(), "working table rebuilt");
        self.set_working(records);
    }

    fn set_working(&mut self, records: Vec<Record>) {
        self.working = Some(WorkingTable::new(records));
        self.filters = Filters::new();
        self.page = 1;
    }

    // ========== Table access ==========

    pub fn working(&self) -> Option<&WorkingTable> {
        self.working.as_ref()
    }

    fn records(&self) -> &[Record] {
        self.working.as_ref().map(|w| w.records()).unwrap_or_default()
    }

    /// Headings rejected by the last HTML upload
    pub fn rejected(&self) -> &[(String, Rejection)] {
        self.view_list
            .as_ref()
            .map(|l| l.rejected.as_slice())
            .unwrap_or_default()
    }

    pub fn apply_edit(&mut self, key: &EditKey, edit: Edit) -> Result<()> {
        let working = self.working.as_mut().ok_or(Error::NoWorkingTable)?;
        working.apply(key, edit)
    }

    // ========== Filters ==========

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn set_column_filter(&mut self, column: Column, value: ColumnFilter) {
        self.filters.set_column(column, value);
        self.page = 1;
    }

    pub fn toggle_status(&mut self, status: Option<Status>) {
        let available = self.status_options();
        self.filters.toggle_status(status, &available);
        self.page = 1;
    }

    pub fn select_statuses(&mut self, selected: impl IntoIterator<Item = Option<Status>>) {
        self.filters.select_statuses(selected);
        self.page = 1;
    }

    pub fn status_options(&self) -> Vec<Option<Status>> {
        filter::status_options(self.records())
    }

    /// Picker choices for a column: "All" then every distinct value
    pub fn column_choices(&self, column: Column) -> Vec<String> {
        std::iter::once(filter::ALL.to_string())
            .chain(filter::column_options(self.records(), column))
            .collect()
    }

    /// Working-table positions passing the current filters
    pub fn visible(&self) -> Vec<usize> {
        self.filters.apply(self.records())
    }

    // ========== Paging ==========

    pub fn pagination(&self) -> Pagination {
        calculate_pagination(self.visible().len(), self.page, self.rows_per_page)
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = calculate_pagination(self.visible().len(), page, self.rows_per_page).page;
    }

    /// The current page as (edit key, record) pairs
    pub fn page_rows(&self) -> Vec<(EditKey, &Record)> {
        let visible = self.visible();
        let range = self.pagination().range(visible.len());
        let records = self.records();
        visible[range]
            .iter()
            .map(|&i| (EditKey::new(records[i].clash_id.clone(), i), &records[i]))
            .collect()
    }

    // ========== Export ==========

    /// Filtered records, in table order, for the exporters
    pub fn export_records(&self) -> Result<Vec<Record>> {
        let working = self.working.as_ref().ok_or(Error::NoWorkingTable)?;
        Ok(working.select(&self.visible()))
    }
}
