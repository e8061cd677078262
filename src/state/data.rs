/// Shared data structures for the review session
///
/// These structs represent the data model that flows between
/// the importers, the merge pipeline, the UI and the exporters.
use chrono::NaiveDate;
use std::fmt;

/// Resolution status taken from the viewpoint folder a view was filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Resolved,
    Unresolved,
    ForTracking,
    New,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Resolved,
        Status::Unresolved,
        Status::ForTracking,
        Status::New,
    ];

    /// Canonical label, as written to spreadsheets and reports
    pub fn label(&self) -> &'static str {
        match self {
            Status::Resolved => "Resolved",
            Status::Unresolved => "Unresolved",
            Status::ForTracking => "For Tracking",
            Status::New => "New",
        }
    }

    /// Parse a canonical label back into a status
    pub fn from_label(label: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.label() == label.trim())
    }

    /// Map a viewpoint folder name to its status
    ///
    /// Only the four numbered status folders qualify; views filed anywhere
    /// else carry no status.
    pub fn from_folder(folder: &str) -> Option<Status> {
        match folder {
            "01_Resolved" => Some(Status::Resolved),
            "02_Unresolved" => Some(Status::Unresolved),
            "03_For Tracking" => Some(Status::ForTracking),
            "04_New Issues" => Some(Status::New),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display label for an optional status (empty when no status matched)
pub fn status_label(status: Option<Status>) -> &'static str {
    status.map(|s| s.label()).unwrap_or("")
}

/// Triage label assigned by the reviewer, independent of resolution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Usage {
    #[default]
    Tracking,
    HighPriority,
    NotUsed,
    ForReporting,
}

impl Usage {
    pub const ALL: [Usage; 4] = [
        Usage::Tracking,
        Usage::HighPriority,
        Usage::NotUsed,
        Usage::ForReporting,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Usage::Tracking => "Tracking",
            Usage::HighPriority => "High Priority",
            Usage::NotUsed => "Not Used",
            Usage::ForReporting => "For Reporting",
        }
    }

    pub fn from_label(label: &str) -> Option<Usage> {
        Usage::ALL.into_iter().find(|u| u.label() == label.trim())
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Default assignee for records nobody has picked up
pub const UNASSIGNED: &str = "None";

/// Canonical date representation used everywhere a date is shown or written
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Represents a single clash issue in the working table
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// First heading field (e.g., "C001")
    pub clash_id: String,
    /// Full heading text; the join key against viewpoint statuses
    pub view_name: String,
    pub date_found: NaiveDate,
    pub main_zone: String,
    pub sub_zone: String,
    pub level: String,
    pub issue_type: String,
    /// None when no status folder listed this view
    pub status: Option<Status>,
    pub description: String,
    pub discipline: String,
    /// Image filename only (e.g., "c001.jpg"); None when no image followed the heading
    pub image: Option<String>,
    pub notes: String,
    pub usage: Usage,
    pub assign_to: String,
    pub due_date: NaiveDate,
}

impl Record {
    /// Display value for a column, as used by filters and exports
    pub fn value(&self, column: Column) -> String {
        match column {
            Column::ClashId => self.clash_id.clone(),
            Column::ViewName => self.view_name.clone(),
            Column::DateFound => self.date_found.format(DATE_FORMAT).to_string(),
            Column::MainZone => self.main_zone.clone(),
            Column::SubZone => self.sub_zone.clone(),
            Column::Level => self.level.clone(),
            Column::IssuesType => self.issue_type.clone(),
            Column::IssuesStatus => status_label(self.status).to_string(),
            Column::Description => self.description.clone(),
            Column::Discipline => self.discipline.clone(),
            Column::Image => self.image.clone().unwrap_or_default(),
            Column::Notes => self.notes.clone(),
            Column::Usage => self.usage.label().to_string(),
            Column::AssignTo => self.assign_to.clone(),
            Column::DueDate => self.due_date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// The column contract shared by spreadsheets, filters and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ClashId,
    ViewName,
    DateFound,
    MainZone,
    SubZone,
    Level,
    IssuesType,
    IssuesStatus,
    Description,
    Discipline,
    Image,
    Notes,
    Usage,
    AssignTo,
    DueDate,
}

impl Column {
    /// Every column, in spreadsheet order
    pub const ALL: [Column; 15] = [
        Column::ClashId,
        Column::ViewName,
        Column::DateFound,
        Column::MainZone,
        Column::SubZone,
        Column::Level,
        Column::IssuesType,
        Column::IssuesStatus,
        Column::Description,
        Column::Discipline,
        Column::Image,
        Column::Notes,
        Column::Usage,
        Column::AssignTo,
        Column::DueDate,
    ];

    /// The eleven columns produced by parsing, before any annotation
    pub const CORE: [Column; 11] = [
        Column::ClashId,
        Column::ViewName,
        Column::DateFound,
        Column::MainZone,
        Column::SubZone,
        Column::Level,
        Column::IssuesType,
        Column::IssuesStatus,
        Column::Description,
        Column::Discipline,
        Column::Image,
    ];

    /// Columns offered in the filter sidebar
    pub const FILTERABLE: [Column; 10] = [
        Column::ClashId,
        Column::ViewName,
        Column::MainZone,
        Column::SubZone,
        Column::Level,
        Column::IssuesType,
        Column::IssuesStatus,
        Column::Discipline,
        Column::AssignTo,
        Column::Usage,
    ];

    /// Header text
    pub fn name(&self) -> &'static str {
        match self {
            Column::ClashId => "Clash ID",
            Column::ViewName => "View Name",
            Column::DateFound => "Date Found",
            Column::MainZone => "Main Zone",
            Column::SubZone => "Sub Zone",
            Column::Level => "Level",
            Column::IssuesType => "Issues Type",
            Column::IssuesStatus => "Issues Status",
            Column::Description => "Description",
            Column::Discipline => "Discipline",
            Column::Image => "Image",
            Column::Notes => "Notes",
            Column::Usage => "Usage",
            Column::AssignTo => "Assign To",
            Column::DueDate => "Due Date",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.name() == name.trim())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
