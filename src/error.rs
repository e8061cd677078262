/// Error types for clash-report
///
/// Upload and export failures are terminal for the action that triggered
/// them but never for the session. Rejected headings and dropped dates are
/// reported as data, not as errors.
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// XML viewpoint document could not be parsed
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Image archive could not be opened or extracted
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Embedded image could not be decoded or re-encoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Report font could not be parsed or has no Unicode mapping
    #[error("Font error: {0}")]
    Font(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upload has the wrong structure (missing sections, bad markup)
    #[error("Malformed upload: {0}")]
    Malformed(String),

    /// Spreadsheet lacks a column the import needs
    #[error("Spreadsheet is missing required column '{0}'")]
    MissingColumn(String),

    /// Uploaded file type is not an image or a supported archive
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    /// Edit targets a row that no longer holds the expected record
    #[error("Stale edit for {clash_id} at row {position}")]
    StaleEdit { clash_id: String, position: usize },

    /// An operation needs a working table that has not been built yet
    #[error("No working table loaded")]
    NoWorkingTable,
}
