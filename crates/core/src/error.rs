//! Error types for the group-former system.
//!
//! Library operations return structured errors rather than panicking.
//! Advisory problems (malformed lines, duplicate ids) are not errors; they
//! are reported alongside the accepted roster by [`crate::normalize`].

use thiserror::Error;

/// Top-level error type for all operations in the system.
///
/// Each variant corresponds to a specific failure domain:
/// - Validation: a partition request that must be rejected before running
/// - Input: a roster that could not be read at all
/// - CSV: column mapping or CSV parsing problems
/// - Store: persisted documents that could not be read or written
/// - Export: rendering a group set into an output format
#[derive(Debug, Error)]
pub enum Error {
    /// Partition request violates a precondition
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Roster input could not be read
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// CSV import error (e.g., unknown column)
    #[error("csv error: {0}")]
    Csv(#[from] CsvError),

    /// Persistence error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Export rendering error
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Preconditions checked before the partitioner runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Groups must hold at least two students
    #[error("group size must be at least 2, got {group_size}")]
    GroupSizeTooSmall { group_size: usize },

    /// Fewer students than a single group needs
    #[error("at least {group_size} students are needed to form groups, got {students}")]
    NotEnoughStudents { group_size: usize, students: usize },
}

/// Errors constructing or reading roster input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Student id was empty after trimming
    #[error("student id is empty")]
    EmptyId,

    /// Student name was empty after trimming
    #[error("student name is empty")]
    EmptyName,
}

/// CSV import errors.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The mapped column is not among the CSV headers
    #[error("column '{0}' not found")]
    MissingColumn(String),

    /// The CSV could not be parsed
    #[error("malformed csv: {0}")]
    Parse(#[from] csv::Error),
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// History index does not exist
    #[error("history entry {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Imported document carried neither history nor config
    #[error("document has no history or config section")]
    EmptyImport,
}

/// Export rendering errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failed
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet writer failed
    #[error("spreadsheet export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Payload does not fit in a QR symbol
    #[error("qr encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),

    /// Buffered writer could not be flushed into bytes
    #[error("export buffer error: {0}")]
    Buffer(String),
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
