//! Rendering group sets into downloadable formats.
//!
//! All adapters number groups by 1-indexed position and emit one row per
//! student. They make no decisions of their own.

use crate::error::{ExportError, Result};
use crate::student::{DisplayFormat, Group, Student};
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Format, Workbook};

/// Column headers shared by the CSV and spreadsheet exports.
pub const HEADERS: [&str; 3] = ["Grupo", "Matrícula", "Nome"];

/// Spreadsheet column widths, matching [`HEADERS`].
const COLUMN_WIDTHS: [f64; 3] = [10.0, 15.0, 30.0];

const SHEET_NAME: &str = "Grupos";
const TEXT_SEPARATOR_WIDTH: usize = 40;
const MAX_FILE_NAME: usize = 200;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Csv,
    Xlsx,
    Text,
    /// SVG QR code of all groups
    QrSvg,
    /// JSON payload of the all-groups QR code
    QrJson,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Csv => "csv",
            ExportKind::Xlsx => "xlsx",
            ExportKind::Text => "txt",
            ExportKind::QrSvg => "svg",
            ExportKind::QrJson => "json",
        }
    }
}

/// One student with its group number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow<'a> {
    pub group: usize,
    pub student: &'a Student,
}

/// Flatten groups into numbered rows.
pub fn export_rows(groups: &[Group]) -> Vec<ExportRow<'_>> {
    groups
        .iter()
        .enumerate()
        .flat_map(|(i, g)| g.iter().map(move |student| ExportRow { group: i + 1, student }))
        .collect()
}

/// `Grupo,Matrícula,Nome` CSV, UTF-8.
pub fn to_csv(groups: &[Group]) -> Result<Vec<u8>> {
    Ok(csv_bytes(groups)?)
}

fn csv_bytes(groups: &[Group]) -> std::result::Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADERS)?;
    for row in export_rows(groups) {
        wtr.write_record([row.group.to_string().as_str(), row.student.id(), row.student.name()])?;
    }
    wtr.into_inner().map_err(|e| ExportError::Buffer(e.to_string()))
}

/// Single-sheet workbook with the same columns as [`to_csv`].
pub fn to_xlsx(groups: &[Group]) -> Result<Vec<u8>> {
    Ok(xlsx_bytes(groups)?)
}

fn xlsx_bytes(groups: &[Group]) -> std::result::Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &bold)?;
        sheet.set_column_width(col, width)?;
    }

    for (i, row) in export_rows(groups).into_iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_number(r, 0, row.group as f64)?;
        sheet.write_string(r, 1, row.student.id())?;
        sheet.write_string(r, 2, row.student.name())?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Plain-text listing: a header and `=` rule per group, numbered members,
/// blank line between groups.
pub fn to_text(groups: &[Group], format: DisplayFormat) -> String {
    let mut lines = Vec::new();

    for (i, group) in groups.iter().enumerate() {
        lines.push(format!("Grupo {} ({} estudantes)", i + 1, group.len()));
        lines.push("=".repeat(TEXT_SEPARATOR_WIDTH));
        for (j, student) in group.iter().enumerate() {
            lines.push(format!("{}. {}", j + 1, student.render(format)));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// One student per line, no numbering.
pub fn simple_list(group: &[Student], format: DisplayFormat) -> String {
    group
        .iter()
        .map(|s| s.render(format))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `grupos_estudantes_<YYYYmmdd_HHMM>.<ext>`
pub fn suggested_file_name(kind: ExportKind, at: NaiveDateTime) -> String {
    format!("grupos_estudantes_{}.{}", at.format("%Y%m%d_%H%M"), kind.extension())
}

/// Strip characters not allowed in file names and cap the length at 200,
/// keeping the extension.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();

    if cleaned.chars().count() <= MAX_FILE_NAME {
        return cleaned;
    }

    match cleaned.rsplit_once('.') {
        Some((stem, ext)) => {
            let stem: String = stem.chars().take(MAX_FILE_NAME - 5).collect();
            format!("{stem}.{ext}")
        }
        None => cleaned.chars().take(MAX_FILE_NAME).collect(),
    }
}
