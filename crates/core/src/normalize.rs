//! Roster input normalization.
//!
//! Turns free text or CSV into a list of [`Student`]s. Malformed lines are
//! excluded and reported per line; duplicate ids are reported but kept, so
//! the caller decides what to do with them.
//!
//! # Line formats
//!
//! - `"<id>, <name>"`: split on the first comma
//! - `"<digits> <name>"`: the leading digit run is the id

use crate::error::{CsvError, Result};
use crate::student::Student;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;

/// Result of parsing a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Empty or whitespace-only line; skipped silently
    Blank,
    /// Line produced a student
    Parsed(Student),
    /// Line could not be parsed
    Rejected(&'static str),
}

const MISSING_FIELD: &str = "missing id or name";
const MISSING_NAME: &str = "name missing after id";
const UNRECOGNIZED: &str = "unrecognized format, use 'id, name' or 'id name'";

/// Parse one roster line.
pub fn parse_line(line: &str) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Blank;
    }

    if let Some((id, name)) = line.split_once(',') {
        return match Student::new(id, name) {
            Ok(student) => LineOutcome::Parsed(student),
            Err(_) => LineOutcome::Rejected(MISSING_FIELD),
        };
    }

    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return LineOutcome::Rejected(UNRECOGNIZED);
    }

    let (id, name) = line.split_at(digits);
    match Student::new(id, name) {
        Ok(student) => LineOutcome::Parsed(student),
        Err(_) => LineOutcome::Rejected(MISSING_NAME),
    }
}

/// A rejected input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineError {
    /// 1-based line number in the original text
    pub line_number: usize,
    /// The trimmed line content
    pub raw_content: String,
    pub reason: String,
}

/// Where and under which names a duplicated id occurs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateInfo {
    pub count: usize,
    /// Positions in the accepted student list
    pub indices: Vec<usize>,
    pub names: Vec<String>,
}

/// Outcome of normalizing a block of text.
#[derive(Debug, Clone, Default)]
pub struct NormalizedInput {
    pub students: Vec<Student>,
    pub errors: Vec<LineError>,
    pub duplicates: BTreeMap<String, DuplicateInfo>,
}

impl NormalizedInput {
    /// True when every non-blank line parsed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Normalize a multi-line roster.
pub fn normalize_text(text: &str) -> NormalizedInput {
    let mut students = Vec::new();
    let mut errors = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        match parse_line(line) {
            LineOutcome::Blank => {}
            LineOutcome::Parsed(student) => students.push(student),
            LineOutcome::Rejected(reason) => errors.push(LineError {
                line_number: idx + 1,
                raw_content: line.trim().to_string(),
                reason: reason.to_string(),
            }),
        }
    }

    let duplicates = find_duplicates(&students);
    if !errors.is_empty() || !duplicates.is_empty() {
        tracing::debug!(
            accepted = students.len(),
            rejected = errors.len(),
            duplicated_ids = duplicates.len(),
            "roster normalized with issues"
        );
    }

    NormalizedInput {
        students,
        errors,
        duplicates,
    }
}

/// Report ids that occur more than once.
pub fn find_duplicates(students: &[Student]) -> BTreeMap<String, DuplicateInfo> {
    let mut seen: BTreeMap<String, DuplicateInfo> = BTreeMap::new();

    for (i, student) in students.iter().enumerate() {
        let info = seen.entry(student.id().to_string()).or_default();
        info.count += 1;
        info.indices.push(i);
        info.names.push(student.name().to_string());
    }

    seen.retain(|_, info| info.count > 1);
    seen
}

/// One line of a roster preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLine {
    /// 1-based position among non-blank lines
    pub position: usize,
    pub content: String,
    pub outcome: LineOutcome,
}

/// Quick look at the first lines of a roster before full processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Non-blank lines in the whole text
    pub total_lines: usize,
    pub shown: usize,
    pub lines: Vec<PreviewLine>,
    pub valid_in_preview: usize,
    pub invalid_in_preview: usize,
}

/// Parse at most `limit` non-blank lines for a preview.
pub fn preview(text: &str, limit: usize) -> Preview {
    let non_blank: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let lines: Vec<PreviewLine> = non_blank
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, line)| PreviewLine {
            position: i + 1,
            content: line.to_string(),
            outcome: parse_line(line),
        })
        .collect();

    let valid = lines
        .iter()
        .filter(|l| matches!(l.outcome, LineOutcome::Parsed(_)))
        .count();

    Preview {
        total_lines: non_blank.len(),
        shown: lines.len(),
        valid_in_preview: valid,
        invalid_in_preview: lines.len() - valid,
        lines,
    }
}

/// A CSV roster held in memory so the caller can pick id and name columns.
#[derive(Debug, Clone)]
pub struct CsvRoster {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Problems found when checking a column mapping against a CSV roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvReport {
    pub missing_columns: Vec<String>,
    pub empty_ids: usize,
    pub empty_names: usize,
    /// Duplicated ids, in first-seen order
    pub duplicate_ids: Vec<String>,
}

impl CsvReport {
    pub fn is_valid(&self) -> bool {
        self.missing_columns.is_empty()
            && self.empty_ids == 0
            && self.empty_names == 0
            && self.duplicate_ids.is_empty()
    }

    /// Human-readable problem list; duplicates list at most five ids.
    pub fn messages(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .missing_columns
            .iter()
            .map(|c| format!("column '{c}' not found"))
            .collect();

        if self.empty_ids > 0 {
            out.push(format!("{} empty ids found", self.empty_ids));
        }
        if self.empty_names > 0 {
            out.push(format!("{} empty names found", self.empty_names));
        }
        if !self.duplicate_ids.is_empty() {
            let shown: Vec<&str> = self.duplicate_ids.iter().take(5).map(String::as_str).collect();
            out.push(format!("duplicate ids: {}", shown.join(", ")));
        }
        out
    }
}

impl CsvRoster {
    /// Read a headed CSV document. Ragged rows are accepted; missing cells
    /// read as empty.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(CsvError::from)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(CsvError::from)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn cell<'a>(&self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(|s| s.trim()).unwrap_or("")
    }

    /// Check a column mapping without building students.
    pub fn validate(&self, id_column: &str, name_column: &str) -> CsvReport {
        let mut report = CsvReport::default();

        let id_col = self.column_index(id_column);
        let name_col = self.column_index(name_column);
        if id_col.is_none() {
            report.missing_columns.push(id_column.to_string());
        }
        if name_col.is_none() {
            report.missing_columns.push(name_column.to_string());
        }
        let (Some(id_col), Some(name_col)) = (id_col, name_col) else {
            return report;
        };

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();
        for row in &self.rows {
            let id = self.cell(row, id_col);
            if id.is_empty() {
                report.empty_ids += 1;
            } else {
                let count = counts.entry(id).or_insert(0);
                *count += 1;
                if *count == 2 {
                    order.push(id);
                }
            }
            if self.cell(row, name_col).is_empty() {
                report.empty_names += 1;
            }
        }

        report.duplicate_ids = order.into_iter().map(str::to_string).collect();
        report
    }

    /// Build students from the mapped columns.
    ///
    /// Rows with an empty id or name are dropped.
    pub fn students(&self, id_column: &str, name_column: &str) -> Result<Vec<Student>> {
        let id_col = self
            .column_index(id_column)
            .ok_or_else(|| CsvError::MissingColumn(id_column.to_string()))?;
        let name_col = self
            .column_index(name_column)
            .ok_or_else(|| CsvError::MissingColumn(name_column.to_string()))?;

        let students: Vec<Student> = self
            .rows
            .iter()
            .filter_map(|row| Student::new(self.cell(row, id_col), self.cell(row, name_col)).ok())
            .collect();

        tracing::debug!(
            rows = self.rows.len(),
            accepted = students.len(),
            "csv roster mapped"
        );
        Ok(students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Student {
        match parse_line(line) {
            LineOutcome::Parsed(s) => s,
            other => panic!("expected parsed line, got {other:?}"),
        }
    }

    #[test]
    fn test_comma_format_splits_on_first_comma() {
        let s = parsed("2023001, Silva, Ana");
        assert_eq!(s.id(), "2023001");
        assert_eq!(s.name(), "Silva, Ana");
    }

    #[test]
    fn test_digit_format() {
        let s = parsed("2023002 Bruno Lima");
        assert_eq!(s.id(), "2023002");
        assert_eq!(s.name(), "Bruno Lima");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(parse_line("  "), LineOutcome::Blank);
        assert_eq!(parse_line(", Ana"), LineOutcome::Rejected(MISSING_FIELD));
        assert_eq!(parse_line("123,"), LineOutcome::Rejected(MISSING_FIELD));
        assert_eq!(parse_line("12345"), LineOutcome::Rejected(MISSING_NAME));
        assert_eq!(parse_line("Ana Souza"), LineOutcome::Rejected(UNRECOGNIZED));
    }

    #[test]
    fn test_normalize_text_reports_line_numbers() {
        let text = "1, Ana\n\nnot a student\n2 Bruno\n";
        let out = normalize_text(text);

        assert_eq!(out.students.len(), 2);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].line_number, 3);
        assert_eq!(out.errors[0].raw_content, "not a student");
        assert!(!out.is_clean());
    }

    #[test]
    fn test_duplicates_are_kept_and_reported() {
        let out = normalize_text("1, Ana\n2, Bruno\n1, Ana Clara\n");

        assert_eq!(out.students.len(), 3);
        let dup = &out.duplicates["1"];
        assert_eq!(dup.count, 2);
        assert_eq!(dup.indices, vec![0, 2]);
        assert_eq!(dup.names, vec!["Ana", "Ana Clara"]);
        assert!(!out.duplicates.contains_key("2"));
    }

    #[test]
    fn test_preview_limits_lines() {
        let text = "1, A\nbad\n3, C\n\n4, D\n5, E\n6, F\n";
        let p = preview(text, 3);

        assert_eq!(p.total_lines, 6);
        assert_eq!(p.shown, 3);
        assert_eq!(p.valid_in_preview, 2);
        assert_eq!(p.invalid_in_preview, 1);
        assert_eq!(p.lines[1].content, "bad");
    }

    #[test]
    fn test_csv_students_drop_incomplete_rows() {
        let data = "Matricula,Nome,Turma\n1,Ana,A\n,Bruno,A\n3,,B\n4,Daniela,B\n";
        let roster = CsvRoster::from_reader(data.as_bytes()).unwrap();

        assert_eq!(roster.columns(), &["Matricula", "Nome", "Turma"]);
        let students = roster.students("Matricula", "Nome").unwrap();
        let ids: Vec<&str> = students.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_csv_missing_column() {
        let roster = CsvRoster::from_reader("a,b\n1,2\n".as_bytes()).unwrap();
        let err = roster.students("id", "b").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Csv(CsvError::MissingColumn(ref c)) if c == "id"
        ));
    }

    #[test]
    fn test_csv_validate() {
        let data = "id,name\n1,Ana\n1,Bia\n,Caio\n2,\n";
        let roster = CsvRoster::from_reader(data.as_bytes()).unwrap();

        let report = roster.validate("id", "name");
        assert!(!report.is_valid());
        assert_eq!(report.empty_ids, 1);
        assert_eq!(report.empty_names, 1);
        assert_eq!(report.duplicate_ids, vec!["1"]);

        let missing = roster.validate("x", "name");
        assert_eq!(missing.missing_columns, vec!["x"]);
        assert_eq!(missing.messages(), vec!["column 'x' not found"]);
    }
}
