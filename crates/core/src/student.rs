//! Student records and group containers.
//!
//! A [`Student`] is identified by its id (the enrollment number). The display
//! label is derived on demand from id and name, so the two can never drift
//! apart.

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single student: enrollment id plus name, both non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StudentRecord", into = "StudentRecord")]
pub struct Student {
    id: String,
    name: String,
}

impl Student {
    /// Create a student, trimming both fields.
    ///
    /// Fails if either field is empty after trimming.
    pub fn new(id: impl AsRef<str>, name: impl AsRef<str>) -> Result<Self, InputError> {
        let id = id.as_ref().trim();
        let name = name.as_ref().trim();

        if id.is_empty() {
            return Err(InputError::EmptyId);
        }
        if name.is_empty() {
            return Err(InputError::EmptyName);
        }

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `"<id>, <name>"`, the form shown wherever both fields are wanted.
    pub fn display_label(&self) -> String {
        format!("{}, {}", self.id, self.name)
    }

    /// Render the student according to a display format.
    pub fn render(&self, format: DisplayFormat) -> String {
        match format {
            DisplayFormat::Full => self.display_label(),
            DisplayFormat::NameOnly => self.name.clone(),
            DisplayFormat::IdOnly => self.id.clone(),
        }
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.id, self.name)
    }
}

/// On-disk shape of a student (`matricula`, `nome`, `completo`).
///
/// `completo` is written for readers of the JSON documents and ignored on
/// the way back in.
#[derive(Serialize, Deserialize)]
struct StudentRecord {
    matricula: String,
    nome: String,
    #[serde(default, skip_deserializing)]
    completo: String,
}

impl TryFrom<StudentRecord> for Student {
    type Error = InputError;

    fn try_from(record: StudentRecord) -> Result<Self, Self::Error> {
        Student::new(record.matricula, record.nome)
    }
}

impl From<Student> for StudentRecord {
    fn from(student: Student) -> Self {
        let completo = student.display_label();
        StudentRecord {
            matricula: student.id,
            nome: student.name,
            completo,
        }
    }
}

/// A non-empty ordered list of students working together.
pub type Group = Vec<Student>;

/// Ordered list of groups. Group numbers shown to users are 1-indexed
/// positions in this list.
pub type GroupSet = Vec<Group>;

/// Which student fields a text rendering shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayFormat {
    /// Id and name
    #[default]
    Full,
    /// Name only
    NameOnly,
    /// Id only
    IdOnly,
}

/// Look up a group by its 1-indexed number.
///
/// Out-of-range numbers yield an empty slice.
pub fn group_by_number(groups: &[Group], number: usize) -> &[Student] {
    if number >= 1 && number <= groups.len() {
        &groups[number - 1]
    } else {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let s = Student::new("  2023001 ", " Ana Souza ").unwrap();
        assert_eq!(s.id(), "2023001");
        assert_eq!(s.name(), "Ana Souza");
        assert_eq!(s.display_label(), "2023001, Ana Souza");
    }

    #[test]
    fn test_new_rejects_empty_fields() {
        assert_eq!(Student::new("", "Ana"), Err(InputError::EmptyId));
        assert_eq!(Student::new("1", "   "), Err(InputError::EmptyName));
    }

    #[test]
    fn test_render_formats() {
        let s = Student::new("7", "Bruno").unwrap();
        assert_eq!(s.render(DisplayFormat::Full), "7, Bruno");
        assert_eq!(s.render(DisplayFormat::NameOnly), "Bruno");
        assert_eq!(s.render(DisplayFormat::IdOnly), "7");
        assert_eq!(s.to_string(), "7, Bruno");
    }

    #[test]
    fn test_json_shape() {
        let s = Student::new("7", "Bruno").unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["matricula"], "7");
        assert_eq!(json["nome"], "Bruno");
        assert_eq!(json["completo"], "7, Bruno");

        let back: Student = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_json_rejects_blank_name() {
        let json = serde_json::json!({"matricula": "7", "nome": ""});
        assert!(serde_json::from_value::<Student>(json).is_err());
    }

    #[test]
    fn test_group_by_number() {
        let a = Student::new("1", "A").unwrap();
        let b = Student::new("2", "B").unwrap();
        let groups = vec![vec![a.clone()], vec![b.clone()]];

        assert_eq!(group_by_number(&groups, 1), &[a][..]);
        assert_eq!(group_by_number(&groups, 2), &[b][..]);
        assert!(group_by_number(&groups, 0).is_empty());
        assert!(group_by_number(&groups, 3).is_empty());
    }
}
