//! QR payloads for sharing groups.
//!
//! A payload is a small JSON document describing one group or all of them.
//! It is serialized compactly and encoded at the highest error-correction
//! level, so a printed code survives smudges.

use crate::error::{ExportError, Result};
use crate::store::DOCUMENT_VERSION;
use crate::student::{Group, Student};
use chrono::Local;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};

const MIN_IMAGE_SIZE: u32 = 200;

/// Student as carried inside a QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrStudent {
    #[serde(rename = "matricula")]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
}

impl From<&Student> for QrStudent {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id().to_string(),
            name: s.name().to_string(),
        }
    }
}

/// One group inside an all-groups payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrGroup {
    #[serde(rename = "grupo_id")]
    pub group_id: usize,
    #[serde(rename = "total_estudantes")]
    pub student_count: usize,
    #[serde(rename = "estudantes")]
    pub students: Vec<QrStudent>,
}

/// JSON document encoded into a QR code, tagged by `tipo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum QrPayload {
    #[serde(rename = "grupo_individual")]
    Group {
        #[serde(rename = "grupo_id")]
        group_id: usize,
        #[serde(rename = "total_estudantes")]
        student_count: usize,
        #[serde(rename = "data_geracao")]
        generated_at: String,
        #[serde(rename = "versao")]
        version: String,
        #[serde(rename = "estudantes")]
        students: Vec<QrStudent>,
    },
    #[serde(rename = "todos_grupos")]
    AllGroups {
        #[serde(rename = "total_grupos")]
        group_count: usize,
        #[serde(rename = "total_estudantes")]
        student_count: usize,
        #[serde(rename = "data_geracao")]
        generated_at: String,
        #[serde(rename = "versao")]
        version: String,
        #[serde(rename = "grupos")]
        groups: Vec<QrGroup>,
    },
}

impl QrPayload {
    /// Payload for one group; `number` is its 1-indexed position.
    pub fn for_group(group: &[Student], number: usize) -> Self {
        QrPayload::Group {
            group_id: number,
            student_count: group.len(),
            generated_at: Local::now().to_rfc3339(),
            version: DOCUMENT_VERSION.to_string(),
            students: group.iter().map(QrStudent::from).collect(),
        }
    }

    /// Payload holding every group.
    pub fn for_all(groups: &[Group]) -> Self {
        QrPayload::AllGroups {
            group_count: groups.len(),
            student_count: groups.iter().map(Vec::len).sum(),
            generated_at: Local::now().to_rfc3339(),
            version: DOCUMENT_VERSION.to_string(),
            groups: groups
                .iter()
                .enumerate()
                .map(|(i, g)| QrGroup {
                    group_id: i + 1,
                    student_count: g.len(),
                    students: g.iter().map(QrStudent::from).collect(),
                })
                .collect(),
        }
    }

    /// Compact JSON, as encoded into the code.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode into a QR code rendered as SVG.
    ///
    /// Fails when the payload exceeds the capacity of the largest symbol.
    pub fn render_svg(&self) -> Result<QrImage> {
        let json = self.to_json()?;
        let code = QrCode::with_error_correction_level(json.as_bytes(), EcLevel::H).map_err(ExportError::from)?;

        let svg = code
            .render::<svg::Color>()
            .min_dimensions(MIN_IMAGE_SIZE, MIN_IMAGE_SIZE)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();

        Ok(QrImage {
            svg,
            json,
            payload: self.clone(),
        })
    }
}

/// A rendered QR code together with what it encodes.
#[derive(Debug, Clone)]
pub struct QrImage {
    pub svg: String,
    pub json: String,
    pub payload: QrPayload,
}

/// Render one code per group, numbered from 1.
pub fn batch(groups: &[Group]) -> Result<Vec<(usize, QrImage)>> {
    groups
        .iter()
        .enumerate()
        .map(|(i, g)| Ok((i + 1, QrPayload::for_group(g, i + 1).render_svg()?)))
        .collect()
}

/// Parse a scanned payload. Anything that is not a valid payload yields
/// `None`.
pub fn decode_payload(json: &str) -> Option<QrPayload> {
    serde_json::from_str(json).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        vec![
            vec![Student::new("1", "Ana").unwrap(), Student::new("2", "Bruno").unwrap()],
            vec![Student::new("3", "Caio").unwrap(), Student::new("4", "Dora").unwrap()],
        ]
    }

    #[test]
    fn test_group_payload_shape() {
        let g = groups();
        let json = QrPayload::for_group(&g[1], 2).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tipo"], "grupo_individual");
        assert_eq!(value["grupo_id"], 2);
        assert_eq!(value["total_estudantes"], 2);
        assert_eq!(value["versao"], "2.0");
        assert_eq!(value["estudantes"][0]["matricula"], "3");
        assert_eq!(value["estudantes"][1]["nome"], "Dora");
        assert!(value["data_geracao"].is_string());
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_all_groups_payload_shape() {
        let value = serde_json::to_value(QrPayload::for_all(&groups())).unwrap();

        assert_eq!(value["tipo"], "todos_grupos");
        assert_eq!(value["total_grupos"], 2);
        assert_eq!(value["total_estudantes"], 4);
        assert_eq!(value["grupos"][1]["grupo_id"], 2);
        assert_eq!(value["grupos"][1]["estudantes"][0]["matricula"], "3");
    }

    #[test]
    fn test_decode_payload() {
        let payload = QrPayload::for_all(&groups());
        let json = payload.to_json().unwrap();

        assert_eq!(decode_payload(&json), Some(payload));
        assert_eq!(decode_payload("not json"), None);
        assert_eq!(decode_payload(r#"{"tipo": "outro"}"#), None);
    }

    #[test]
    fn test_render_svg() {
        let image = QrPayload::for_group(&groups()[0], 1).render_svg().unwrap();
        assert!(image.svg.contains("<svg"));
        assert_eq!(decode_payload(&image.json), Some(image.payload));
    }

    #[test]
    fn test_batch_numbers_groups() {
        let images = batch(&groups()).unwrap();
        let numbers: Vec<usize> = images.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_oversized_payload_fails() {
        let big: Group = (0..300)
            .map(|i| Student::new(format!("2024{i:05}"), format!("Estudante Numero {i}")).unwrap())
            .collect();
        let err = QrPayload::for_group(&big, 1).render_svg().unwrap_err();
        assert!(matches!(err, crate::Error::Export(ExportError::Qr(_))));
    }
}
