//! Model for generated curriculum documents.
//!
//! The canonical payload is the wizard-stream shape: a `document_structure`
//! preamble plus one array of row records. Older payload variants kept the
//! rows under different keys; [`table::find_rows`] tolerates them through an
//! explicit fallback order instead of scanning for "any array".

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub mod table;

pub use table::{build_table, DocumentTable, PROTA_HEADERS};

/// Envelope delivered by the terminal stream event: `{data, msg}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub data: DocumentData,
    #[serde(default)]
    pub msg: String,
}

/// Document content: the structured preamble plus whatever named sections
/// the generator produced. Row arrays live in `sections`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_structure: Option<DocumentStructure>,
    #[serde(flatten)]
    pub sections: BTreeMap<String, Value>,
}

/// Loosely-typed preamble. Every field is optional; absent sections are
/// simply not rendered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStructure {
    #[serde(rename = "Judul", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        rename = "Identitas Dokumen",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub identity: BTreeMap<String, Value>,

    #[serde(
        rename = "Capaian Pembelajaran Umum",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub general_competency: Option<String>,

    #[serde(
        rename = "Elemen Capaian Pembelajaran",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub competency_elements: Vec<CompetencyElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetencyElement {
    #[serde(rename = "Elemen", default)]
    pub element: String,
    #[serde(rename = "Deskripsi", default)]
    pub description: String,
}

impl GeneratedDocument {
    /// Wrap bare document content (e.g. a saved Prota fetched from
    /// `/api/docs/prota/<id>`) in the stream envelope.
    pub fn from_data(data: DocumentData) -> Self {
        Self {
            data,
            msg: String::new(),
        }
    }

    pub fn title(&self) -> &str {
        self.data
            .document_structure
            .as_ref()
            .and_then(|s| s.title.as_deref())
            .unwrap_or("Program Tahunan")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wizard_payload() {
        let json = r#"{
            "data": {
                "document_structure": {
                    "Judul": "Program Tahunan Matematika",
                    "Identitas Dokumen": {"Sekolah": "SMP 1", "Kelas": "7"},
                    "Capaian Pembelajaran Umum": "Peserta didik mampu ...",
                    "Elemen Capaian Pembelajaran": [
                        {"Elemen": "Bilangan", "Deskripsi": "Operasi hitung"}
                    ]
                },
                "DAFTAR_PROTA_UTAMA": [
                    {"Unit": "1", "Alur Tujuan Pembelajaran": "X", "Alokasi Waktu": "2 jam", "Semester": "1"}
                ]
            },
            "msg": "Berhasil"
        }"#;
        let doc: GeneratedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.title(), "Program Tahunan Matematika");
        let structure = doc.data.document_structure.as_ref().unwrap();
        assert_eq!(structure.identity.len(), 2);
        assert_eq!(structure.competency_elements[0].element, "Bilangan");
        assert!(doc.data.sections.contains_key("DAFTAR_PROTA_UTAMA"));
    }

    #[test]
    fn missing_structure_falls_back_to_default_title() {
        let doc = GeneratedDocument::from_data(DocumentData::default());
        assert_eq!(doc.title(), "Program Tahunan");
    }
}
