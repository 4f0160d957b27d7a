//! DOCX formatter built on docx-rs.
//!
//! The document is assembled from a pure paragraph plan plus the fixed
//! Prota table, in the same rendering order as the PDF formatter.

use crate::document::{build_table, GeneratedDocument};
use crate::error::{Error, Result};
use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use std::fs::File;
use std::path::Path;

/// Half-point font sizes.
const TITLE_SIZE: usize = 32;
const HEADING_SIZE: usize = 26;
const BODY_SIZE: usize = 22;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub text: String,
    pub size: usize,
    pub bold: bool,
}

fn block(text: impl Into<String>, size: usize, bold: bool) -> Block {
    Block {
        text: text.into(),
        size,
        bold,
    }
}

/// Paragraphs preceding the table, in rendering order. Absent sections are
/// skipped outright.
pub(crate) fn preamble(document: &GeneratedDocument) -> Vec<Block> {
    let mut blocks = vec![block(document.title(), TITLE_SIZE, true)];

    if let Some(structure) = &document.data.document_structure {
        if !structure.identity.is_empty() {
            blocks.push(block("Identitas Dokumen", HEADING_SIZE, true));
            for (key, value) in &structure.identity {
                let text = format!("{}: {}", key, crate::document::table::cell_text(Some(value)));
                blocks.push(block(text, BODY_SIZE, false));
            }
        }

        if let Some(competency) = &structure.general_competency {
            blocks.push(block("Capaian Pembelajaran Umum", HEADING_SIZE, true));
            blocks.push(block(competency, BODY_SIZE, false));
        }

        if !structure.competency_elements.is_empty() {
            blocks.push(block("Elemen Capaian Pembelajaran", HEADING_SIZE, true));
            for element in &structure.competency_elements {
                blocks.push(block(&element.element, BODY_SIZE, true));
                blocks.push(block(&element.description, BODY_SIZE, false));
            }
        }
    }

    blocks
}

fn paragraph(text: &str, size: usize, bold: bool) -> Paragraph {
    let mut run = Run::new().add_text(text).size(size);
    if bold {
        run = run.bold();
    }
    Paragraph::new().add_run(run)
}

fn cell(text: &str, bold: bool) -> TableCell {
    TableCell::new().add_paragraph(paragraph(text, BODY_SIZE, bold))
}

/// Write the document to `path` as a Word file.
pub fn write_docx(document: &GeneratedDocument, path: &Path) -> Result<()> {
    let mut docx = Docx::new();

    for block in preamble(document) {
        docx = docx.add_paragraph(paragraph(&block.text, block.size, block.bold));
    }

    let table = build_table(document);
    if !table.is_empty() {
        let mut rows = vec![TableRow::new(
            table.headers.iter().map(|h| cell(h, true)).collect(),
        )];
        for row in &table.rows {
            rows.push(TableRow::new(row.iter().map(|c| cell(c, false)).collect()));
        }
        docx = docx.add_paragraph(Paragraph::new()).add_table(Table::new(rows));
    }

    let file = File::create(path)?;
    docx.build()
        .pack(file)
        .map_err(|e| Error::Export(format!("Cannot write DOCX: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> GeneratedDocument {
        serde_json::from_value(json!({
            "data": {
                "document_structure": {
                    "Judul": "Program Tahunan IPA",
                    "Identitas Dokumen": {"Kelas": "8"},
                    "Elemen Capaian Pembelajaran": [
                        {"Elemen": "Zat dan Perubahannya", "Deskripsi": "Mengidentifikasi wujud zat"}
                    ]
                },
                "DAFTAR_PROTA_UTAMA": [
                    {"Unit": "1", "Alur Tujuan Pembelajaran": "Wujud zat", "Alokasi Waktu": null, "Semester": "1"}
                ]
            },
            "msg": "ok"
        }))
        .unwrap()
    }

    #[test]
    fn preamble_order_and_content() {
        let blocks = preamble(&sample());
        assert_eq!(blocks[0].text, "Program Tahunan IPA");
        assert!(blocks[0].bold);
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert!(texts.contains(&"Identitas Dokumen"));
        assert!(texts.contains(&"Kelas: 8"));
        assert!(texts.contains(&"Zat dan Perubahannya"));
        // absent general competency is skipped
        assert!(!texts.contains(&"Capaian Pembelajaran Umum"));
    }

    #[test]
    fn preamble_is_deterministic() {
        let doc = sample();
        assert_eq!(preamble(&doc), preamble(&doc));
    }

    #[test]
    fn empty_document_still_has_a_title() {
        let doc: GeneratedDocument =
            serde_json::from_value(json!({"data": {}, "msg": ""})).unwrap();
        let blocks = preamble(&doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Program Tahunan");
    }

    #[test]
    fn writes_a_docx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Prota_Generated.docx");
        write_docx(&sample(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // DOCX is a zip container
        assert!(bytes.starts_with(b"PK"));
    }
}
