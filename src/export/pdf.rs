//! PDF formatter built on printpdf's builtin Helvetica fonts.
//!
//! Layout is computed first as a pure list of positioned lines, then drawn
//! page by page. Content depends only on the input document.

use super::wrap_text;
use crate::document::{build_table, GeneratedDocument};
use crate::error::{Error, Result};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 15.0;
const MARGIN_TOP: f32 = 15.0;
const MARGIN_BOTTOM: f32 = 17.0;

/// Column x offsets and character budgets for the Prota table.
const TABLE_COLUMNS: [(f32, usize); 4] = [
    (MARGIN_LEFT, 10),
    (MARGIN_LEFT + 25.0, 45),
    (MARGIN_LEFT + 115.0, 16),
    (MARGIN_LEFT + 152.0, 10),
];

/// Characters that fit a full-width body line at 11pt Helvetica.
const BODY_WRAP: usize = 90;
const TITLE_WRAP: usize = 60;

/// One drawable line: text spans at fixed x offsets, shared font settings,
/// and the vertical advance that follows it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    pub spans: Vec<(f32, String)>,
    pub size: f32,
    pub bold: bool,
    pub advance: f32,
}

impl Line {
    fn paragraph(text: String, size: f32, bold: bool, advance: f32) -> Self {
        Self {
            spans: vec![(MARGIN_LEFT, text)],
            size,
            bold,
            advance,
        }
    }
}

fn push_wrapped(lines: &mut Vec<Line>, text: &str, size: f32, bold: bool, wrap: usize) {
    for piece in wrap_text(text, wrap) {
        let advance = if size >= 14.0 { 7.0 } else { 5.0 };
        lines.push(Line::paragraph(piece, size, bold, advance));
    }
}

fn push_gap(lines: &mut Vec<Line>, gap: f32) {
    lines.push(Line {
        spans: Vec::new(),
        size: 0.0,
        bold: false,
        advance: gap,
    });
}

/// Flatten the document into drawable lines in the shared rendering order:
/// title, identity, general competency, competency elements, table.
pub(crate) fn layout(document: &GeneratedDocument) -> Vec<Line> {
    let mut lines = Vec::new();

    push_wrapped(&mut lines, document.title(), 16.0, true, TITLE_WRAP);
    push_gap(&mut lines, 4.0);

    if let Some(structure) = &document.data.document_structure {
        if !structure.identity.is_empty() {
            push_wrapped(&mut lines, "Identitas Dokumen", 13.0, true, BODY_WRAP);
            for (key, value) in &structure.identity {
                let text = format!("{}: {}", key, crate::document::table::cell_text(Some(value)));
                push_wrapped(&mut lines, &text, 11.0, false, BODY_WRAP);
            }
            push_gap(&mut lines, 3.0);
        }

        if let Some(competency) = &structure.general_competency {
            push_wrapped(&mut lines, "Capaian Pembelajaran Umum", 13.0, true, BODY_WRAP);
            push_wrapped(&mut lines, competency, 11.0, false, BODY_WRAP);
            push_gap(&mut lines, 3.0);
        }

        if !structure.competency_elements.is_empty() {
            push_wrapped(
                &mut lines,
                "Elemen Capaian Pembelajaran",
                13.0,
                true,
                BODY_WRAP,
            );
            for element in &structure.competency_elements {
                push_wrapped(&mut lines, &element.element, 11.0, true, BODY_WRAP);
                push_wrapped(&mut lines, &element.description, 11.0, false, BODY_WRAP);
            }
            push_gap(&mut lines, 3.0);
        }
    }

    let table = build_table(document);
    if !table.is_empty() {
        push_gap(&mut lines, 2.0);
        lines.push(table_line(&table.headers, true));
        for row in &table.rows {
            lines.extend(row_lines(row));
        }
    }

    lines
}

/// Single-line table row (used for the header, which never wraps).
fn table_line(cells: &[String], bold: bool) -> Line {
    let spans = cells
        .iter()
        .zip(TABLE_COLUMNS.iter())
        .map(|(cell, (x, wrap))| {
            let mut text = cell.clone();
            if text.chars().count() > *wrap {
                text = text.chars().take(*wrap).collect();
            }
            (*x, text)
        })
        .collect();
    Line {
        spans,
        size: 11.0,
        bold,
        advance: 6.0,
    }
}

/// A data row wraps each cell to its column budget and emits one drawable
/// line per wrapped row, padding short cells with empty spans.
fn row_lines(row: &[String]) -> Vec<Line> {
    let wrapped: Vec<Vec<String>> = row
        .iter()
        .zip(TABLE_COLUMNS.iter())
        .map(|(cell, (_, wrap))| wrap_text(cell, *wrap))
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);

    (0..height)
        .map(|i| {
            let spans = wrapped
                .iter()
                .zip(TABLE_COLUMNS.iter())
                .filter_map(|(cell_lines, (x, _))| {
                    cell_lines.get(i).map(|text| (*x, text.clone()))
                })
                .collect();
            Line {
                spans,
                size: 10.0,
                bold: false,
                advance: if i + 1 == height { 6.0 } else { 4.5 },
            }
        })
        .collect()
}

/// Render the layout into an A4 PDF at `path`.
pub fn write_pdf(document: &GeneratedDocument, path: &Path) -> Result<()> {
    let (doc, page, layer) = PdfDocument::new(
        document.title(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::Export(format!("Cannot load PDF font: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::Export(format!("Cannot load PDF font: {e}")))?;

    let mut current: PdfLayerReference = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - MARGIN_TOP;

    for line in layout(document) {
        if y - line.advance < MARGIN_BOTTOM {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_HEIGHT - MARGIN_TOP;
        }
        let font: &IndirectFontRef = if line.bold { &bold } else { &regular };
        for (x, text) in &line.spans {
            if !text.is_empty() {
                current.use_text(text.clone(), line.size, Mm(*x), Mm(y), font);
            }
        }
        y -= line.advance;
    }

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| Error::Export(format!("Cannot write PDF: {e}")))?;
    Ok(())
}
