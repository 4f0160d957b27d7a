//! Pure rendering of a generated document into a fixed-column table.

use super::{DocumentData, GeneratedDocument};
use serde_json::Value;

/// Fixed Prota header set, applied uniformly to every row.
pub const PROTA_HEADERS: [&str; 4] = [
    "Unit",
    "Alur Tujuan Pembelajaran",
    "Alokasi Waktu",
    "Semester",
];

/// Keys tried in order when locating the row array. The wizard shape is
/// canonical; `items` and "first array value" cover deprecated payloads.
const ROW_KEYS: [&str; 2] = ["DAFTAR_PROTA_UTAMA", "items"];

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DocumentTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Locate the row array: `DAFTAR_PROTA_UTAMA`, then `items`, then the first
/// array-valued section in key order.
pub fn find_rows(data: &DocumentData) -> &[Value] {
    for key in ROW_KEYS {
        if let Some(rows) = data.sections.get(key).and_then(Value::as_array) {
            return rows;
        }
    }
    data.sections
        .values()
        .find_map(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Coerce one cell to display text. Nulls and absent keys become the empty
/// string, never the literal "null"; strings keep their content unquoted.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Flatten a generated document into the fixed-column table. Rows are not
/// re-validated against the header set; unknown keys are ignored.
pub fn build_table(document: &GeneratedDocument) -> DocumentTable {
    let headers: Vec<String> = PROTA_HEADERS.iter().map(|h| h.to_string()).collect();
    let rows = find_rows(&document.data)
        .iter()
        .map(|row| {
            PROTA_HEADERS
                .iter()
                .map(|header| cell_text(row.get(header)))
                .collect()
        })
        .collect();
    DocumentTable { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(data: serde_json::Value) -> GeneratedDocument {
        serde_json::from_value(json!({ "data": data, "msg": "ok" })).unwrap()
    }

    #[test]
    fn terminal_payload_renders_one_row() {
        let doc = document(json!({
            "document_structure": {"Judul": "X"},
            "items": [
                {"Unit": "1", "Alur Tujuan Pembelajaran": "Y", "Alokasi Waktu": "2 jam", "Semester": "1"}
            ]
        }));
        let table = build_table(&doc);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "1");
        assert!(table.rows[0].iter().all(|cell| cell != "null"));
    }

    #[test]
    fn null_cell_renders_empty_not_null() {
        let doc = document(json!({
            "DAFTAR_PROTA_UTAMA": [
                {"Unit": "2", "Alur Tujuan Pembelajaran": "Z", "Alokasi Waktu": null, "Semester": null}
            ]
        }));
        let table = build_table(&doc);
        assert_eq!(table.rows[0][2], "");
        assert_eq!(table.rows[0][3], "");
    }

    #[test]
    fn canonical_key_wins_over_items() {
        let doc = document(json!({
            "items": [{"Unit": "old"}],
            "DAFTAR_PROTA_UTAMA": [{"Unit": "new"}]
        }));
        let table = build_table(&doc);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "new");
    }

    #[test]
    fn falls_back_to_first_array_section() {
        let doc = document(json!({
            "note": "not an array",
            "rencana": [{"Unit": "3", "Semester": 2}]
        }));
        let table = build_table(&doc);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "3");
        // numbers render without quotes
        assert_eq!(table.rows[0][3], "2");
    }

    #[test]
    fn no_rows_yields_empty_table_with_headers() {
        let doc = document(json!({"document_structure": {"Judul": "X"}}));
        let table = build_table(&doc);
        assert!(table.is_empty());
        assert_eq!(table.headers, PROTA_HEADERS.to_vec());
    }

    #[test]
    fn missing_keys_render_as_empty_cells() {
        let doc = document(json!({
            "items": [{"Unit": "4"}]
        }));
        let table = build_table(&doc);
        assert_eq!(table.rows[0], vec!["4", "", "", ""]);
    }
}
