//! Export formatters for generated documents.
//!
//! Both formatters follow the same rendering order: title, identity block,
//! general competency paragraph, competency elements, then the data table.
//! Missing sections are skipped, never errors. Output content is a pure
//! function of the input document.

use crate::document::GeneratedDocument;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

pub mod docx;
pub mod pdf;

/// Fixed filename stem for exported documents.
pub const EXPORT_STEM: &str = "Prota_Generated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            other => Err(Error::Validation(format!(
                "Unknown export format '{other}' (expected pdf or docx)"
            ))),
        }
    }
}

/// Write one export into `out_dir` and return the file path.
pub fn export_document(
    document: &GeneratedDocument,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(format!("{}.{}", EXPORT_STEM, format.extension()));
    match format {
        ExportFormat::Pdf => pdf::write_pdf(document, &path)?,
        ExportFormat::Docx => docx::write_docx(document, &path)?,
    }
    Ok(path)
}

/// Greedy word wrap to a character budget. Overlong words are hard-split so
/// no output line ever exceeds the budget.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;
        let mut had_word = false;

        for word in raw_line.split_whitespace() {
            had_word = true;
            let word_len = word.chars().count();
            if current_len == 0 {
                if word_len <= max_chars {
                    current.push_str(word);
                    current_len = word_len;
                } else {
                    hard_split(word, max_chars, &mut lines, &mut current, &mut current_len);
                }
            } else if current_len + 1 + word_len <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                if word_len <= max_chars {
                    current.push_str(word);
                    current_len = word_len;
                } else {
                    hard_split(word, max_chars, &mut lines, &mut current, &mut current_len);
                }
            }
        }
        // hard_split may have flushed the last piece already; only an empty
        // input line deserves an empty output line
        if current_len > 0 || !had_word {
            lines.push(current);
        }
    }
    lines
}

fn hard_split(
    word: &str,
    max_chars: usize,
    lines: &mut Vec<String>,
    current: &mut String,
    current_len: &mut usize,
) {
    let chars: Vec<char> = word.chars().collect();
    for piece in chars.chunks(max_chars) {
        let piece: String = piece.iter().collect();
        if piece.chars().count() == max_chars {
            lines.push(piece);
        } else {
            *current_len = piece.chars().count();
            *current = piece;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn wrap_respects_budget() {
        let lines = wrap_text("alur tujuan pembelajaran untuk semester ganjil", 15);
        assert!(lines.iter().all(|l| l.chars().count() <= 15));
        assert_eq!(lines.join(" "), "alur tujuan pembelajaran untuk semester ganjil");
    }

    #[test]
    fn wrap_keeps_empty_lines() {
        let lines = wrap_text("baris satu\n\nbaris dua", 40);
        assert_eq!(lines, vec!["baris satu", "", "baris dua"]);
    }

    #[test]
    fn wrap_hard_splits_overlong_words() {
        let lines = wrap_text("antidisestablishmentarianism", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.concat(), "antidisestablishmentarianism");
    }

    #[test]
    fn wrap_exact_multiple_split_has_no_trailing_blank() {
        assert_eq!(wrap_text("abcdefghij", 5), vec!["abcde", "fghij"]);
        assert_eq!(wrap_text("kata abcdefghij", 5), vec!["kata", "abcde", "fghij"]);
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!(ExportFormat::from_str("PDF").unwrap(), ExportFormat::Pdf);
        assert_eq!(ExportFormat::from_str("word").unwrap(), ExportFormat::Docx);
        assert!(ExportFormat::from_str("odt").is_err());
    }
}
