//! Multipart upload endpoints: reference PDFs, layout templates, books and
//! CP (Capaian Pembelajaran) documents.

use super::{map_send_error, ApiClient};
use crate::error::{Error, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Response of the batch PDF upload; processing continues server-side.
#[derive(Debug, Deserialize)]
pub struct QueuedUploads {
    pub message: String,
    #[serde(default)]
    pub queued_files: Vec<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

async fn file_part(path: &Path) -> Result<Part> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Validation(format!("Invalid file name: {}", path.display())))?
        .to_string();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Validation(format!("Cannot read {}: {}", path.display(), e)))?;
    Part::bytes(bytes)
        .file_name(name)
        .mime_str(mime.as_ref())
        .map_err(Error::Request)
}

impl ApiClient {
    async fn send_multipart<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T> {
        let response = self
            .post(path)?
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;
        self.read_json(response).await
    }

    /// `POST /api/upload/pdf` with one or more `files` parts. Only PDFs are
    /// accepted server-side; OCR happens asynchronously afterwards.
    pub async fn upload_pdfs(&self, paths: &[impl AsRef<Path>]) -> Result<QueuedUploads> {
        if paths.is_empty() {
            return Err(Error::Validation("No files given".to_string()));
        }
        let mut form = Form::new();
        for path in paths {
            form = form.part("files", file_part(path.as_ref()).await?);
        }
        self.send_multipart("/api/upload/pdf", form).await
    }

    /// Upload a layout template (`jenjang` = school level, `mapel` =
    /// subject, `tipe_dokumen` = document type the layout is for).
    pub async fn upload_layout(
        &self,
        path: &Path,
        jenjang: &str,
        mapel: &str,
        tipe_dokumen: &str,
    ) -> Result<String> {
        let form = Form::new()
            .part("file", file_part(path).await?)
            .text("jenjang", jenjang.to_string())
            .text("mapel", mapel.to_string())
            .text("tipe_dokumen", tipe_dokumen.to_string());
        let ack: serde_json::Value = self.send_multipart("/api/layouts/upload", form).await?;
        Ok(ack_message(&ack))
    }

    /// Upload a teaching book PDF for one subject and grade.
    pub async fn upload_book(
        &self,
        path: &Path,
        jenjang: &str,
        mapel_id: i64,
        kelas: &str,
    ) -> Result<String> {
        let form = Form::new()
            .part("file", file_part(path).await?)
            .text("jenjang", jenjang.to_string())
            .text("mapel_id", mapel_id.to_string())
            .text("kelas", kelas.to_string());
        let ack: serde_json::Value = self.send_multipart("/api/books/upload", form).await?;
        Ok(ack_message(&ack))
    }

    /// Upload an official CP reference document.
    pub async fn upload_cp(&self, path: &Path, jenjang: &str, mapel: &str) -> Result<String> {
        let form = Form::new()
            .part("file", file_part(path).await?)
            .text("jenjang", jenjang.to_string())
            .text("mapel", mapel.to_string());
        let ack: serde_json::Value = self.send_multipart("/api/cp/upload", form).await?;
        Ok(ack_message(&ack))
    }
}

fn ack_message(value: &serde_json::Value) -> String {
    for key in ["msg", "message"] {
        if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    "OK".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_message_prefers_msg() {
        let value = serde_json::json!({"msg": "Layout berhasil diunggah", "message": "other"});
        assert_eq!(ack_message(&value), "Layout berhasil diunggah");
    }

    #[test]
    fn ack_message_defaults_to_ok() {
        assert_eq!(ack_message(&serde_json::json!({})), "OK");
    }

    #[tokio::test]
    async fn file_part_rejects_missing_file() {
        let result = file_part(Path::new("/nonexistent/book.pdf")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
