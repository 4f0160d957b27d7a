//! Typed CRUD access to the platform resources: schools, classes, users,
//! subjects and saved documents.

use super::ApiClient;
use crate::document::DocumentData;
use crate::error::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub level: String,
}

#[derive(Debug, Serialize)]
pub struct NewSchool {
    pub name: String,
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Row of `GET /api/classes`; related entities come back flattened to names.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassSummary {
    pub id: i64,
    pub class_name: String,
    pub grade_level: i64,
    pub parallel_class: String,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewClass {
    pub subject_id: i64,
    pub teacher_id: i64,
    pub grade_level: i64,
    pub parallel_class: String,
    /// Required for Developer accounts; School Admins inherit their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<i64>,
}

/// Row of `GET /api/my-classes`, the wizard's class selector source.
#[derive(Debug, Clone, Deserialize)]
pub struct MyClass {
    pub id: i64,
    pub grade_level: i64,
    pub parallel_class: String,
    pub class_name: String,
    #[serde(default)]
    pub subject: Option<Subject>,
}

impl MyClass {
    /// Label matching the selector text of the web client:
    /// `<subject> - Kelas <grade><parallel>`.
    pub fn label(&self) -> String {
        match &self.subject {
            Some(subject) => format!(
                "{} - Kelas {}{}",
                subject.name, self.grade_level, self.parallel_class
            ),
            None => format!("Kelas {}{}", self.grade_level, self.parallel_class),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManagedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub school_id: Option<i64>,
    #[serde(default)]
    pub school_ids: Vec<i64>,
    #[serde(default)]
    pub school_names: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocSummary {
    pub id: i64,
    pub doc_model: String,
    pub title: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade_level: Option<Value>,
    pub document_type: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadStatus {
    pub id: i64,
    pub filename: String,
    pub status: String,
    pub uploaded_at: NaiveDateTime,
    #[serde(default)]
    pub progress: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Acknowledgement {
    #[serde(default, alias = "msg", alias = "error")]
    message: String,
}

impl ApiClient {
    pub async fn list_schools(&self) -> Result<Vec<School>> {
        self.get_json("/api/schools").await
    }

    pub async fn create_school(&self, school: &NewSchool) -> Result<School> {
        self.post_json("/api/schools", school).await
    }

    pub async fn update_school(&self, id: i64, school: &NewSchool) -> Result<School> {
        self.put_json(&format!("/api/schools/{id}"), school).await
    }

    pub async fn delete_school(&self, id: i64) -> Result<String> {
        let ack: Acknowledgement = self.delete_json(&format!("/api/schools/{id}")).await?;
        Ok(ack.message)
    }

    pub async fn list_classes(&self) -> Result<Vec<ClassSummary>> {
        self.get_json("/api/classes").await
    }

    pub async fn create_class(&self, class: &NewClass) -> Result<ClassSummary> {
        self.post_json("/api/classes", class).await
    }

    pub async fn delete_class(&self, id: i64) -> Result<String> {
        let ack: Acknowledgement = self.delete_json(&format!("/api/classes/{id}")).await?;
        Ok(ack.message)
    }

    /// Classes selectable in the wizard: all of them for a Developer, the
    /// caller's own for a Teacher.
    pub async fn my_classes(&self) -> Result<Vec<MyClass>> {
        self.get_json("/api/my-classes").await
    }

    pub async fn list_users(&self) -> Result<Vec<ManagedUser>> {
        self.get_json("/api/users").await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<String> {
        let ack: Acknowledgement = self.post_json("/api/users", user).await?;
        Ok(ack.message)
    }

    pub async fn update_user(&self, id: i64, fields: &Value) -> Result<String> {
        let ack: Acknowledgement = self.put_json(&format!("/api/users/{id}"), fields).await?;
        Ok(ack.message)
    }

    pub async fn delete_user(&self, id: i64) -> Result<String> {
        let ack: Acknowledgement = self.delete_json(&format!("/api/users/{id}")).await?;
        Ok(ack.message)
    }

    pub async fn assign_schools(&self, user_id: i64, school_ids: &[i64]) -> Result<String> {
        let body = serde_json::json!({ "school_ids": school_ids });
        let ack: Acknowledgement = self
            .put_json(&format!("/api/users/{user_id}/assign-schools"), &body)
            .await?;
        Ok(ack.message)
    }

    pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
        self.get_json("/api/subjects").await
    }

    pub async fn create_subject(&self, name: &str) -> Result<Subject> {
        let body = serde_json::json!({ "name": name });
        self.post_json("/api/subjects", &body).await
    }

    pub async fn list_docs(&self) -> Result<Vec<DocSummary>> {
        self.get_json("/api/docs").await
    }

    /// `GET /api/docs/prota/<id>` returns the stored document content
    /// directly (no envelope).
    pub async fn fetch_prota(&self, id: i64) -> Result<DocumentData> {
        self.get_json(&format!("/api/docs/prota/{id}")).await
    }

    /// `PUT /api/docs/prota/<id>` replaces the stored content. The body is
    /// the bare document content, mirroring what the GET counterpart
    /// returns.
    pub async fn update_prota(&self, id: i64, data: &DocumentData) -> Result<String> {
        let ack: Acknowledgement = self
            .put_json(&format!("/api/docs/prota/{id}"), data)
            .await?;
        Ok(ack.message)
    }

    pub async fn delete_prota(&self, id: i64) -> Result<String> {
        let ack: Acknowledgement = self.delete_json(&format!("/api/docs/prota/{id}")).await?;
        Ok(ack.message)
    }

    pub async fn upload_statuses(&self) -> Result<Vec<UploadStatus>> {
        self.get_json("/api/uploads/status").await
    }
}
