//! # GuruDesk CLI
//!
//! Command-line client for the GuruDesk curriculum platform. Covers
//! authentication, school/class/user/subject administration, document
//! uploads, and the Prota generation wizard that follows a server-sent
//! progress stream and exports the result to PDF or DOCX.
//!
//! ## Modules
//!
//! - `api` - REST client for the platform backend (CRUD + multipart uploads)
//! - `config` - Client configuration (API base URL, config directory)
//! - `document` - Generated-document model and the display table renderer
//! - `export` - PDF and DOCX formatters for generated documents
//! - `session` - Bearer-token session with explicit login/logout lifecycle
//! - `stream` - Incremental SSE decoder and the progress event stream
//! - `wizard` - Generation wizard state machine and stream driver
pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod session;
pub mod stream;
pub mod wizard;

pub use error::{Error, Result};
