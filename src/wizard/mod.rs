//! Generation wizard: a small state machine over the progress stream.
//!
//! Phases: Idle → Selecting → Generating → Succeeded | Failed. A restart
//! goes back through Generating and discards the previous outcome. The
//! controller is pure state; [`run_generation`] drives it over a live
//! stream and owns the single-open-stream guarantee.

use crate::api::{ApiClient, MyClass};
use crate::document::GeneratedDocument;
use crate::error::{Error, Result};
use crate::stream::{EventStream, ProgressEvent, StreamEnd};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const CLASS_FETCH_ERROR: &str = "Tidak dapat mengambil daftar kelas Anda.";

/// Wrap a class-list failure in the message the wizard shows; the
/// underlying cause is kept for logs and verbose output.
pub fn class_fetch_failure(error: Error) -> Error {
    Error::Api(format!("{CLASS_FETCH_ERROR} ({error})"))
}

/// Classes selectable for generation. When this fails there is nothing to
/// select, so generation stays unreachable.
pub async fn fetch_classes(client: &ApiClient) -> Result<Vec<MyClass>> {
    client.my_classes().await.map_err(class_fetch_failure)
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardPhase {
    Idle,
    Selecting,
    Generating { percent: u8, status: String },
    Succeeded,
    Failed { message: String },
}

#[derive(Debug)]
pub struct WizardController {
    phase: WizardPhase,
    selected_class: Option<i64>,
    document: Option<GeneratedDocument>,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            phase: WizardPhase::Idle,
            selected_class: None,
            document: None,
        }
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn selected_class(&self) -> Option<i64> {
        self.selected_class
    }

    pub fn document(&self) -> Option<&GeneratedDocument> {
        self.document.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.phase(), WizardPhase::Generating { .. })
    }

    /// Choose (or replace) the class. Not allowed while a stream is open.
    pub fn select_class(&mut self, class_id: i64) -> Result<()> {
        if self.is_generating() {
            return Err(Error::Validation(
                "Cannot change class while generation is running".to_string(),
            ));
        }
        self.selected_class = Some(class_id);
        self.phase = WizardPhase::Selecting;
        Ok(())
    }

    /// Enter Generating. Requires a selection; a second call while already
    /// Generating is a no-op. Restarting from a terminal phase discards the
    /// previous outcome.
    pub fn start_generation(&mut self) -> Result<i64> {
        let class_id = self.selected_class.ok_or_else(|| {
            Error::Validation("Silakan pilih kelas terlebih dahulu.".to_string())
        })?;
        if self.is_generating() {
            return Ok(class_id);
        }
        self.document = None;
        self.phase = WizardPhase::Generating {
            percent: 0,
            status: String::new(),
        };
        debug!("Wizard entering Generating for class {class_id}");
        Ok(class_id)
    }

    /// Apply one stream event. Ignored unless Generating, so nothing can
    /// mutate the wizard after cancellation or a terminal event.
    pub fn apply_event(&mut self, event: &ProgressEvent) {
        if !self.is_generating() {
            return;
        }
        if event.error {
            self.phase = WizardPhase::Failed {
                message: event.status.clone(),
            };
            return;
        }
        if event.is_terminal() {
            self.document = event.result.clone();
            self.phase = WizardPhase::Succeeded;
            return;
        }
        self.phase = WizardPhase::Generating {
            percent: event.progress.min(99),
            status: event.status.clone(),
        };
    }

    /// Cooperative cancel: back to Selecting, no partial result kept.
    pub fn cancel(&mut self) {
        if self.is_generating() {
            self.document = None;
            self.phase = WizardPhase::Selecting;
        }
    }

    fn fail(&mut self, message: String) {
        self.phase = WizardPhase::Failed { message };
    }
}

/// Drive one generation to its end. Exactly one stream is opened; the
/// progress callback sees percent/status for every non-terminal event.
pub async fn run_generation<F>(
    client: &ApiClient,
    controller: &mut WizardController,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> Result<GeneratedDocument>
where
    F: FnMut(u8, &str),
{
    let class_id = controller.start_generation()?;

    let end = EventStream::run(client, class_id, cancel, |event| {
        controller.apply_event(event);
        if let WizardPhase::Generating { percent, status } = controller.phase() {
            on_progress(*percent, status);
        }
    })
    .await;

    match end {
        Ok(StreamEnd::Completed(document)) => {
            debug!("Generation completed: {}", document.msg);
            Ok(*document)
        }
        Ok(StreamEnd::Failed(message)) => Err(Error::Generation(message)),
        Ok(StreamEnd::Cancelled) => {
            controller.cancel();
            Err(Error::Generation("Dibatalkan.".to_string()))
        }
        Ok(StreamEnd::Closed) => {
            let message = "Server menutup koneksi sebelum dokumen selesai.".to_string();
            controller.fail(message.clone());
            Err(Error::Generation(message))
        }
        Err(e) => {
            controller.fail(e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::parse_event;

    fn progress(progress: u8, status: &str) -> ProgressEvent {
        parse_event(&format!(
            r#"{{"progress": {progress}, "status": "{status}"}}"#
        ))
        .unwrap()
    }

    #[test]
    fn class_fetch_failure_wraps_cause_in_wizard_message() {
        let err = class_fetch_failure(Error::Network("connection refused".to_string()));
        let text = err.to_string();
        assert!(text.contains("Tidak dapat mengambil daftar kelas Anda."));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn starts_idle_without_selection() {
        let controller = WizardController::new();
        assert_eq!(*controller.phase(), WizardPhase::Idle);
        assert!(controller.selected_class().is_none());
    }

    #[test]
    fn generation_requires_a_selected_class() {
        let mut controller = WizardController::new();
        assert!(matches!(
            controller.start_generation(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn select_then_start_enters_generating() {
        let mut controller = WizardController::new();
        controller.select_class(12).unwrap();
        assert_eq!(*controller.phase(), WizardPhase::Selecting);
        assert_eq!(controller.start_generation().unwrap(), 12);
        assert!(controller.is_generating());
    }

    #[test]
    fn start_while_generating_is_a_noop() {
        let mut controller = WizardController::new();
        controller.select_class(3).unwrap();
        controller.start_generation().unwrap();
        controller.apply_event(&progress(40, "menyusun unit"));
        assert_eq!(controller.start_generation().unwrap(), 3);
        assert_eq!(
            *controller.phase(),
            WizardPhase::Generating {
                percent: 40,
                status: "menyusun unit".to_string()
            }
        );
    }

    #[test]
    fn progress_events_mirror_percent_and_keep_generating() {
        let mut controller = WizardController::new();
        controller.select_class(1).unwrap();
        controller.start_generation().unwrap();
        for pct in [0u8, 25, 50, 99] {
            controller.apply_event(&progress(pct, "bekerja"));
            match controller.phase() {
                WizardPhase::Generating { percent, .. } => assert_eq!(*percent, pct),
                other => panic!("unexpected phase {other:?}"),
            }
        }
    }

    #[test]
    fn error_event_fails_with_verbatim_message() {
        let mut controller = WizardController::new();
        controller.select_class(1).unwrap();
        controller.start_generation().unwrap();
        let event = parse_event(r#"{"error": true, "status": "Quota exceeded"}"#).unwrap();
        controller.apply_event(&event);
        assert_eq!(
            *controller.phase(),
            WizardPhase::Failed {
                message: "Quota exceeded".to_string()
            }
        );
        assert!(controller.document().is_none());
    }

    #[test]
    fn terminal_success_captures_result() {
        let mut controller = WizardController::new();
        controller.select_class(1).unwrap();
        controller.start_generation().unwrap();
        let event = parse_event(
            r#"{"progress": 100, "status": "selesai", "result": {"data": {"document_structure": {"Judul": "X"}, "items": []}, "msg": "Berhasil"}}"#,
        )
        .unwrap();
        controller.apply_event(&event);
        assert_eq!(*controller.phase(), WizardPhase::Succeeded);
        assert_eq!(controller.document().unwrap().title(), "X");
    }

    #[test]
    fn events_after_cancel_are_ignored() {
        let mut controller = WizardController::new();
        controller.select_class(1).unwrap();
        controller.start_generation().unwrap();
        controller.apply_event(&progress(30, "bekerja"));
        controller.cancel();
        assert_eq!(*controller.phase(), WizardPhase::Selecting);

        // a zombie update arriving after cancellation changes nothing
        controller.apply_event(&progress(60, "bekerja"));
        assert_eq!(*controller.phase(), WizardPhase::Selecting);
        assert!(controller.document().is_none());
    }

    #[test]
    fn restart_after_failure_discards_outcome() {
        let mut controller = WizardController::new();
        controller.select_class(1).unwrap();
        controller.start_generation().unwrap();
        let event = parse_event(r#"{"error": true, "status": "gagal"}"#).unwrap();
        controller.apply_event(&event);
        assert!(matches!(controller.phase(), WizardPhase::Failed { .. }));

        controller.start_generation().unwrap();
        assert!(controller.is_generating());
        assert!(controller.document().is_none());
    }
}
