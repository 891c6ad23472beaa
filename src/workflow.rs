//! Upload workflow state machine.
//!
//! The controller is the only owner of [`WorkflowState`]. It never performs
//! I/O itself: accepting a file hands it back to the caller, which starts the
//! transmission and later feeds the tagged outcome into [`WorkflowController::resolve`].

use serde_json::Value;
use uuid::Uuid;

use crate::{
    pending::PendingFile,
    transmit::TransmissionResult,
    validate::{self, ValidationOutcome},
};

/// Message for a file the service could not inspect.
pub const UNREADABLE_MESSAGE: &str = "ffprobe could not inspect the file";
/// Message for every other transmission failure.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "There is a problem with the server. Please try again later.";

/// Where the current upload stands. Exactly one is active.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowState {
    Idle,
    /// Transient; left synchronously by validation.
    FileSelected(PendingFile),
    Rejected(PendingFile, String),
    Transmitting(PendingFile),
    ReportReady(Value),
    TransmissionFailed(String),
}

/// Owns the workflow state and applies the allowed transitions.
#[derive(Debug)]
pub struct WorkflowController {
    state: WorkflowState,
    ceiling: u64,
}

impl WorkflowController {
    pub fn new(ceiling: u64) -> Self {
        Self {
            state: WorkflowState::Idle,
            ceiling,
        }
    }

    /// Read-only view for rendering.
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Replace whatever is in progress with a new selection and validate it.
    ///
    /// Returns the file to transmit when it passes validation. Any earlier
    /// transmission becomes stale at this point.
    pub fn select_file(&mut self, file: PendingFile) -> Option<PendingFile> {
        if let WorkflowState::Transmitting(prev) = &self.state {
            tracing::info!("selection {} supersedes in-flight {}", file.id, prev.id);
        }
        tracing::info!("file selected: {} ({} bytes)", file.name, file.size);
        self.state = WorkflowState::FileSelected(file);
        self.run_validation()
    }

    /// Leave `FileSelected` right away, one way or the other.
    fn run_validation(&mut self) -> Option<PendingFile> {
        let file = match std::mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::FileSelected(file) => file,
            other => {
                self.state = other;
                return None;
            }
        };
        match validate::validate_with_ceiling(file.size, self.ceiling) {
            ValidationOutcome::Accepted => {
                self.state = WorkflowState::Transmitting(file.clone());
                Some(file)
            }
            ValidationOutcome::Rejected(reason) => {
                tracing::warn!("rejected {}: {reason}", file.name);
                self.state = WorkflowState::Rejected(file, reason);
                None
            }
        }
    }

    /// Apply a transmission outcome if it belongs to the active file.
    ///
    /// Returns false when the outcome was stale and got discarded.
    pub fn resolve(&mut self, file_id: Uuid, result: TransmissionResult) -> bool {
        let active = match &self.state {
            WorkflowState::Transmitting(f) => f.id == file_id,
            _ => false,
        };
        if !active {
            tracing::debug!("discarding stale result for {file_id}");
            return false;
        }
        self.state = match result {
            TransmissionResult::Report(doc) => {
                tracing::info!("report ready for {file_id}");
                WorkflowState::ReportReady(doc)
            }
            TransmissionResult::Unreadable => {
                WorkflowState::TransmissionFailed(UNREADABLE_MESSAGE.into())
            }
            TransmissionResult::TransportFailure => {
                WorkflowState::TransmissionFailed(TRANSPORT_FAILURE_MESSAGE.into())
            }
        };
        true
    }

    /// Close a finished cycle and go back to idle.
    pub fn dismiss(&mut self) {
        match self.state {
            WorkflowState::ReportReady(_)
            | WorkflowState::Rejected(..)
            | WorkflowState::TransmissionFailed(_) => {
                tracing::info!("workflow reset");
                self.state = WorkflowState::Idle;
            }
            WorkflowState::Idle
            | WorkflowState::FileSelected(_)
            | WorkflowState::Transmitting(_) => {}
        }
    }

    /// The picker is locked while a selection is being processed.
    pub fn picker_enabled(&self) -> bool {
        !matches!(
            self.state,
            WorkflowState::FileSelected(_) | WorkflowState::Transmitting(_)
        )
    }

    /// File tied to the current cycle, if still known.
    pub fn pending_file(&self) -> Option<&PendingFile> {
        match &self.state {
            WorkflowState::FileSelected(f)
            | WorkflowState::Rejected(f, _)
            | WorkflowState::Transmitting(f) => Some(f),
            _ => None,
        }
    }

    /// Inline error to show in place of the progress indicator.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Rejected(_, reason) | WorkflowState::TransmissionFailed(reason) => {
                Some(reason.as_str())
            }
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&Value> {
        match &self.state {
            WorkflowState::ReportReady(doc) => Some(doc),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::MAX_FILE_SIZE;
    use serde_json::json;

    fn file(size: u64) -> PendingFile {
        PendingFile::new("song.mp3".into(), size, "song.mp3".into())
    }

    fn controller() -> WorkflowController {
        WorkflowController::new(MAX_FILE_SIZE)
    }

    #[test]
    fn test_starts_idle_with_picker_enabled() {
        let c = controller();
        assert_eq!(c.state(), &WorkflowState::Idle);
        assert!(c.picker_enabled());
        assert!(c.pending_file().is_none());
    }

    #[test]
    fn test_oversize_never_requests_transmission() {
        let mut c = controller();
        let f = file(30_000_001);
        assert!(c.select_file(f.clone()).is_none());
        assert_eq!(
            c.state(),
            &WorkflowState::Rejected(f, "File size is too big".into())
        );
        assert_eq!(c.error_message(), Some("File size is too big"));
        assert!(c.picker_enabled());
    }

    #[test]
    fn test_accepted_file_moves_to_transmitting() {
        let mut c = controller();
        let f = file(1_000);
        let to_send = c.select_file(f.clone()).unwrap();
        assert_eq!(to_send.id, f.id);
        assert_eq!(c.state(), &WorkflowState::Transmitting(f));
        assert!(!c.picker_enabled());
    }

    #[test]
    fn test_unreadable_message_is_verbatim() {
        let mut c = controller();
        let f = c.select_file(file(1_000)).unwrap();
        assert!(c.resolve(f.id, TransmissionResult::Unreadable));
        assert_eq!(c.error_message(), Some("ffprobe could not inspect the file"));
    }

    #[test]
    fn test_transport_failure_message_is_verbatim() {
        let mut c = controller();
        let f = c.select_file(file(1_000)).unwrap();
        assert!(c.resolve(f.id, TransmissionResult::TransportFailure));
        assert_eq!(
            c.state(),
            &WorkflowState::TransmissionFailed(
                "There is a problem with the server. Please try again later.".into()
            )
        );
    }

    #[test]
    fn test_report_then_dismiss_returns_to_idle() {
        let mut c = controller();
        let f = c.select_file(file(1_000)).unwrap();
        let doc = json!({"format": {"duration": "12.3"}});
        assert!(c.resolve(f.id, TransmissionResult::Report(doc.clone())));
        assert_eq!(c.report(), Some(&doc));

        c.dismiss();
        assert_eq!(c.state(), &WorkflowState::Idle);
        assert!(c.pending_file().is_none());
        assert!(c.report().is_none());
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut c = controller();
        let first = c.select_file(file(1_000)).unwrap();
        let second = c.select_file(file(2_000)).unwrap();

        // The first upload answers late.
        assert!(!c.resolve(first.id, TransmissionResult::Report(json!({"a": 1}))));
        assert_eq!(c.state(), &WorkflowState::Transmitting(second.clone()));

        assert!(c.resolve(second.id, TransmissionResult::Unreadable));
        assert_eq!(c.error_message(), Some(UNREADABLE_MESSAGE));
    }

    #[test]
    fn test_result_after_reset_is_discarded() {
        let mut c = controller();
        let f = c.select_file(file(1_000)).unwrap();
        assert!(c.resolve(f.id, TransmissionResult::TransportFailure));
        c.dismiss();
        assert!(!c.resolve(f.id, TransmissionResult::Unreadable));
        assert_eq!(c.state(), &WorkflowState::Idle);
    }

    #[test]
    fn test_new_selection_recovers_from_error() {
        let mut c = controller();
        assert!(c.select_file(file(40_000_000)).is_none());
        let f = file(5);
        assert!(c.select_file(f.clone()).is_some());
        assert_eq!(c.state(), &WorkflowState::Transmitting(f));
    }

    #[test]
    fn test_dismiss_ignored_while_transmitting() {
        let mut c = controller();
        let f = c.select_file(file(1_000)).unwrap();
        c.dismiss();
        assert_eq!(c.state(), &WorkflowState::Transmitting(f));
    }

    #[test]
    fn test_ceiling_boundary_is_inclusive() {
        let mut c = controller();
        assert!(c.select_file(file(30_000_000)).is_some());
    }
}
