//! User-facing side effects of the materials view.
//!
//! The view-model never talks to a UI toolkit directly: confirmations and
//! notices go through [`UserInteraction`], file hand-off goes through
//! [`Presenter`]. The recording implementations back the RPC bridge, which
//! ships both to the desktop shell with each response.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use serde::Serialize;

use crate::managers::object_url_registry::ObjectUrl;
use crate::types::errors::PresentError;
use crate::types::notice::Notice;

/// Interactive confirmation and blocking notifications.
pub trait UserInteraction: Send + Sync {
    /// Asks the user to confirm a destructive action.
    fn confirm(&self, message: &str) -> bool;
    /// Shows a blocking notice.
    fn notify(&self, notice: Notice);
}

/// Hands downloaded payloads to the user.
pub trait Presenter: Send + Sync {
    /// Triggers a save-as of the object under `file_name`.
    fn save_as(&self, object: &ObjectUrl, file_name: &str) -> Result<(), PresentError>;
    /// Opens the object in a new browsing context.
    fn open_in_new_context(&self, object: &ObjectUrl) -> Result<(), PresentError>;
}

/// Records notices and answers confirmations with a preset value.
#[derive(Debug)]
pub struct RecordingInteraction {
    confirm_answer: AtomicBool,
    prompts: Mutex<Vec<String>>,
    notices: Mutex<Vec<Notice>>,
}

impl RecordingInteraction {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            confirm_answer: AtomicBool::new(confirm_answer),
            prompts: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    /// Sets the answer given to subsequent confirmations.
    pub fn set_confirm_answer(&self, answer: bool) {
        self.confirm_answer.store(answer, Ordering::SeqCst);
    }

    /// Confirmation prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Notices shown so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Removes and returns all recorded notices.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut n| std::mem::take(&mut *n))
            .unwrap_or_default()
    }
}

impl Default for RecordingInteraction {
    fn default() -> Self {
        Self::new(true)
    }
}

impl UserInteraction for RecordingInteraction {
    fn confirm(&self, message: &str) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(message.to_string());
        }
        self.confirm_answer.load(Ordering::SeqCst)
    }

    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

/// How a captured payload was presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PresentMode {
    SaveAs { file_name: String },
    Inline,
}

/// A payload handed to the user, as captured by [`CapturePresenter`].
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedFile {
    pub mode: PresentMode,
    pub object_url: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Captures presented payloads so a shell can deliver them later.
#[derive(Debug, Default)]
pub struct CapturePresenter {
    presented: Mutex<Vec<PresentedFile>>,
}

impl CapturePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all captured payloads.
    pub fn take_presented(&self) -> Vec<PresentedFile> {
        self.presented
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }

    fn capture(&self, object: &ObjectUrl, mode: PresentMode) -> Result<(), PresentError> {
        let mut presented = self
            .presented
            .lock()
            .map_err(|e| PresentError::Failed(e.to_string()))?;
        presented.push(PresentedFile {
            mode,
            object_url: object.url.clone(),
            content_type: object.content_type.clone(),
            bytes: object.bytes.clone(),
        });
        Ok(())
    }
}

impl Presenter for CapturePresenter {
    fn save_as(&self, object: &ObjectUrl, file_name: &str) -> Result<(), PresentError> {
        self.capture(
            object,
            PresentMode::SaveAs {
                file_name: file_name.to_string(),
            },
        )
    }

    fn open_in_new_context(&self, object: &ObjectUrl) -> Result<(), PresentError> {
        self.capture(object, PresentMode::Inline)
    }
}
