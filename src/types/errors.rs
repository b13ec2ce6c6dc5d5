use std::fmt;

use thiserror::Error;

// === MaterialAction / CategoryAction ===

/// User action on a material, used to phrase error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialAction {
    Upload,
    Download,
    View,
    Delete,
}

impl MaterialAction {
    /// Noun form used in "Could not determine the file ID for ..." messages.
    pub fn purpose(&self) -> &'static str {
        match self {
            MaterialAction::Upload => "upload",
            MaterialAction::Download => "download",
            MaterialAction::View => "viewing",
            MaterialAction::Delete => "deletion",
        }
    }
}

impl fmt::Display for MaterialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            MaterialAction::Upload => "upload",
            MaterialAction::Download => "download",
            MaterialAction::View => "view",
            MaterialAction::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Category operation delegated to the category service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryAction {
    Add,
    Update,
    Delete,
}

impl fmt::Display for CategoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            CategoryAction::Add => "add",
            CategoryAction::Update => "update",
            CategoryAction::Delete => "delete",
        };
        f.write_str(verb)
    }
}

// === ApiError ===

/// Errors returned by the remote materials API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-2xx status.
    #[error("Server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },
    /// The response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    Decode(String),
    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// The server-provided message of a status error, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

// === MaterialsError ===

/// Errors surfaced by materials view-model operations.
///
/// `Display` yields the exact text shown to the user.
#[derive(Debug, Error)]
pub enum MaterialsError {
    /// No bearer credential is available.
    #[error("You must be logged in to {0} materials.")]
    AuthMissing(MaterialAction),
    /// A required form field is missing.
    #[error("{0}")]
    Validation(String),
    /// The material's file URL does not match a known storage link shape.
    #[error("Could not determine the file ID for {}.", .action.purpose())]
    IdentifierExtraction {
        action: MaterialAction,
        file_url: String,
    },
    /// A remote call failed or returned a non-2xx status.
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: ApiError,
    },
    /// No material with the given id is in the local list.
    #[error("Material not found: {0}")]
    NotFound(String),
    /// The category service rejected an operation.
    #[error("Failed to {action} category: {message}")]
    Category {
        action: CategoryAction,
        message: String,
    },
    /// The payload could not be handed to the user.
    #[error(transparent)]
    Present(#[from] PresentError),
}

// === PresentError ===

/// Errors raised while handing a payload to the user (save-as or inline view).
#[derive(Debug, Error)]
pub enum PresentError {
    /// The presenter failed to deliver the payload.
    #[error("Failed to present file: {0}")]
    Failed(String),
}

// === GenerativeError ===

/// Errors raised by the generative-text client.
#[derive(Debug, Error)]
pub enum GenerativeError {
    /// The API answered with a non-2xx status.
    #[error("Generative API error {status}: {body}")]
    Api { status: u16, body: String },
    /// The request never produced a response.
    #[error("Generative API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The response body was not JSON.
    #[error("Generative API returned invalid JSON: {0}")]
    Decode(String),
    /// The call options are out of range.
    #[error("Invalid prompt options: {0}")]
    InvalidOptions(String),
}

// === SettingsError ===

/// Errors related to settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O operation failed.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
