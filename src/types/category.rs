use serde::{Deserialize, Serialize};

/// Default color for newly created categories.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// Default icon for newly created categories.
pub const DEFAULT_CATEGORY_ICON: &str = "FileText";

/// A user-defined material category, owned by the category service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Fields sent to the category service on create or update.
/// `None` leaves a field untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Outcome reported by the category service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub success: bool,
    pub error: Option<String>,
}

impl CategoryResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Editor state of the category manager surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub color: String,
    /// Id of the category whose inline editor is open.
    pub editing: Option<String>,
}

impl Default for CategoryDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: DEFAULT_CATEGORY_COLOR.to_string(),
            editing: None,
        }
    }
}
