use bytes::Bytes;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category sentinel for materials that belong to no user-defined category.
pub const GENERAL_CATEGORY: &str = "general";

/// Category filter value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// A single uploaded learning material as held by the view-model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Category id, or [`GENERAL_CATEGORY`].
    pub category: String,
    pub tags: Vec<String>,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub upload_date: String,
    pub last_accessed: String,
    pub bookmarked: bool,
    pub file_url: String,
}

impl Material {
    /// Returns the first `limit` tags plus a `+N more` marker when some were cut.
    pub fn tag_preview(&self, limit: usize) -> (Vec<&str>, Option<String>) {
        let shown = self.tags.iter().take(limit).map(String::as_str).collect();
        let hidden = self.tags.len().saturating_sub(limit);
        let more = (hidden > 0).then(|| format!("+{} more", hidden));
        (shown, more)
    }

    pub fn file_kind(&self) -> FileKind {
        FileKind::from_file_type(&self.file_type)
    }

    pub fn display_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// A material document as returned by the materials API.
///
/// The server is loose about nulls and number/string ids, so every field except
/// `id` tolerates absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    #[serde(deserialize_with = "de_identifier")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_identifier")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, deserialize_with = "de_file_size")]
    pub file_size: u64,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub last_accessed: Option<String>,
    #[serde(default)]
    pub bookmarked: Option<bool>,
    #[serde(default)]
    pub file_url: String,
}

impl From<MaterialRecord> for Material {
    fn from(record: MaterialRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            category: record
                .category_id
                .unwrap_or_else(|| GENERAL_CATEGORY.to_string()),
            tags: record.tags.unwrap_or_default(),
            file_name: record.file_name,
            file_size: record.file_size,
            file_type: record.file_type,
            upload_date: record.upload_date.unwrap_or_default(),
            last_accessed: record.last_accessed.unwrap_or_default(),
            bookmarked: record.bookmarked.unwrap_or(false),
            file_url: record.file_url,
        }
    }
}

/// Envelope of `GET /api/materials/documents`.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<MaterialRecord>,
}

/// Envelope of a successful `POST /api/materials/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedDocument {
    pub document: MaterialRecord,
}

fn de_opt_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("invalid identifier: {}", other))),
    }
}

fn de_identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    de_opt_identifier(deserializer)?.ok_or_else(|| de::Error::custom("identifier is null"))
}

// BIGINT columns arrive as strings from some drivers.
fn de_file_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("invalid file size: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid file size: {}", s))),
        Some(other) => Err(de::Error::custom(format!("invalid file size: {}", other))),
    }
}

/// Binary payload returned by the download and view endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePayload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// A file selected by the user for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileBlob {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Bytes,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, mime_type: Option<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes: bytes.into(),
        }
    }
}

/// Form state of the upload surface. Discarded on success or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadDraft {
    pub title: String,
    pub description: String,
    /// Selected category id, or [`GENERAL_CATEGORY`].
    pub category: String,
    /// Comma-separated tags as typed.
    pub tags: String,
    pub file: Option<FileBlob>,
}

impl Default for UploadDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: GENERAL_CATEGORY.to_string(),
            tags: String::new(),
            file: None,
        }
    }
}

impl UploadDraft {
    /// Splits the tags field on commas, trimming and dropping empties.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The category id to send, or `None` when the selection is not numeric.
    ///
    /// A selection counts as numeric when it starts with an integer, so
    /// `"12"` and `"7b"` pass through while `"general"` does not.
    pub fn category_id(&self) -> Option<String> {
        let trimmed = self.category.trim_start();
        let unsigned = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('+'))
            .unwrap_or(trimmed);
        unsigned
            .starts_with(|c: char| c.is_ascii_digit())
            .then(|| self.category.clone())
    }
}

/// Category part of the material filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Parses a filter selection, where `"all"` disables the filter.
    pub fn from_selection(selection: &str) -> Self {
        if selection == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(selection.to_string())
        }
    }

    pub fn as_selection(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(id) => id,
        }
    }
}

/// Active filter of the materials view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFilter {
    pub category: CategoryFilter,
    pub search_term: String,
    pub bookmarked_only: bool,
}

impl MaterialFilter {
    /// Category, search and bookmark predicates, all of which must hold.
    pub fn matches(&self, material: &Material) -> bool {
        self.matches_category(material)
            && self.matches_search(material)
            && (!self.bookmarked_only || material.bookmarked)
    }

    fn matches_category(&self, material: &Material) -> bool {
        match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(id) => material.category == *id,
        }
    }

    fn matches_search(&self, material: &Material) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

        contains(&material.title)
            || material.description.as_deref().is_some_and(contains)
            || material.tags.iter().any(|tag| contains(tag))
    }
}

/// Layout of the materials list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

/// Coarse file classification used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Video,
    Image,
    Audio,
    Archive,
    Other,
}

impl FileKind {
    pub fn from_file_type(file_type: &str) -> Self {
        if file_type.contains("pdf") {
            FileKind::Pdf
        } else if file_type.contains("video") {
            FileKind::Video
        } else if file_type.contains("image") {
            FileKind::Image
        } else if file_type.contains("audio") {
            FileKind::Audio
        } else if file_type.contains("zip") || file_type.contains("rar") {
            FileKind::Archive
        } else {
            FileKind::Other
        }
    }
}

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Formats a byte count with base-1024 units and at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let fixed = format!("{:.2}", scaled);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}
