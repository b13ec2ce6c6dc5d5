//! Materials Manager for learnshelf.
//!
//! The view-model behind the "My Learning Materials" view. Owns the in-memory
//! material list, the filter and surface state, and the upload and category
//! drafts. Upload and delete round-trip through the materials API before the
//! list changes; bookmark toggles and last-accessed touches are local only
//! and are lost on the next fetch.
//!
//! View state sits behind a short-lived lock that is never held across a
//! remote call, so a hung request stalls only the operation that issued it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info, warn};

use crate::managers::object_url_registry::ObjectUrlRegistry;
use crate::services::category_service::CategoryServiceTrait;
use crate::services::drive_link::extract_file_id;
use crate::services::interaction::{Presenter, UserInteraction};
use crate::services::materials_api::{MaterialsApiTrait, UploadForm};
use crate::services::session_store::CredentialProvider;
use crate::types::category::{Category, CategoryDraft, CategoryPayload, DEFAULT_CATEGORY_ICON};
use crate::types::errors::{ApiError, CategoryAction, MaterialAction, MaterialsError};
use crate::types::material::{
    CategoryFilter, FileBlob, Material, MaterialFilter, UploadDraft, ViewMode, GENERAL_CATEGORY,
};
use crate::types::notice::Notice;

/// How long an inline-viewed object URL stays alive.
pub const VIEW_RELEASE_DELAY: Duration = Duration::from_secs(10);

const MISSING_UPLOAD_FIELDS: &str = "Please provide a title and select a file";
const CONFIRM_DELETE_MATERIAL: &str = "Are you sure you want to delete this material?";
const CONFIRM_DELETE_CATEGORY: &str =
    "Are you sure you want to delete this category? Materials will be moved to General.";
const GENERAL_IS_PROTECTED: &str = "the General category cannot be deleted";

/// Open/closed state of the view's surfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceState {
    pub view_mode: ViewMode,
    pub upload_open: bool,
    pub category_manager_open: bool,
    pub viewer_open: bool,
    pub selected: Option<String>,
}

/// Trait defining materials view-model operations.
///
/// Every operation takes `&self`; a manager is meant to be shared behind an
/// `Arc` by concurrent callers. Accessors return snapshots.
#[async_trait]
pub trait MaterialsManagerTrait {
    /// Fetches the list once; later calls are no-ops.
    async fn activate(&self);
    /// Re-fetches the list, replacing local state on success.
    async fn refresh(&self) -> Result<usize, MaterialsError>;
    fn materials(&self) -> Vec<Material>;
    fn get_material(&self, id: &str) -> Option<Material>;
    fn visible_materials(&self) -> Vec<Material>;
    fn is_empty_state(&self) -> bool;
    fn materials_in_category(&self, category_id: &str) -> usize;
    /// Number of materials per category id, for categories in use.
    fn category_counts(&self) -> HashMap<String, usize>;

    fn filter(&self) -> MaterialFilter;
    fn set_search_term(&self, term: &str);
    fn set_category_filter(&self, selection: &str);
    fn set_bookmarked_only(&self, bookmarked_only: bool);
    fn toggle_bookmarked_only(&self) -> bool;

    fn surfaces(&self) -> SurfaceState;
    fn set_view_mode(&self, mode: ViewMode);
    fn selected_material(&self) -> Option<Material>;
    fn close_viewer(&self);

    fn open_upload(&self);
    fn cancel_upload(&self);
    fn draft(&self) -> UploadDraft;
    fn edit_draft(&self, edit: &mut dyn FnMut(&mut UploadDraft));
    fn attach_file(&self, file: FileBlob);
    async fn submit_upload(&self) -> Result<Material, MaterialsError>;

    async fn download(&self, id: &str) -> Result<(), MaterialsError>;
    async fn open_material(&self, id: &str) -> Result<(), MaterialsError>;
    /// Returns `Ok(false)` when the user declines the confirmation.
    async fn delete_material(&self, id: &str) -> Result<bool, MaterialsError>;
    fn toggle_bookmark(&self, id: &str) -> Option<bool>;

    async fn categories(&self) -> Vec<Category>;
    fn open_category_manager(&self);
    fn close_category_manager(&self);
    fn category_draft(&self) -> CategoryDraft;
    fn edit_category_draft(&self, edit: &mut dyn FnMut(&mut CategoryDraft));
    fn start_editing_category(&self, id: Option<&str>);
    /// Returns `Ok(false)` when the draft name is blank.
    async fn add_category(&self) -> Result<bool, MaterialsError>;
    async fn update_category(&self, id: &str, name: &str, color: &str) -> Result<(), MaterialsError>;
    /// Returns `Ok(false)` when the user declines the confirmation.
    async fn delete_category(&self, id: &str) -> Result<bool, MaterialsError>;

    /// Releases every object URL still alive, including pending viewer URLs.
    fn teardown(&self) -> usize;
}

#[derive(Debug, Default)]
struct ViewState {
    materials: Vec<Material>,
    filter: MaterialFilter,
    surfaces: SurfaceState,
    draft: UploadDraft,
    category_draft: CategoryDraft,
    activated: bool,
}

impl ViewState {
    fn find_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.iter_mut().find(|m| m.id == id)
    }

    fn reassign_category(&mut self, from: &str, to: &str) -> usize {
        let mut touched = 0;
        for material in self.materials.iter_mut().filter(|m| m.category == from) {
            material.category = to.to_string();
            touched += 1;
        }
        touched
    }

    fn close_viewer(&mut self) {
        self.surfaces.viewer_open = false;
        self.surfaces.selected = None;
    }
}

/// Materials view-model over injected API, credential, category and UI seams.
pub struct MaterialsManager {
    api: RwLock<Arc<dyn MaterialsApiTrait>>,
    credentials: Arc<dyn CredentialProvider>,
    category_service: Arc<dyn CategoryServiceTrait>,
    interaction: Arc<dyn UserInteraction>,
    presenter: Arc<dyn Presenter>,
    object_urls: ObjectUrlRegistry,
    state: Mutex<ViewState>,
}

impl MaterialsManager {
    pub fn new(
        api: Arc<dyn MaterialsApiTrait>,
        credentials: Arc<dyn CredentialProvider>,
        category_service: Arc<dyn CategoryServiceTrait>,
        interaction: Arc<dyn UserInteraction>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            api: RwLock::new(api),
            credentials,
            category_service,
            interaction,
            presenter,
            object_urls: ObjectUrlRegistry::new(),
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Registry of object URLs created for downloads and inline views.
    pub fn object_urls(&self) -> &ObjectUrlRegistry {
        &self.object_urls
    }

    /// Points later remote calls at `api`. Calls already in flight finish
    /// against the previous client.
    pub fn replace_api(&self, api: Arc<dyn MaterialsApiTrait>) {
        *self.api.write().unwrap_or_else(PoisonError::into_inner) = api;
    }

    fn api(&self) -> Arc<dyn MaterialsApiTrait> {
        self.api
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Locks view state. Callers must drop the guard before any `.await`.
    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now_iso() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Notifies the user of `err` and hands it back for `?`/`Err` returns.
    fn surface(&self, err: MaterialsError) -> MaterialsError {
        self.interaction.notify(Notice::error(err.to_string()));
        err
    }

    /// Returns the bearer token, or surfaces `AuthMissing` for `action`.
    fn require_token(&self, action: MaterialAction) -> Result<String, MaterialsError> {
        self.credentials.bearer_token().ok_or_else(|| {
            warn!(%action, "no bearer credential");
            let err = MaterialsError::AuthMissing(action);
            self.interaction.notify(Notice::warning(err.to_string()));
            err
        })
    }

    fn lookup(&self, id: &str) -> Result<Material, MaterialsError> {
        let found = self.state().materials.iter().find(|m| m.id == id).cloned();
        found.ok_or_else(|| self.surface(MaterialsError::NotFound(id.to_string())))
    }

    fn file_id_for(&self, material: &Material, action: MaterialAction) -> Result<String, MaterialsError> {
        match extract_file_id(&material.file_url) {
            Some(file_id) => Ok(file_id.to_string()),
            None => {
                error!(file_url = %material.file_url, "could not parse file ID from URL");
                Err(self.surface(MaterialsError::IdentifierExtraction {
                    action,
                    file_url: material.file_url.clone(),
                }))
            }
        }
    }

    fn network_error(&self, message: impl Into<String>, source: ApiError) -> MaterialsError {
        self.surface(MaterialsError::Network {
            message: message.into(),
            source,
        })
    }

    fn category_failure(&self, action: CategoryAction, message: impl Into<String>) -> MaterialsError {
        self.surface(MaterialsError::Category {
            action,
            message: message.into(),
        })
    }
}

#[async_trait]
impl MaterialsManagerTrait for MaterialsManager {
    async fn activate(&self) {
        {
            let mut state = self.state();
            if state.activated {
                return;
            }
            state.activated = true;
        }
        match self.refresh().await {
            Ok(count) => info!(count, "materials loaded"),
            Err(MaterialsError::AuthMissing(_)) => {
                warn!("no auth token found, user must be logged in to see materials")
            }
            Err(e) => error!(error = %e, "error fetching materials"),
        }
    }

    async fn refresh(&self) -> Result<usize, MaterialsError> {
        let token = self
            .credentials
            .bearer_token()
            .ok_or(MaterialsError::AuthMissing(MaterialAction::View))?;

        let records = self
            .api()
            .list_documents(&token)
            .await
            .map_err(|source| MaterialsError::Network {
                message: "Failed to fetch materials".to_string(),
                source,
            })?;

        let mut state = self.state();
        state.materials = records.into_iter().map(Material::from).collect();
        Ok(state.materials.len())
    }

    fn materials(&self) -> Vec<Material> {
        self.state().materials.clone()
    }

    fn get_material(&self, id: &str) -> Option<Material> {
        self.state().materials.iter().find(|m| m.id == id).cloned()
    }

    fn visible_materials(&self) -> Vec<Material> {
        let state = self.state();
        state
            .materials
            .iter()
            .filter(|m| state.filter.matches(m))
            .cloned()
            .collect()
    }

    fn is_empty_state(&self) -> bool {
        let state = self.state();
        !state.materials.iter().any(|m| state.filter.matches(m))
    }

    fn materials_in_category(&self, category_id: &str) -> usize {
        self.state()
            .materials
            .iter()
            .filter(|m| m.category == category_id)
            .count()
    }

    fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for material in self.state().materials.iter() {
            *counts.entry(material.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn filter(&self) -> MaterialFilter {
        self.state().filter.clone()
    }

    fn set_search_term(&self, term: &str) {
        self.state().filter.search_term = term.to_string();
    }

    fn set_category_filter(&self, selection: &str) {
        self.state().filter.category = CategoryFilter::from_selection(selection);
    }

    fn set_bookmarked_only(&self, bookmarked_only: bool) {
        self.state().filter.bookmarked_only = bookmarked_only;
    }

    fn toggle_bookmarked_only(&self) -> bool {
        let mut state = self.state();
        state.filter.bookmarked_only = !state.filter.bookmarked_only;
        state.filter.bookmarked_only
    }

    fn surfaces(&self) -> SurfaceState {
        self.state().surfaces.clone()
    }

    fn set_view_mode(&self, mode: ViewMode) {
        self.state().surfaces.view_mode = mode;
    }

    fn selected_material(&self) -> Option<Material> {
        let state = self.state();
        let id = state.surfaces.selected.as_deref()?;
        state.materials.iter().find(|m| m.id == id).cloned()
    }

    fn close_viewer(&self) {
        self.state().close_viewer();
    }

    fn open_upload(&self) {
        self.state().surfaces.upload_open = true;
    }

    fn cancel_upload(&self) {
        let mut state = self.state();
        state.surfaces.upload_open = false;
        state.draft = UploadDraft::default();
    }

    fn draft(&self) -> UploadDraft {
        self.state().draft.clone()
    }

    fn edit_draft(&self, edit: &mut dyn FnMut(&mut UploadDraft)) {
        edit(&mut self.state().draft);
    }

    fn attach_file(&self, file: FileBlob) {
        self.state().draft.file = Some(file);
    }

    async fn submit_upload(&self) -> Result<Material, MaterialsError> {
        let form = UploadForm::from_draft(&self.state().draft);
        let form = match form {
            Some(form) if !form.title.is_empty() => form,
            _ => {
                return Err(self.surface(MaterialsError::Validation(
                    MISSING_UPLOAD_FIELDS.to_string(),
                )))
            }
        };
        let token = self.require_token(MaterialAction::Upload)?;

        let record = match self.api().upload(&token, form).await {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "upload error");
                let reason = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| match &e {
                        ApiError::Status { .. } => "Failed to upload material".to_string(),
                        other => other.to_string(),
                    });
                return Err(self.network_error(format!("Upload failed: {}", reason), e));
            }
        };

        let material = Material::from(record);
        debug!(id = %material.id, "material uploaded");
        {
            let mut state = self.state();
            state.materials.insert(0, material.clone());
            state.draft = UploadDraft::default();
            state.surfaces.upload_open = false;
        }
        self.interaction
            .notify(Notice::info("Material uploaded successfully!"));
        Ok(material)
    }

    async fn download(&self, id: &str) -> Result<(), MaterialsError> {
        let token = self.require_token(MaterialAction::Download)?;
        let material = self.lookup(id)?;
        let file_id = self.file_id_for(&material, MaterialAction::Download)?;

        let payload = self.api().download(&token, &file_id).await.map_err(|e| {
            error!(error = %e, %file_id, "download error");
            self.network_error("File download failed", e)
        })?;

        let object = self.object_urls.create(payload.bytes, payload.content_type);
        let presented = self.presenter.save_as(&object, &material.file_name);
        self.object_urls.revoke(&object.url);
        presented.map_err(|e| self.surface(e.into()))
    }

    async fn open_material(&self, id: &str) -> Result<(), MaterialsError> {
        let now = Self::now_iso();
        let touched = {
            let mut state = self.state();
            let touched = state.find_mut(id).map(|material| {
                // Local only; not rolled back if the fetch below fails.
                material.last_accessed = now;
                material.clone()
            });
            if let Some(material) = &touched {
                state.surfaces.selected = Some(material.id.clone());
                state.surfaces.viewer_open = true;
            }
            touched
        };
        let material = match touched {
            Some(material) => material,
            None => return Err(self.surface(MaterialsError::NotFound(id.to_string()))),
        };

        let token = self.require_token(MaterialAction::View)?;
        let file_id = self.file_id_for(&material, MaterialAction::View)?;

        let payload = self.api().view(&token, &file_id).await.map_err(|e| {
            error!(error = %e, %file_id, "view error");
            self.network_error("File view failed", e)
        })?;

        let object = self.object_urls.create(payload.bytes, payload.content_type);
        if let Err(e) = self.presenter.open_in_new_context(&object) {
            self.object_urls.revoke(&object.url);
            return Err(self.surface(e.into()));
        }
        self.object_urls.revoke_after(&object.url, VIEW_RELEASE_DELAY);
        Ok(())
    }

    async fn delete_material(&self, id: &str) -> Result<bool, MaterialsError> {
        if !self.interaction.confirm(CONFIRM_DELETE_MATERIAL) {
            return Ok(false);
        }
        let token = self.require_token(MaterialAction::Delete)?;

        if let Err(e) = self.api().delete(&token, id).await {
            error!(error = %e, %id, "delete error");
            return Err(self.network_error("Delete failed: Failed to delete material", e));
        }

        {
            let mut state = self.state();
            state.materials.retain(|m| m.id != id);
            if state.surfaces.selected.as_deref() == Some(id) {
                state.close_viewer();
            }
        }
        self.interaction
            .notify(Notice::info("Material deleted successfully."));
        Ok(true)
    }

    fn toggle_bookmark(&self, id: &str) -> Option<bool> {
        // Not persisted: the materials API has no bookmark endpoint.
        let mut state = self.state();
        let material = state.find_mut(id)?;
        material.bookmarked = !material.bookmarked;
        Some(material.bookmarked)
    }

    async fn categories(&self) -> Vec<Category> {
        self.category_service.list().await
    }

    fn open_category_manager(&self) {
        self.state().surfaces.category_manager_open = true;
    }

    fn close_category_manager(&self) {
        let mut state = self.state();
        state.surfaces.category_manager_open = false;
        state.category_draft.editing = None;
    }

    fn category_draft(&self) -> CategoryDraft {
        self.state().category_draft.clone()
    }

    fn edit_category_draft(&self, edit: &mut dyn FnMut(&mut CategoryDraft)) {
        edit(&mut self.state().category_draft);
    }

    fn start_editing_category(&self, id: Option<&str>) {
        self.state().category_draft.editing = id.map(str::to_string);
    }

    async fn add_category(&self) -> Result<bool, MaterialsError> {
        let draft = self.category_draft();
        if draft.name.trim().is_empty() {
            return Ok(false);
        }
        let payload = CategoryPayload {
            name: Some(draft.name),
            color: Some(draft.color),
            icon: Some(DEFAULT_CATEGORY_ICON.to_string()),
        };

        let result = self.category_service.add(payload).await;
        if !result.success {
            return Err(self.category_failure(CategoryAction::Add, result.error.unwrap_or_default()));
        }

        {
            let mut state = self.state();
            let editing = state.category_draft.editing.take();
            state.category_draft = CategoryDraft {
                editing,
                ..CategoryDraft::default()
            };
        }
        self.interaction
            .notify(Notice::info("Category added successfully"));
        Ok(true)
    }

    async fn update_category(&self, id: &str, name: &str, color: &str) -> Result<(), MaterialsError> {
        let payload = CategoryPayload {
            name: Some(name.to_string()),
            color: Some(color.to_string()),
            icon: None,
        };

        let result = self.category_service.update(id, payload).await;
        if !result.success {
            return Err(self.category_failure(CategoryAction::Update, result.error.unwrap_or_default()));
        }

        {
            let mut state = self.state();
            // Same-id reassignment, kept parallel to delete.
            let touched = state.reassign_category(id, id);
            debug!(%id, touched, "category updated");
            state.category_draft.editing = None;
        }
        self.interaction
            .notify(Notice::info("Category updated successfully"));
        Ok(())
    }

    async fn delete_category(&self, id: &str) -> Result<bool, MaterialsError> {
        if id == GENERAL_CATEGORY {
            return Err(self.category_failure(CategoryAction::Delete, GENERAL_IS_PROTECTED));
        }
        if !self.interaction.confirm(CONFIRM_DELETE_CATEGORY) {
            return Ok(false);
        }

        let result = self.category_service.delete(id).await;
        if !result.success {
            return Err(self.category_failure(CategoryAction::Delete, result.error.unwrap_or_default()));
        }

        {
            let mut state = self.state();
            let moved = state.reassign_category(id, GENERAL_CATEGORY);
            debug!(%id, moved, "category deleted, materials moved to general");
            if state.filter.category == CategoryFilter::Only(id.to_string()) {
                state.filter.category = CategoryFilter::All;
            }
        }
        self.interaction
            .notify(Notice::info("Category deleted successfully"));
        Ok(true)
    }

    fn teardown(&self) -> usize {
        self.object_urls.shutdown()
    }
}
