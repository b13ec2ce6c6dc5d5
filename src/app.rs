//! App Core for learnshelf.
//!
//! Central struct wiring the materials view-model to its collaborators and
//! managing the application lifecycle.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::managers::materials_manager::{MaterialsManager, MaterialsManagerTrait};
use crate::services::category_service::InMemoryCategoryService;
use crate::services::generative_client::GenerativeTextClient;
use crate::services::interaction::{CapturePresenter, RecordingInteraction};
use crate::services::materials_api::{HttpMaterialsApi, MaterialsApiTrait};
use crate::services::session_store::SessionStore;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::errors::SettingsError;

/// Central application struct holding the view-model and its collaborators.
///
/// Everything except the settings engine is behind an `Arc`, so the RPC layer
/// can clone handles out of a locked `App` and release the lock before any
/// remote call.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub session: Arc<SessionStore>,
    pub categories: Arc<InMemoryCategoryService>,
    pub interaction: Arc<RecordingInteraction>,
    pub presenter: Arc<CapturePresenter>,
    pub materials: Arc<MaterialsManager>,
    pub generative: GenerativeTextClient,
}

impl App {
    /// Creates a new App, loading settings from `config_path` and the environment.
    pub fn new(config_path: Option<String>) -> Result<Self, SettingsError> {
        let mut settings_engine = SettingsEngine::new(config_path);
        settings_engine.load()?;
        let api = Arc::new(HttpMaterialsApi::new(
            &settings_engine.get_settings().api.base_url,
        ));
        Ok(Self::with_api(settings_engine, api))
    }

    /// Creates an App over an already-loaded settings engine and a given API.
    pub fn with_api(settings_engine: SettingsEngine, api: Arc<dyn MaterialsApiTrait>) -> Self {
        let session = Arc::new(SessionStore::new());
        let categories = Arc::new(InMemoryCategoryService::new());
        let interaction = Arc::new(RecordingInteraction::default());
        let presenter = Arc::new(CapturePresenter::new());

        let materials = Arc::new(MaterialsManager::new(
            api,
            session.clone(),
            categories.clone(),
            interaction.clone(),
            presenter.clone(),
        ));
        let generative = GenerativeTextClient::new(settings_engine.get_settings().generative.clone());

        Self {
            settings_engine,
            session,
            categories,
            interaction,
            presenter,
            materials,
            generative,
        }
    }

    /// Updates one setting by dotted key and rebuilds the client it feeds.
    ///
    /// `api.*` keys swap the materials API for an HTTP client on the new base
    /// URL; `generative.*` keys rebuild the generative client.
    pub fn update_setting(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.settings_engine.set_value(key, value)?;
        match key.split('.').next() {
            Some("api") => self.rebuild_materials_api(),
            Some("generative") => self.rebuild_generative(),
            _ => {}
        }
        Ok(())
    }

    /// Restores default settings and rebuilds both remote clients.
    pub fn reset_settings(&mut self) -> Result<(), SettingsError> {
        self.settings_engine.reset()?;
        self.rebuild_materials_api();
        self.rebuild_generative();
        Ok(())
    }

    fn rebuild_materials_api(&self) {
        let base_url = &self.settings_engine.get_settings().api.base_url;
        info!(%base_url, "materials API endpoint changed");
        self.materials
            .replace_api(Arc::new(HttpMaterialsApi::new(base_url)));
    }

    fn rebuild_generative(&mut self) {
        self.generative = GenerativeTextClient::new(self.settings_engine.get_settings().generative.clone());
        info!(endpoint = %self.generative.endpoint(), "generative client rebuilt");
    }

    /// Startup sequence: activate the materials view.
    pub async fn startup(&self) {
        self.materials.activate().await;
        info!(count = self.materials.materials().len(), "learnshelf started");
    }

    /// Shutdown sequence: release every outstanding object URL.
    pub fn shutdown(&self) {
        let released = self.materials.teardown();
        info!(released, "learnshelf shut down");
    }
}
