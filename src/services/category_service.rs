//! Category service seam.
//!
//! Category lifecycle belongs to an external collaborator; the view-model only
//! reacts to the `{success, error}` it reports. `InMemoryCategoryService` is
//! the local collaborator used by the RPC bridge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::types::category::{
    Category, CategoryPayload, CategoryResult, DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_ICON,
};

/// Trait defining category service operations.
#[async_trait]
pub trait CategoryServiceTrait: Send + Sync {
    async fn list(&self) -> Vec<Category>;
    async fn add(&self, payload: CategoryPayload) -> CategoryResult;
    async fn update(&self, id: &str, payload: CategoryPayload) -> CategoryResult;
    async fn delete(&self, id: &str) -> CategoryResult;
}

/// In-memory category service with sequential numeric ids.
#[derive(Debug)]
pub struct InMemoryCategoryService {
    categories: RwLock<Vec<Category>>,
    next_id: AtomicU64,
}

impl InMemoryCategoryService {
    pub fn new() -> Self {
        Self::with_categories(Vec::new())
    }

    /// Seeds the service; new ids continue after the largest numeric id.
    pub fn with_categories(categories: Vec<Category>) -> Self {
        let next_id = categories
            .iter()
            .filter_map(|c| c.id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        Self {
            categories: RwLock::new(categories),
            next_id: AtomicU64::new(next_id),
        }
    }

    fn name_taken(categories: &[Category], name: &str, except: Option<&str>) -> bool {
        categories
            .iter()
            .filter(|c| Some(c.id.as_str()) != except)
            .any(|c| c.name.eq_ignore_ascii_case(name))
    }
}

impl Default for InMemoryCategoryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CategoryServiceTrait for InMemoryCategoryService {
    async fn list(&self) -> Vec<Category> {
        self.categories.read().map(|c| c.clone()).unwrap_or_default()
    }

    async fn add(&self, payload: CategoryPayload) -> CategoryResult {
        let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return CategoryResult::failed("Category name is required");
        }
        let mut categories = match self.categories.write() {
            Ok(c) => c,
            Err(e) => return CategoryResult::failed(e.to_string()),
        };
        if Self::name_taken(&categories, name, None) {
            return CategoryResult::failed(format!("Category already exists: {}", name));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        categories.push(Category {
            id,
            name: name.to_string(),
            color: payload
                .color
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            icon: payload
                .icon
                .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
        });
        CategoryResult::ok()
    }

    async fn update(&self, id: &str, payload: CategoryPayload) -> CategoryResult {
        let mut categories = match self.categories.write() {
            Ok(c) => c,
            Err(e) => return CategoryResult::failed(e.to_string()),
        };
        if let Some(name) = payload.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return CategoryResult::failed("Category name is required");
            }
            if Self::name_taken(&categories, name, Some(id)) {
                return CategoryResult::failed(format!("Category already exists: {}", name));
            }
        }
        let Some(category) = categories.iter_mut().find(|c| c.id == id) else {
            return CategoryResult::failed(format!("Category not found: {}", id));
        };

        if let Some(name) = payload.name {
            category.name = name.trim().to_string();
        }
        if let Some(color) = payload.color {
            category.color = color;
        }
        if let Some(icon) = payload.icon {
            category.icon = icon;
        }
        CategoryResult::ok()
    }

    async fn delete(&self, id: &str) -> CategoryResult {
        let mut categories = match self.categories.write() {
            Ok(c) => c,
            Err(e) => return CategoryResult::failed(e.to_string()),
        };
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return CategoryResult::failed(format!("Category not found: {}", id));
        }
        CategoryResult::ok()
    }
}
