//! RPC method handler for the learnshelf JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! materials view-model and its collaborators via the `App` struct.
//!
//! Responses of `materials.*` and `categories.*` methods carry the notices
//! raised during the call and any files handed to the user, so the shell can
//! show and deliver them.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::app::App;
use crate::managers::materials_manager::{MaterialsManager, MaterialsManagerTrait};
use crate::services::interaction::{CapturePresenter, RecordingInteraction};
use crate::services::session_store::SessionStoreTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::category::CategoryDraft;
use crate::types::generative::PromptOptions;
use crate::types::material::{FileBlob, Material, UploadDraft, ViewMode};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};

/// Encode bytes to base64 string.
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    BASE64.decode(input).map_err(|e| format!("base64 decode error: {}", e))
}

fn str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn required<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    str_param(params, key).ok_or_else(|| format!("missing {}", key))
}

/// View-model handles cloned out of `App`. The app lock is released before
/// any of them is awaited on.
struct Handles {
    materials: Arc<MaterialsManager>,
    interaction: Arc<RecordingInteraction>,
    presenter: Arc<CapturePresenter>,
}

async fn handles(app: &Mutex<App>) -> Handles {
    let a = app.lock().await;
    Handles {
        materials: a.materials.clone(),
        interaction: a.interaction.clone(),
        presenter: a.presenter.clone(),
    }
}

fn material_json(m: &Material) -> Value {
    let mut value = serde_json::to_value(m).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("display_size".to_string(), json!(m.display_size()));
        map.insert("file_kind".to_string(), json!(m.file_kind()));
    }
    value
}

fn visible_json(materials: &MaterialsManager) -> Value {
    let visible: Vec<Value> = materials.visible_materials().iter().map(material_json).collect();
    let filter = materials.filter();
    json!({
        "materials": visible,
        "empty": materials.is_empty_state(),
        "filter": {
            "search_term": filter.search_term,
            "category": filter.category.as_selection(),
            "bookmarked_only": filter.bookmarked_only,
        },
    })
}

fn settings_json(a: &App) -> Value {
    let mut settings = a.settings_engine.get_settings().clone();
    let key_set = settings.generative.api_key.take().is_some_and(|k| !k.is_empty());
    json!({
        "settings": settings,
        "generative_key_set": key_set,
        "config_path": a.settings_engine.get_config_path(),
    })
}

/// Attaches notices and presented files raised by the call to `value`.
///
/// Notices are drained from the shared recorder, so a call running
/// concurrently with another may carry the other call's notices.
fn with_effects(h: &Handles, mut value: Value) -> Value {
    let notices = h.interaction.take_notices();
    let presented: Vec<Value> = h
        .presenter
        .take_presented()
        .into_iter()
        .map(|p| {
            let mut entry = serde_json::to_value(&p.mode).unwrap_or_else(|_| json!({}));
            if let Value::Object(map) = &mut entry {
                map.insert("object_url".to_string(), json!(p.object_url));
                map.insert("content_type".to_string(), json!(p.content_type));
                map.insert("data".to_string(), json!(base64_encode(&p.bytes)));
            }
            entry
        })
        .collect();
    if let Value::Object(map) = &mut value {
        map.insert("notices".to_string(), json!(notices));
        map.insert("presented".to_string(), json!(presented));
    }
    value
}

/// Drops effects left over by a failed call and turns the error into a string.
fn fail(h: &Handles, err: impl std::fmt::Display) -> String {
    h.interaction.take_notices();
    h.presenter.take_presented();
    err.to_string()
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// The app lock is only held to read or swap state; remote calls run on
/// cloned handles so a slow request never stalls other methods.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Session ───
        "session.login" => {
            let token = required(params, "token")?;
            if token.is_empty() {
                return Err("token cannot be empty".to_string());
            }
            app.lock().await.session.login(token);
            Ok(json!({"ok": true}))
        }
        "session.logout" => {
            app.lock().await.session.logout();
            Ok(json!({"ok": true}))
        }

        // ─── Materials ───
        "materials.activate" => {
            let h = handles(app).await;
            h.materials.activate().await;
            let value = visible_json(&h.materials);
            Ok(with_effects(&h, value))
        }
        "materials.refresh" => {
            let h = handles(app).await;
            match h.materials.refresh().await {
                Ok(count) => Ok(with_effects(&h, json!({"count": count}))),
                Err(e) => Err(fail(&h, e)),
            }
        }
        "materials.list" => {
            let h = handles(app).await;
            let mut value = visible_json(&h.materials);
            if let Value::Object(map) = &mut value {
                let surfaces = h.materials.surfaces();
                let draft = h.materials.draft();
                map.insert("view_mode".to_string(), json!(surfaces.view_mode));
                map.insert("viewer_open".to_string(), json!(surfaces.viewer_open));
                map.insert("selected".to_string(), json!(surfaces.selected));
                map.insert("upload_open".to_string(), json!(surfaces.upload_open));
                map.insert(
                    "draft".to_string(),
                    json!({
                        "title": draft.title,
                        "description": draft.description,
                        "category": draft.category,
                        "tags": draft.tags,
                        "file_name": draft.file.as_ref().map(|f| f.name.clone()),
                    }),
                );
            }
            Ok(value)
        }
        "materials.get" => {
            let id = required(params, "id")?;
            let h = handles(app).await;
            let material = h
                .materials
                .get_material(id)
                .ok_or_else(|| format!("material not found: {}", id))?;
            Ok(material_json(&material))
        }
        "materials.filter" => {
            let h = handles(app).await;
            if let Some(term) = str_param(params, "search_term") {
                h.materials.set_search_term(term);
            }
            if let Some(category) = str_param(params, "category") {
                h.materials.set_category_filter(category);
            }
            if let Some(only) = params.get("bookmarked_only").and_then(|v| v.as_bool()) {
                h.materials.set_bookmarked_only(only);
            }
            Ok(visible_json(&h.materials))
        }
        "materials.view_mode" => {
            let mode = match required(params, "mode")? {
                "grid" => ViewMode::Grid,
                "list" => ViewMode::List,
                other => return Err(format!("invalid view mode: {}", other)),
            };
            handles(app).await.materials.set_view_mode(mode);
            Ok(json!({"view_mode": mode}))
        }
        "materials.upload" => {
            let title = str_param(params, "title").unwrap_or_default();
            let mut file = match str_param(params, "data") {
                Some(data) => {
                    let file_name = required(params, "file_name")?;
                    let bytes = base64_decode(data)?;
                    let mime = str_param(params, "mime_type").map(str::to_string);
                    Some(FileBlob::new(file_name, mime, bytes))
                }
                None => None,
            };

            let h = handles(app).await;
            h.materials.open_upload();
            h.materials.edit_draft(&mut |draft: &mut UploadDraft| {
                draft.title = title.to_string();
                if let Some(description) = str_param(params, "description") {
                    draft.description = description.to_string();
                }
                if let Some(category) = str_param(params, "category") {
                    draft.category = category.to_string();
                }
                if let Some(tags) = str_param(params, "tags") {
                    draft.tags = tags.to_string();
                }
                draft.file = file.take();
            });
            // A failed upload keeps the draft and the upload surface open.
            match h.materials.submit_upload().await {
                Ok(material) => {
                    let value = json!({"material": material_json(&material)});
                    Ok(with_effects(&h, value))
                }
                Err(e) => Err(fail(&h, e)),
            }
        }
        "materials.download" => {
            let id = required(params, "id")?;
            let h = handles(app).await;
            match h.materials.download(id).await {
                Ok(()) => Ok(with_effects(&h, json!({"ok": true}))),
                Err(e) => Err(fail(&h, e)),
            }
        }
        "materials.open" => {
            let id = required(params, "id")?;
            let h = handles(app).await;
            match h.materials.open_material(id).await {
                Ok(()) => Ok(with_effects(&h, json!({"ok": true}))),
                Err(e) => Err(fail(&h, e)),
            }
        }
        "materials.close_viewer" => {
            handles(app).await.materials.close_viewer();
            Ok(json!({"ok": true}))
        }
        "materials.delete" => {
            let id = required(params, "id")?;
            let confirmed = params.get("confirmed").and_then(|v| v.as_bool()).unwrap_or(false);
            let h = handles(app).await;
            h.interaction.set_confirm_answer(confirmed);
            match h.materials.delete_material(id).await {
                Ok(deleted) => Ok(with_effects(&h, json!({"deleted": deleted}))),
                Err(e) => Err(fail(&h, e)),
            }
        }
        "materials.bookmark" => {
            let id = required(params, "id")?;
            let bookmarked = handles(app)
                .await
                .materials
                .toggle_bookmark(id)
                .ok_or_else(|| format!("material not found: {}", id))?;
            Ok(json!({"id": id, "bookmarked": bookmarked}))
        }

        // ─── Categories ───
        "categories.list" => {
            let h = handles(app).await;
            let categories = h.materials.categories().await;
            let counts = h.materials.category_counts();
            let listed: Vec<Value> = categories
                .iter()
                .map(|category| {
                    let mut entry = json!(category);
                    if let Value::Object(map) = &mut entry {
                        let count = counts.get(&category.id).copied().unwrap_or(0);
                        map.insert("material_count".to_string(), json!(count));
                    }
                    entry
                })
                .collect();
            Ok(json!(listed))
        }
        "categories.add" => {
            let name = required(params, "name")?;
            let h = handles(app).await;
            h.materials.edit_category_draft(&mut |draft: &mut CategoryDraft| {
                draft.name = name.to_string();
                if let Some(color) = str_param(params, "color") {
                    draft.color = color.to_string();
                }
            });
            match h.materials.add_category().await {
                Ok(added) => Ok(with_effects(&h, json!({"added": added}))),
                Err(e) => Err(fail(&h, e)),
            }
        }
        "categories.update" => {
            let id = required(params, "id")?;
            let name = required(params, "name")?;
            let color = required(params, "color")?;
            let h = handles(app).await;
            match h.materials.update_category(id, name, color).await {
                Ok(()) => Ok(with_effects(&h, json!({"ok": true}))),
                Err(e) => Err(fail(&h, e)),
            }
        }
        "categories.delete" => {
            let id = required(params, "id")?;
            let confirmed = params.get("confirmed").and_then(|v| v.as_bool()).unwrap_or(false);
            let h = handles(app).await;
            h.interaction.set_confirm_answer(confirmed);
            match h.materials.delete_category(id).await {
                Ok(deleted) => Ok(with_effects(&h, json!({"deleted": deleted}))),
                Err(e) => Err(fail(&h, e)),
            }
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().await;
            Ok(settings_json(&a))
        }
        "settings.set" => {
            let key = required(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().await;
            a.update_setting(key, value).map_err(|e| e.to_string())?;
            Ok(settings_json(&a))
        }
        "settings.reset" => {
            let mut a = app.lock().await;
            a.reset_settings().map_err(|e| e.to_string())?;
            Ok(settings_json(&a))
        }

        // ─── Generative text ───
        "generate" => {
            let prompt = required(params, "prompt")?;
            let options = PromptOptions {
                temperature: params.get("temperature").and_then(|v| v.as_f64()),
                max_output_tokens: params
                    .get("max_output_tokens")
                    .and_then(|v| v.as_u64())
                    .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
            };
            let client = app.lock().await.generative.clone();
            let text = client
                .send_prompt(prompt, options)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"text": text}))
        }

        // ─── Ping ───
        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
