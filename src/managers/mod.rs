pub mod materials_manager;
pub mod object_url_registry;
