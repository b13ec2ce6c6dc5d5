pub mod category_service;
pub mod drive_link;
pub mod generative_client;
pub mod interaction;
pub mod materials_api;
pub mod session_store;
pub mod settings_engine;
