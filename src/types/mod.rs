// learnshelf shared type definitions
// Each submodule defines types used across the application.

pub mod category;
pub mod errors;
pub mod generative;
pub mod material;
pub mod notice;
pub mod settings;
