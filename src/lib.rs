//! learnshelf: a personal library of learning materials.
//!
//! This library crate exposes all modules for use by the RPC binary and integration tests.

pub mod app;
pub mod managers;
pub mod services;
pub mod rpc_handler;
pub mod types;
