//! AST Explorer bridge library target.
//!
//! Exposes the UI modules for integration tests. The binary entry point
//! is in `main.rs`.

pub mod app;
pub mod messages;
pub mod update;
pub mod view_ui;
