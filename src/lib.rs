//! Postercraft
//!
//! Prompt-to-poster server: a language model proposes a design, the design is
//! merged into a template and rendered with `poster_core`.
//! This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
