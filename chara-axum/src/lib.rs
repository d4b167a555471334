//! chara-axum: Axum adapter for the character service.
//!
//! Routes under `/api/characters` decode multipart forms into typed
//! requests, call the [`chara_core::CharacterLifecycle`], and turn any
//! [`chara_core::CharaError`] into a Feathers-style JSON error body.

pub mod app;
pub mod middlewares;
pub mod rest;
pub mod state;
mod error;
pub use error::CharaAxumError;
pub use state::CharaAxumState;

pub use app::CharaAxumApp;
