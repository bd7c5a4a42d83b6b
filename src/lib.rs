//! Engagement tracking and news recommendation core.
//!
//! An append-only interaction log over a labeled article catalog, a derived
//! per-user category preference profile, and a ranked recommendation surface
//! with a global-popularity fallback. The web layer, authentication, article
//! fetching, and classification live outside this crate and consume it as a
//! library.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
