//! Request handlers.
//!
//! Handlers delegate to the repositories in `wallhub_db` (or the upload
//! engine) and map errors via [`crate::error::AppError`].

pub mod auth;
pub mod categories;
pub mod wallpapers;
