//! Wallpaper catalog API server library.
//!
//! Exposes the building blocks (config, state, error handling, session gate,
//! upload pipeline, routes) so integration tests and the binaries can both
//! access them.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
