//! Request middleware.
//!
//! - [`auth::require_session`] -- the login gate in front of the dashboard
//!   and the `/api` routes.
//! - [`auth::SessionUser`] -- the authenticated admin, inserted as a request
//!   extension by the gate.

pub mod auth;
