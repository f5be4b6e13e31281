//! Session-based access control for the admin dashboard.
//!
//! - [`session`] -- signed cookie sessions, the in-process store, and the
//!   expiry sweeper.

pub mod session;
