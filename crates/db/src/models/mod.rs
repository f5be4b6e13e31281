//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus insert DTOs where the table is written to.
//! Entities serialize with camelCase keys, which is the wire format of the
//! catalog API.

pub mod category;
pub mod wallpaper;
