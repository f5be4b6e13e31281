//! Domain types and media logic shared by the wallpaper catalog crates.
//!
//! Nothing in here touches the database; persistence lives in
//! `wallhub-db` and HTTP concerns in `wallhub-api`.

pub mod error;
pub mod ffmpeg;
pub mod media;
pub mod types;
pub mod uploads;
pub mod wallpaper;
