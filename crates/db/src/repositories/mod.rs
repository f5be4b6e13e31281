//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod category_repo;
pub mod wallpaper_group_repo;

pub use category_repo::{MainCategoryRepo, SubCategoryRepo};
pub use wallpaper_group_repo::WallpaperGroupRepo;
