//! Wallpaper group and media item models.
//!
//! A group is keyed by `(main_category_id, sub_category_id, kind)` and owns
//! its items; items are returned in `position` order.

use serde::Serialize;
use sqlx::FromRow;
use wallhub_core::types::{DbId, Timestamp};

use crate::models::category::{MainCategory, SubCategory};

/// A row from the `wallpaper_groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperGroup {
    pub id: DbId,
    #[serde(rename = "type")]
    pub kind: String,
    pub main_category_id: DbId,
    pub sub_category_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `wallpaper_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperItem {
    pub id: DbId,
    #[serde(skip)]
    pub group_id: DbId,
    #[serde(skip)]
    pub position: i32,
    pub title: String,
    pub file_url: String,
    pub snapshot_url: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for appending an item to a group.
#[derive(Debug, Clone)]
pub struct NewWallpaperItem {
    pub title: String,
    pub file_url: String,
    pub snapshot_url: Option<String>,
}

/// A group together with its items, category ids left unresolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperGroupWithItems {
    #[serde(flatten)]
    pub group: WallpaperGroup,
    pub items: Vec<WallpaperItem>,
}

/// A group with both categories resolved to full records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperGroupView {
    pub id: DbId,
    #[serde(rename = "type")]
    pub kind: String,
    pub main_category: MainCategory,
    pub sub_category: SubCategory,
    pub items: Vec<WallpaperItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Joined row used to build [`WallpaperGroupView`].
#[derive(Debug, Clone, FromRow)]
pub struct WallpaperGroupJoinRow {
    pub id: DbId,
    pub kind: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub main_id: DbId,
    pub main_name: String,
    pub main_created_at: Timestamp,
    pub sub_id: DbId,
    pub sub_name: String,
    pub sub_main_category_id: DbId,
    pub sub_created_at: Timestamp,
}

impl WallpaperGroupJoinRow {
    /// Attach `items` and split the joined columns into category records.
    pub fn into_view(self, items: Vec<WallpaperItem>) -> WallpaperGroupView {
        WallpaperGroupView {
            id: self.id,
            kind: self.kind,
            main_category: MainCategory {
                id: self.main_id,
                name: self.main_name,
                created_at: self.main_created_at,
            },
            sub_category: SubCategory {
                id: self.sub_id,
                name: self.sub_name,
                main_category_id: self.sub_main_category_id,
                created_at: self.sub_created_at,
            },
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
