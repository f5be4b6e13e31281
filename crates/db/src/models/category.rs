//! Main category and subcategory models.

use serde::Serialize;
use sqlx::FromRow;
use wallhub_core::types::{DbId, Timestamp};

/// A row from the `main_categories` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MainCategory {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// A row from the `sub_categories` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: DbId,
    pub name: String,
    pub main_category_id: DbId,
    pub created_at: Timestamp,
}
