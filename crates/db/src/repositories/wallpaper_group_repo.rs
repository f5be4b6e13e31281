//! Repository for the `wallpaper_groups` and `wallpaper_items` tables.
//!
//! Groups are unique per `(main_category_id, sub_category_id, kind)`;
//! [`WallpaperGroupRepo::upsert_by_key`] relies on that constraint so
//! concurrent uploads to the same key share one group.

use std::collections::HashMap;

use sqlx::PgPool;
use wallhub_core::types::DbId;

use crate::models::wallpaper::{
    NewWallpaperItem, WallpaperGroup, WallpaperGroupJoinRow, WallpaperGroupView,
    WallpaperGroupWithItems, WallpaperItem,
};

/// Column list for `wallpaper_groups`.
const COLUMNS: &str = "id, kind, main_category_id, sub_category_id, created_at, updated_at";

/// Column list for `wallpaper_items`.
const ITEM_COLUMNS: &str = "id, group_id, position, title, file_url, snapshot_url, created_at";

/// Joined select for group views (group + both categories).
const VIEW_SELECT: &str = "SELECT g.id, g.kind, g.created_at, g.updated_at, \
        m.id AS main_id, m.name AS main_name, m.created_at AS main_created_at, \
        s.id AS sub_id, s.name AS sub_name, s.main_category_id AS sub_main_category_id, \
        s.created_at AS sub_created_at \
     FROM wallpaper_groups g \
     JOIN main_categories m ON m.id = g.main_category_id \
     JOIN sub_categories s ON s.id = g.sub_category_id";

/// Provides group lookup, creation, item appends, and joined listings.
pub struct WallpaperGroupRepo;

impl WallpaperGroupRepo {
    /// Find the group for a category pair and kind, if one exists.
    pub async fn find_by_key(
        pool: &PgPool,
        main_category_id: DbId,
        sub_category_id: DbId,
        kind: &str,
    ) -> Result<Option<WallpaperGroup>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wallpaper_groups \
             WHERE main_category_id = $1 AND sub_category_id = $2 AND kind = $3"
        );
        sqlx::query_as::<_, WallpaperGroup>(&query)
            .bind(main_category_id)
            .bind(sub_category_id)
            .bind(kind)
            .fetch_optional(pool)
            .await
    }

    /// Insert the group for a key, or return the existing one.
    ///
    /// Atomic with respect to concurrent callers: exactly one row per key.
    pub async fn upsert_by_key(
        pool: &PgPool,
        main_category_id: DbId,
        sub_category_id: DbId,
        kind: &str,
    ) -> Result<WallpaperGroup, sqlx::Error> {
        let query = format!(
            "INSERT INTO wallpaper_groups (main_category_id, sub_category_id, kind) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_wallpaper_groups_key \
             DO UPDATE SET updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WallpaperGroup>(&query)
            .bind(main_category_id)
            .bind(sub_category_id)
            .bind(kind)
            .fetch_one(pool)
            .await
    }

    /// Append an item at the end of a group and bump the group's `updated_at`.
    ///
    /// Runs in one transaction holding the group row lock, so concurrent
    /// appends to the same group get distinct, increasing positions.
    /// Returns `RowNotFound` if the group does not exist.
    pub async fn append_item(
        pool: &PgPool,
        group_id: DbId,
        input: &NewWallpaperItem,
    ) -> Result<WallpaperItem, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Takes the row lock that serializes appends to this group.
        let touched = sqlx::query("UPDATE wallpaper_groups SET updated_at = NOW() WHERE id = $1")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        let query = format!(
            "INSERT INTO wallpaper_items (group_id, position, title, file_url, snapshot_url) \
             VALUES ($1, \
                     (SELECT COALESCE(MAX(position) + 1, 0) FROM wallpaper_items WHERE group_id = $1), \
                     $2, $3, $4) \
             RETURNING {ITEM_COLUMNS}"
        );
        let item = sqlx::query_as::<_, WallpaperItem>(&query)
            .bind(group_id)
            .bind(&input.title)
            .bind(&input.file_url)
            .bind(&input.snapshot_url)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    /// List a group's items in display order.
    pub async fn list_items(pool: &PgPool, group_id: DbId) -> Result<Vec<WallpaperItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM wallpaper_items WHERE group_id = $1 ORDER BY position"
        );
        sqlx::query_as::<_, WallpaperItem>(&query)
            .bind(group_id)
            .fetch_all(pool)
            .await
    }

    /// Find a group by ID together with its items.
    pub async fn find_with_items(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WallpaperGroupWithItems>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wallpaper_groups WHERE id = $1");
        let Some(group) = sqlx::query_as::<_, WallpaperGroup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let items = Self::list_items(pool, id).await?;
        Ok(Some(WallpaperGroupWithItems { group, items }))
    }

    /// List every group with categories resolved, newest first.
    pub async fn list_views(pool: &PgPool) -> Result<Vec<WallpaperGroupView>, sqlx::Error> {
        let query = format!("{VIEW_SELECT} ORDER BY g.created_at DESC, g.id DESC");
        let rows = sqlx::query_as::<_, WallpaperGroupJoinRow>(&query)
            .fetch_all(pool)
            .await?;

        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let mut items_by_group = Self::items_for_groups(pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = items_by_group.remove(&row.id).unwrap_or_default();
                row.into_view(items)
            })
            .collect())
    }

    /// Find one group with categories resolved.
    pub async fn find_view(pool: &PgPool, id: DbId) -> Result<Option<WallpaperGroupView>, sqlx::Error> {
        let query = format!("{VIEW_SELECT} WHERE g.id = $1");
        let Some(row) = sqlx::query_as::<_, WallpaperGroupJoinRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let items = Self::list_items(pool, id).await?;
        Ok(Some(row.into_view(items)))
    }

    /// Fetch items for many groups in one query, keyed by group ID.
    async fn items_for_groups(
        pool: &PgPool,
        group_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<WallpaperItem>>, sqlx::Error> {
        if group_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM wallpaper_items \
             WHERE group_id = ANY($1) \
             ORDER BY group_id, position"
        );
        let items = sqlx::query_as::<_, WallpaperItem>(&query)
            .bind(group_ids)
            .fetch_all(pool)
            .await?;

        let mut by_group: HashMap<DbId, Vec<WallpaperItem>> = HashMap::new();
        for item in items {
            by_group.entry(item.group_id).or_default().push(item);
        }
        Ok(by_group)
    }
}
