//! Repositories for the `main_categories` and `sub_categories` tables.

use sqlx::PgPool;
use wallhub_core::types::DbId;

use crate::models::category::{MainCategory, SubCategory};

/// Column list for `main_categories`.
const MAIN_COLUMNS: &str = "id, name, created_at";

/// Column list for `sub_categories`.
const SUB_COLUMNS: &str = "id, name, main_category_id, created_at";

/// Read access to main categories. Writes happen only through seeding.
pub struct MainCategoryRepo;

impl MainCategoryRepo {
    /// List all main categories ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<MainCategory>, sqlx::Error> {
        let query = format!("SELECT {MAIN_COLUMNS} FROM main_categories ORDER BY name, id");
        sqlx::query_as::<_, MainCategory>(&query)
            .fetch_all(pool)
            .await
    }

    /// Find a main category by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MainCategory>, sqlx::Error> {
        let query = format!("SELECT {MAIN_COLUMNS} FROM main_categories WHERE id = $1");
        sqlx::query_as::<_, MainCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a main category or return the existing one with the same name.
    pub async fn upsert_by_name(pool: &PgPool, name: &str) -> Result<MainCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO main_categories (name) VALUES ($1) \
             ON CONFLICT ON CONSTRAINT uq_main_categories_name \
             DO UPDATE SET name = EXCLUDED.name \
             RETURNING {MAIN_COLUMNS}"
        );
        sqlx::query_as::<_, MainCategory>(&query)
            .bind(name)
            .fetch_one(pool)
            .await
    }
}

/// Read access to subcategories. Writes happen only through seeding.
pub struct SubCategoryRepo;

impl SubCategoryRepo {
    /// List the subcategories of one main category, ordered by name.
    pub async fn list_by_main_category(
        pool: &PgPool,
        main_category_id: DbId,
    ) -> Result<Vec<SubCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {SUB_COLUMNS} FROM sub_categories \
             WHERE main_category_id = $1 \
             ORDER BY name, id"
        );
        sqlx::query_as::<_, SubCategory>(&query)
            .bind(main_category_id)
            .fetch_all(pool)
            .await
    }

    /// Find a subcategory by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SubCategory>, sqlx::Error> {
        let query = format!("SELECT {SUB_COLUMNS} FROM sub_categories WHERE id = $1");
        sqlx::query_as::<_, SubCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a subcategory under `main_category_id` or return the existing
    /// one with the same name.
    pub async fn upsert_by_name(
        pool: &PgPool,
        main_category_id: DbId,
        name: &str,
    ) -> Result<SubCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO sub_categories (name, main_category_id) VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_sub_categories_parent_name \
             DO UPDATE SET name = EXCLUDED.name \
             RETURNING {SUB_COLUMNS}"
        );
        sqlx::query_as::<_, SubCategory>(&query)
            .bind(name)
            .bind(main_category_id)
            .fetch_one(pool)
            .await
    }
}
