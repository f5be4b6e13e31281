//! Default category seeding.
//!
//! Seeding is idempotent: existing categories are matched by name and left
//! in place, so re-running never orphans wallpaper groups.

use sqlx::PgPool;

use crate::repositories::{MainCategoryRepo, SubCategoryRepo};

/// The stock category tree: `(main category, [subcategories])`.
pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    ("Nature", &["Forest", "Mountain", "Ocean", "Desert", "Flowers"]),
    ("Abstract", &["Shapes", "Colors", "Patterns", "Textures"]),
    ("Animals", &["Birds", "Mammals", "Reptiles", "Marine Life"]),
    ("Space", &["Stars", "Planets", "Galaxies", "Nebulae"]),
];

/// Counts reported after a seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub main_categories: usize,
    pub sub_categories: usize,
}

/// Ensure every category in `tree` exists.
pub async fn seed_categories(
    pool: &PgPool,
    tree: &[(&str, &[&str])],
) -> Result<SeedSummary, sqlx::Error> {
    let mut summary = SeedSummary {
        main_categories: 0,
        sub_categories: 0,
    };

    for (main_name, sub_names) in tree {
        let main = MainCategoryRepo::upsert_by_name(pool, main_name).await?;
        summary.main_categories += 1;

        for sub_name in sub_names.iter() {
            SubCategoryRepo::upsert_by_name(pool, main.id, sub_name).await?;
            summary.sub_categories += 1;
        }
        tracing::debug!(main = %main.name, subs = sub_names.len(), "Seeded category");
    }

    Ok(summary)
}
