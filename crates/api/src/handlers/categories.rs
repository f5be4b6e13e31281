//! Handlers for the category listings.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use wallhub_core::wallpaper::parse_category_id;
use wallhub_db::models::category::{MainCategory, SubCategory};
use wallhub_db::repositories::{MainCategoryRepo, SubCategoryRepo};

use crate::error::AppResult;
use crate::state::AppState;

/// Query parameters for `GET /api/sub-categories`.
#[derive(Debug, Deserialize)]
pub struct SubCategoryParams {
    #[serde(rename = "mainCategory")]
    pub main_category: Option<String>,
}

/// GET /api/main-categories
pub async fn list_main(State(state): State<AppState>) -> AppResult<Json<Vec<MainCategory>>> {
    let categories = MainCategoryRepo::list(&state.pool).await?;
    Ok(Json(categories))
}

/// GET /api/sub-categories?mainCategory={id}
///
/// Without `mainCategory` the result is empty.
pub async fn list_sub(
    State(state): State<AppState>,
    Query(params): Query<SubCategoryParams>,
) -> AppResult<Json<Vec<SubCategory>>> {
    let Some(main_id) = parse_category_id("mainCategory", params.main_category.as_deref())? else {
        return Ok(Json(Vec::new()));
    };
    let categories = SubCategoryRepo::list_by_main_category(&state.pool, main_id).await?;
    Ok(Json(categories))
}
