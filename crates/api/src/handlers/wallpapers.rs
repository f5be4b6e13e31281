//! Handlers for the `/api/wallpapers` resource.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use wallhub_core::error::CoreError;
use wallhub_core::types::DbId;
use wallhub_db::models::wallpaper::{WallpaperGroupView, WallpaperGroupWithItems};
use wallhub_db::repositories::WallpaperGroupRepo;

use crate::engine::receive::receive_upload;
use crate::engine::upload::upload_wallpapers;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/wallpapers
///
/// Every group with categories resolved, newest first.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<WallpaperGroupView>>> {
    let groups = WallpaperGroupRepo::list_views(&state.pool).await?;
    Ok(Json(groups))
}

/// GET /api/wallpapers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<WallpaperGroupView>> {
    let group = WallpaperGroupRepo::find_view(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WallpaperGroup",
            id,
        }))?;
    Ok(Json(group))
}

/// POST /api/wallpapers
///
/// Multipart form: `files[]`, `titles`, `type`, `mainCategory`,
/// `subCategory`. Responds with the target group and all of its items.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<WallpaperGroupWithItems>> {
    let form = receive_upload(&mut multipart, &state.config.upload_dir).await?;
    let settings = state.config.media.transform_settings();
    let group = upload_wallpapers(&state.pool, state.transformer.as_ref(), &settings, form).await?;
    Ok(Json(group))
}
