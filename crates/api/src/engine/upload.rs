//! Upload orchestration: validate a received batch, derive live media, and
//! append one item per file to the `(main, sub, type)` group.
//!
//! Each file is persisted as soon as it is processed. A failure part way
//! through a batch leaves the earlier items in place and removes the stored
//! files that were not reached.

use sqlx::PgPool;
use wallhub_core::error::CoreError;
use wallhub_core::media::{self, MediaTransformer, TransformError, TransformSettings};
use wallhub_core::types::DbId;
use wallhub_core::uploads;
use wallhub_core::wallpaper::{self, WallpaperKind};
use wallhub_db::models::wallpaper::{NewWallpaperItem, WallpaperGroupWithItems};
use wallhub_db::repositories::{MainCategoryRepo, SubCategoryRepo, WallpaperGroupRepo};

use crate::engine::receive::{UploadForm, UploadedFile};
use crate::error::{AppError, AppResult};

/// A batch that passed validation.
#[derive(Debug, Clone, Copy)]
struct Target {
    main_category_id: DbId,
    sub_category_id: DbId,
    kind: WallpaperKind,
}

/// Process a received upload and return the target group with all items.
///
/// Validation failures remove the stored files and touch no group. The
/// group is created on the first append, so a batch that fails before any
/// item is stored leaves nothing behind.
pub async fn upload_wallpapers(
    pool: &PgPool,
    transformer: &dyn MediaTransformer,
    settings: &TransformSettings,
    form: UploadForm,
) -> AppResult<WallpaperGroupWithItems> {
    let target = match validate(pool, &form).await {
        Ok(target) => target,
        Err(e) => {
            form.discard_files().await;
            return Err(e);
        }
    };
    let titles = wallpaper::parse_titles(&form.titles);

    let mut group_id = WallpaperGroupRepo::find_by_key(
        pool,
        target.main_category_id,
        target.sub_category_id,
        target.kind.as_str(),
    )
    .await?
    .map(|g| g.id);

    tracing::info!(
        main_category_id = target.main_category_id,
        sub_category_id = target.sub_category_id,
        kind = %target.kind,
        files = form.files.len(),
        existing_group = ?group_id,
        "Processing upload"
    );

    for (index, file) in form.files.iter().enumerate() {
        let title = wallpaper::resolve_title(&titles, index, &file.original_name);
        let stored =
            store_item(pool, transformer, settings, target, &mut group_id, title, file).await;
        if let Err(e) = stored {
            // Files from here on will never be referenced by an item.
            form.discard_files_from(index).await;
            return Err(e);
        }
        tracing::info!(group_id = ?group_id, index, file = %file.original_name, "Appended item");
    }

    let Some(id) = group_id else {
        return Err(CoreError::Internal("Upload finished without a group".into()).into());
    };
    WallpaperGroupRepo::find_with_items(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "WallpaperGroup",
            id,
        }))
}

/// Derive media for one file and append it, creating the group on first use.
async fn store_item(
    pool: &PgPool,
    transformer: &dyn MediaTransformer,
    settings: &TransformSettings,
    target: Target,
    group_id: &mut Option<DbId>,
    title: String,
    file: &UploadedFile,
) -> AppResult<()> {
    let (file_url, snapshot_url) = resolve_media(transformer, settings, target.kind, file).await?;

    let id = match *group_id {
        Some(id) => id,
        None => {
            let group = WallpaperGroupRepo::upsert_by_key(
                pool,
                target.main_category_id,
                target.sub_category_id,
                target.kind.as_str(),
            )
            .await?;
            *group_id.insert(group.id)
        }
    };

    WallpaperGroupRepo::append_item(
        pool,
        id,
        &NewWallpaperItem {
            title,
            file_url,
            snapshot_url,
        },
    )
    .await?;
    Ok(())
}

/// Parse the raw fields and check the categories exist and are related.
async fn validate(pool: &PgPool, form: &UploadForm) -> AppResult<Target> {
    let kind = WallpaperKind::parse(form.kind.as_deref())?;
    let main = wallpaper::parse_category_id("mainCategory", form.main_category.as_deref())?;
    let sub = wallpaper::parse_category_id("subCategory", form.sub_category.as_deref())?;
    let (main_category_id, sub_category_id) =
        wallpaper::validate_upload_batch(main, sub, form.files.len())?;

    if MainCategoryRepo::find_by_id(pool, main_category_id).await?.is_none() {
        return Err(CoreError::Validation(format!(
            "Main category {main_category_id} does not exist"
        ))
        .into());
    }
    match SubCategoryRepo::find_by_id(pool, sub_category_id).await? {
        Some(sub) if sub.main_category_id == main_category_id => {}
        Some(_) => {
            return Err(CoreError::Validation(format!(
                "Subcategory {sub_category_id} does not belong to main category {main_category_id}"
            ))
            .into())
        }
        None => {
            return Err(CoreError::Validation(format!(
                "Subcategory {sub_category_id} does not exist"
            ))
            .into())
        }
    }

    Ok(Target {
        main_category_id,
        sub_category_id,
        kind,
    })
}

/// Public `(fileUrl, snapshotUrl)` for one stored file.
///
/// Live uploads that look like video are trimmed and snapshotted; anything
/// else is served as uploaded.
async fn resolve_media(
    transformer: &dyn MediaTransformer,
    settings: &TransformSettings,
    kind: WallpaperKind,
    file: &UploadedFile,
) -> Result<(String, Option<String>), TransformError> {
    if kind == WallpaperKind::Live {
        if media::looks_like_video(file.content_type.as_deref(), &file.original_name) {
            let derived = media::derive_live_media(transformer, &file.path, settings).await?;
            return Ok((
                uploads::public_url(&derived.trimmed_path),
                Some(uploads::public_url(&derived.snapshot_path)),
            ));
        }
        tracing::warn!(
            file = %file.original_name,
            content_type = ?file.content_type,
            "Live upload is not a video, storing as-is"
        );
    }
    Ok((uploads::public_url(&file.path), None))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct CountingTransformer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MediaTransformer for CountingTransformer {
        async fn trim(&self, source: &Path, _max: f64) -> Result<PathBuf, TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = source.file_name().unwrap().to_string_lossy();
            Ok(source.with_file_name(uploads::trimmed_file_name(&name)))
        }

        async fn snapshot(&self, video: &Path, _offset: f64, _w: u32) -> Result<PathBuf, TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(video.with_file_name("snapshot_x.jpg"))
        }
    }

    struct FailingTransformer;

    #[async_trait]
    impl MediaTransformer for FailingTransformer {
        async fn trim(&self, source: &Path, _max: f64) -> Result<PathBuf, TransformError> {
            Err(TransformError::NotVideo(source.to_string_lossy().to_string()))
        }

        async fn snapshot(&self, _v: &Path, _o: f64, _w: u32) -> Result<PathBuf, TransformError> {
            unreachable!("trim always fails")
        }
    }

    fn stored(name: &str, content_type: Option<&str>) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            path: PathBuf::from("uploads").join(format!("100_{name}")),
            size_bytes: 10,
        }
    }

    #[tokio::test]
    async fn static_files_are_served_as_uploaded() {
        let t = CountingTransformer::default();
        let (url, snap) = resolve_media(
            &t,
            &TransformSettings::default(),
            WallpaperKind::Static,
            &stored("clip.mp4", Some("video/mp4")),
        )
        .await
        .unwrap();

        assert_eq!(url, "/uploads/100_clip.mp4");
        assert_eq!(snap, None);
        assert_eq!(t.calls.load(Ordering::SeqCst), 0, "static never transforms");
    }

    #[tokio::test]
    async fn live_video_uses_derived_files() {
        let t = CountingTransformer::default();
        let (url, snap) = resolve_media(
            &t,
            &TransformSettings::default(),
            WallpaperKind::Live,
            &stored("clip.mp4", Some("video/mp4")),
        )
        .await
        .unwrap();

        assert_eq!(url, "/uploads/trimmed_100_clip.mp4");
        assert_eq!(snap.as_deref(), Some("/uploads/snapshot_x.jpg"));
        assert_eq!(t.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn live_non_video_skips_transform() {
        let t = CountingTransformer::default();
        let (url, snap) = resolve_media(
            &t,
            &TransformSettings::default(),
            WallpaperKind::Live,
            &stored("photo.jpg", Some("image/jpeg")),
        )
        .await
        .unwrap();

        assert_eq!(url, "/uploads/100_photo.jpg");
        assert_eq!(snap, None);
        assert_eq!(t.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn live_transform_failure_propagates() {
        let result = resolve_media(
            &FailingTransformer,
            &TransformSettings::default(),
            WallpaperKind::Live,
            &stored("broken.mov", None),
        )
        .await;
        assert_matches!(result, Err(TransformError::NotVideo(_)));
    }
}
