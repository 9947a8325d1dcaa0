//! MediaService: gallery items, their derived slugs, view counting and the
//! uploaded image file each item owns.

use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite, types::Json};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        Page,
        media::{Media, MediaFilter, MediaPatch, NewMedia},
    },
    services::{
        store::{
            SlugTable, StoreError, StoreResult, contains_pattern, ensure_slug_available,
            map_unique_violation, non_blank, normalize_set, resolve_slug,
        },
        upload_service::UploadService,
    },
    utils::pagination::paginate,
};

const MEDIA_COLUMNS: &str = "id, title, slug, description, link, image, file_name, category, \
     tags, featured, view_count, created_at, updated_at";

#[derive(Clone)]
pub struct MediaService {
    db: Arc<SqlitePool>,
    uploads: UploadService,
}

impl MediaService {
    pub fn new(db: Arc<SqlitePool>, uploads: UploadService) -> Self {
        Self { db, uploads }
    }

    /// List items matching `filter`, newest first.
    pub async fn list(&self, filter: &MediaFilter, page: u64, limit: u64) -> StoreResult<Page<Media>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM media WHERE 1 = 1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&*self.db).await?;
        let pagination = paginate(total.max(0) as u64, page, limit);

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {MEDIA_COLUMNS} FROM media WHERE 1 = 1"));
        push_filters(&mut select, filter);
        select.push(" ORDER BY created_at DESC LIMIT ");
        select.push_bind(pagination.sql_limit());
        select.push(" OFFSET ");
        select.push_bind(pagination.sql_offset());
        let items = select.build_query_as::<Media>().fetch_all(&*self.db).await?;

        Ok(Page { items, pagination })
    }

    /// Lookup by id for writes. Does not count as a view.
    pub async fn get_by_id(&self, id: Uuid) -> StoreResult<Media> {
        sqlx::query_as::<_, Media>(&format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(StoreError::NotFound("Media"))
    }

    /// Public detail read: bumps `view_count` by one in the same statement
    /// and returns the item as it is after the increment.
    pub async fn view_by_slug(&self, slug: &str) -> StoreResult<Media> {
        sqlx::query_as::<_, Media>(&format!(
            "UPDATE media SET view_count = view_count + 1 WHERE slug = ? RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(slug)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Media"))
    }

    /// Admin detail read. Counts a view the same way as [`Self::view_by_slug`].
    pub async fn view_by_id(&self, id: Uuid) -> StoreResult<Media> {
        sqlx::query_as::<_, Media>(&format!(
            "UPDATE media SET view_count = view_count + 1 WHERE id = ? RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Media"))
    }

    /// Validate and insert a new item. Its slug is derived from the title.
    pub async fn create(&self, input: NewMedia) -> StoreResult<Media> {
        input.validate()?;
        let title = non_blank(input.title).unwrap_or_default();
        let description = non_blank(input.description);

        let slug = resolve_slug(None, Some(title.as_str()))?;
        ensure_slug_available(&self.db, SlugTable::Media, &slug, None).await?;

        let now = Utc::now();
        let media = sqlx::query_as::<_, Media>(&format!(
            "INSERT INTO media ({MEDIA_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
             RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&title)
        .bind(&slug)
        .bind(description)
        .bind(non_blank(input.link))
        .bind(non_blank(input.image))
        .bind(non_blank(input.file_name))
        .bind(input.category.unwrap_or_default())
        .bind(Json(normalize_set(input.tags)))
        .bind(input.featured.unwrap_or(false))
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| map_unique_violation(err, &slug))?;

        info!(id = %media.id, slug = %media.slug, "created media");
        Ok(media)
    }

    /// Merge `patch` into the stored item.
    ///
    /// A changed title re-derives the slug. A changed `fileName` releases the
    /// previous file.
    pub async fn update(&self, id: Uuid, patch: MediaPatch) -> StoreResult<Media> {
        patch.validate()?;
        let existing = self.get_by_id(id).await?;

        let title = patch
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| existing.title.clone());
        let image = patch.image.unwrap_or_else(|| existing.image.clone());
        let file_name = patch
            .file_name
            .unwrap_or_else(|| existing.file_name.clone());

        let description = match patch.description {
            Some(value) => non_blank(value),
            None => existing.description.clone(),
        };
        let link = match patch.link {
            Some(value) => non_blank(value),
            None => existing.link.clone(),
        };

        let slug = if title != existing.title {
            let slug = resolve_slug(None, Some(title.as_str()))?;
            ensure_slug_available(&self.db, SlugTable::Media, &slug, Some(id)).await?;
            slug
        } else {
            existing.slug.clone()
        };

        let tags = match patch.tags {
            Some(tags) => normalize_set(tags),
            None => existing.tags.0.clone(),
        };

        let media = sqlx::query_as::<_, Media>(&format!(
            "UPDATE media SET
                title = ?, slug = ?, description = ?, link = ?, image = ?, file_name = ?,
                category = ?, tags = ?, featured = ?, updated_at = ?
             WHERE id = ?
             RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(&title)
        .bind(&slug)
        .bind(description)
        .bind(link)
        .bind(image.trim())
        .bind(file_name.trim())
        .bind(patch.category.unwrap_or(existing.category))
        .bind(Json(tags))
        .bind(patch.featured.unwrap_or(existing.featured))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(|err| map_unique_violation(err, &slug))?
        .ok_or(StoreError::NotFound("Media"))?;

        if existing.file_name != media.file_name {
            self.uploads.release(&existing.file_name).await;
        }

        info!(id = %media.id, slug = %media.slug, "updated media");
        Ok(media)
    }

    /// Delete an item, then best-effort delete its file.
    pub async fn delete(&self, id: Uuid) -> StoreResult<Media> {
        let media = sqlx::query_as::<_, Media>(&format!(
            "DELETE FROM media WHERE id = ? RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Media"))?;

        self.uploads.release(&media.file_name).await;

        info!(id = %media.id, slug = %media.slug, "deleted media");
        Ok(media)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &MediaFilter) {
    if let Some(category) = &filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category.clone());
    }
    if filter.featured_only {
        builder.push(" AND featured = 1");
    }
    if let Some(tag) = &filter.tag {
        builder.push(" AND EXISTS (SELECT 1 FROM json_each(media.tags) WHERE json_each.value = ");
        builder.push_bind(tag.clone());
        builder.push(")");
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        builder.push(" AND (title LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR description LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(
            " ESCAPE '\\' OR EXISTS (SELECT 1 FROM json_each(media.tags) WHERE json_each.value LIKE ",
        );
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\'))");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, models::media::MediaCategory};
    use bytes::Bytes;

    async fn service() -> (MediaService, tempfile::TempDir) {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        db::migrate(&pool).await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(tmp.path(), "/uploads");
        (MediaService::new(Arc::new(pool), uploads), tmp)
    }

    fn new_media(title: &str) -> NewMedia {
        NewMedia {
            title: Some(title.into()),
            image: Some("/uploads/a.jpg".into()),
            file_name: Some("a.jpg".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_derives_slug_and_defaults() {
        let (svc, _tmp) = service().await;
        let media = svc.create(new_media("Sunset Bay")).await.unwrap();
        assert_eq!(media.slug, "sunset-bay");
        assert_eq!(media.category, MediaCategory::Other);
        assert_eq!(media.view_count, 0);
        assert!(!media.featured);
        assert!(media.link.is_none());
    }

    #[tokio::test]
    async fn create_requires_title_image_and_file() {
        let (svc, _tmp) = service().await;
        let err = svc
            .create(NewMedia {
                title: Some("x".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: fileName, image");
    }

    #[tokio::test]
    async fn overly_long_title_is_rejected() {
        let (svc, _tmp) = service().await;
        let err = svc.create(new_media(&"a".repeat(101))).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn titles_normalizing_to_same_slug_conflict() {
        let (svc, _tmp) = service().await;
        svc.create(new_media("Sunset Bay")).await.unwrap();
        let err = svc.create(new_media("sunset   bay!")).await.unwrap_err();
        assert!(matches!(err, StoreError::SlugConflict(_)));
    }

    #[tokio::test]
    async fn each_slug_read_counts_one_view() {
        let (svc, _tmp) = service().await;
        let created = svc.create(new_media("Sunset Bay")).await.unwrap();
        let first = svc.view_by_slug("sunset-bay").await.unwrap();
        let second = svc.view_by_slug("sunset-bay").await.unwrap();
        assert_eq!(first.view_count, 1);
        assert_eq!(second.view_count, first.view_count + 1);

        let by_id = svc.get_by_id(created.id).await.unwrap();
        assert_eq!(by_id.view_count, 2);
        let admin_read = svc.view_by_id(created.id).await.unwrap();
        assert_eq!(admin_read.view_count, 3);
        assert!(matches!(
            svc.view_by_id(Uuid::new_v4()).await,
            Err(StoreError::NotFound("Media"))
        ));
        assert!(matches!(
            svc.view_by_slug("missing").await,
            Err(StoreError::NotFound("Media"))
        ));
    }

    #[tokio::test]
    async fn retitling_regenerates_slug() {
        let (svc, _tmp) = service().await;
        let media = svc.create(new_media("Sunset Bay")).await.unwrap();

        let same_title = svc
            .update(
                media.id,
                MediaPatch {
                    featured: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same_title.slug, "sunset-bay");
        assert!(same_title.featured);

        let renamed = svc
            .update(
                media.id,
                MediaPatch {
                    title: Some("Sunrise Cove".into()),
                    link: Some(Some("https://example.com".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.slug, "sunrise-cove");
        assert_eq!(renamed.link.as_deref(), Some("https://example.com"));

        let cleared = svc
            .update(
                media.id,
                MediaPatch {
                    link: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.link.is_none());
        assert_eq!(cleared.slug, "sunrise-cove");
    }

    #[tokio::test]
    async fn retitling_onto_a_taken_slug_conflicts() {
        let (svc, _tmp) = service().await;
        svc.create(new_media("One")).await.unwrap();
        let two = svc.create(new_media("Two")).await.unwrap();
        let err = svc
            .update(
                two.id,
                MediaPatch {
                    title: Some("ONE".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SlugConflict(_)));
    }

    #[tokio::test]
    async fn filters_combine() {
        let (svc, _tmp) = service().await;
        svc.create(NewMedia {
            category: Some(MediaCategory::Nature),
            tags: vec!["Forest".into()],
            featured: Some(true),
            description: Some("Tall pines at dawn".into()),
            ..new_media("Pines")
        })
        .await
        .unwrap();
        svc.create(NewMedia {
            category: Some(MediaCategory::Abstract),
            ..new_media("Shapes")
        })
        .await
        .unwrap();

        let count = |filter: MediaFilter| {
            let svc = svc.clone();
            async move { svc.list(&filter, 1, 20).await.unwrap().pagination.total }
        };

        assert_eq!(count(MediaFilter::default()).await, 2);
        assert_eq!(
            count(MediaFilter {
                category: Some("nature".into()),
                ..Default::default()
            })
            .await,
            1
        );
        assert_eq!(
            count(MediaFilter {
                category: Some("sculpture".into()),
                ..Default::default()
            })
            .await,
            0
        );
        assert_eq!(
            count(MediaFilter {
                featured_only: true,
                ..Default::default()
            })
            .await,
            1
        );
        for term in ["PINES", "dawn", "forest"] {
            assert_eq!(
                count(MediaFilter {
                    search: Some(term.into()),
                    ..Default::default()
                })
                .await,
                1,
                "search {term}"
            );
        }
        assert_eq!(
            count(MediaFilter {
                search: Some("%".into()),
                ..Default::default()
            })
            .await,
            0
        );
    }

    #[tokio::test]
    async fn delete_removes_record_and_file() {
        let (svc, tmp) = service().await;
        let stored = svc
            .uploads
            .store(Bytes::from_static(b"img"), "photo.jpg")
            .await
            .unwrap();
        let media = svc
            .create(NewMedia {
                image: Some(stored.url.clone()),
                file_name: Some(stored.stored_name.clone()),
                ..new_media("Photo")
            })
            .await
            .unwrap();

        svc.delete(media.id).await.unwrap();
        assert!(!tmp.path().join(&stored.stored_name).exists());
        assert!(matches!(svc.get_by_id(media.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_succeeds_when_file_already_gone() {
        let (svc, _tmp) = service().await;
        let media = svc.create(new_media("Ghost")).await.unwrap();
        svc.delete(media.id).await.unwrap();
        assert!(matches!(svc.delete(media.id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn replacing_file_releases_previous_one() {
        let (svc, tmp) = service().await;
        let old = svc.uploads.store(Bytes::from_static(b"old"), "o.png").await.unwrap();
        let new = svc.uploads.store(Bytes::from_static(b"new"), "n.png").await.unwrap();
        let media = svc
            .create(NewMedia {
                image: Some(old.url.clone()),
                file_name: Some(old.stored_name.clone()),
                ..new_media("Swap")
            })
            .await
            .unwrap();

        svc.update(
            media.id,
            MediaPatch {
                image: Some(new.url.clone()),
                file_name: Some(new.stored_name.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(!tmp.path().join(&old.stored_name).exists());
        assert!(tmp.path().join(&new.stored_name).exists());
    }
}
