//! FirmService: the "our firms" directory.

use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        Page,
        firm::{Firm, FirmPatch, NewFirm},
    },
    services::{
        store::{
            SlugTable, StoreError, StoreResult, contains_pattern, ensure_slug_available,
            map_unique_violation, non_blank, resolve_slug,
        },
        upload_service::UploadService,
    },
    utils::pagination::paginate,
};

const FIRM_COLUMNS: &str = "id, name, slug, description, image, created_at, updated_at";

#[derive(Clone)]
pub struct FirmService {
    db: Arc<SqlitePool>,
    uploads: UploadService,
}

impl FirmService {
    pub fn new(db: Arc<SqlitePool>, uploads: UploadService) -> Self {
        Self { db, uploads }
    }

    /// Newest first; `search` matches name or description.
    pub async fn list(&self, search: Option<&str>, page: u64, limit: u64) -> StoreResult<Page<Firm>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM firms WHERE 1 = 1");
        push_search(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(&*self.db).await?;
        let pagination = paginate(total.max(0) as u64, page, limit);

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {FIRM_COLUMNS} FROM firms WHERE 1 = 1"));
        push_search(&mut select, search);
        select.push(" ORDER BY created_at DESC LIMIT ");
        select.push_bind(pagination.sql_limit());
        select.push(" OFFSET ");
        select.push_bind(pagination.sql_offset());
        let items = select.build_query_as::<Firm>().fetch_all(&*self.db).await?;

        Ok(Page { items, pagination })
    }

    pub async fn get_by_id(&self, id: Uuid) -> StoreResult<Firm> {
        sqlx::query_as::<_, Firm>(&format!("SELECT {FIRM_COLUMNS} FROM firms WHERE id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(StoreError::NotFound("Firm"))
    }

    pub async fn get_by_slug(&self, slug: &str) -> StoreResult<Firm> {
        sqlx::query_as::<_, Firm>(&format!("SELECT {FIRM_COLUMNS} FROM firms WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(StoreError::NotFound("Firm"))
    }

    /// Insert a firm; the slug defaults to `slugify(name)`.
    pub async fn create(&self, input: NewFirm) -> StoreResult<Firm> {
        input.validate()?;
        let name = non_blank(input.name).unwrap_or_default();
        let slug = resolve_slug(input.slug.as_deref(), Some(name.as_str()))?;
        ensure_slug_available(&self.db, SlugTable::Firms, &slug, None).await?;

        let now = Utc::now();
        let firm = sqlx::query_as::<_, Firm>(&format!(
            "INSERT INTO firms ({FIRM_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {FIRM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(&slug)
        .bind(non_blank(input.description))
        .bind(non_blank(input.image))
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| map_unique_violation(err, &slug))?;

        info!(id = %firm.id, slug = %firm.slug, "created firm");
        Ok(firm)
    }

    /// Merge `patch` into the stored firm.
    ///
    /// Slug precedence: an explicit slug, else `slugify` of a newly sent name,
    /// else the stored slug.
    pub async fn update(&self, id: Uuid, patch: FirmPatch) -> StoreResult<Firm> {
        patch.validate()?;
        let existing = self.get_by_id(id).await?;

        let sent_name = patch.name.map(|n| n.trim().to_string());
        let name = sent_name.clone().unwrap_or_else(|| existing.name.clone());
        let image = patch
            .image
            .map(|i| i.trim().to_string())
            .unwrap_or_else(|| existing.image.clone());

        let slug = match (non_blank(patch.slug), sent_name) {
            (Some(explicit), _) => resolve_slug(Some(explicit.as_str()), None)?,
            (None, Some(name)) => resolve_slug(None, Some(name.as_str()))?,
            (None, None) => existing.slug.clone(),
        };
        if slug != existing.slug {
            ensure_slug_available(&self.db, SlugTable::Firms, &slug, Some(id)).await?;
        }

        let description = match patch.description {
            Some(value) => non_blank(value),
            None => existing.description.clone(),
        };

        let firm = sqlx::query_as::<_, Firm>(&format!(
            "UPDATE firms SET name = ?, slug = ?, description = ?, image = ?, updated_at = ?
             WHERE id = ?
             RETURNING {FIRM_COLUMNS}"
        ))
        .bind(&name)
        .bind(&slug)
        .bind(description)
        .bind(&image)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(|err| map_unique_violation(err, &slug))?
        .ok_or(StoreError::NotFound("Firm"))?;

        if existing.image != firm.image {
            self.uploads.release_url(&existing.image).await;
        }

        info!(id = %firm.id, slug = %firm.slug, "updated firm");
        Ok(firm)
    }

    /// Delete a firm, then best-effort release its logo if we stored it.
    pub async fn delete(&self, id: Uuid) -> StoreResult<Firm> {
        let firm = sqlx::query_as::<_, Firm>(&format!(
            "DELETE FROM firms WHERE id = ? RETURNING {FIRM_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Firm"))?;

        self.uploads.release_url(&firm.image).await;

        info!(id = %firm.id, slug = %firm.slug, "deleted firm");
        Ok(firm)
    }
}

fn push_search(builder: &mut QueryBuilder<'_, Sqlite>, search: Option<&str>) {
    if let Some(search) = search {
        let pattern = contains_pattern(search);
        builder.push(" AND (name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR description LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
}
