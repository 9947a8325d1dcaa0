//! PartnerService: the "our work partners" directory.

use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        Page,
        partner::{NewPartner, Partner, PartnerPatch},
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

const PARTNER_COLUMNS: &str = "id, name, title_name, slug, image, created_at, updated_at";

#[derive(Clone)]
pub struct PartnerService {
    db: Arc<SqlitePool>,
    uploads: UploadService,
}

impl PartnerService {
    pub fn new(db: Arc<SqlitePool>, uploads: UploadService) -> Self {
        Self { db, uploads }
    }

    /// Newest first; `search` matches name or title name.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: u64,
        limit: u64,
    ) -> StoreResult<Page<Partner>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM partners WHERE 1 = 1");
        push_search(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(&*self.db).await?;
        let pagination = paginate(total.max(0) as u64, page, limit);

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PARTNER_COLUMNS} FROM partners WHERE 1 = 1"
        ));
        push_search(&mut select, search);
        select.push(" ORDER BY created_at DESC LIMIT ");
        select.push_bind(pagination.sql_limit());
        select.push(" OFFSET ");
        select.push_bind(pagination.sql_offset());
        let items = select.build_query_as::<Partner>().fetch_all(&*self.db).await?;

        Ok(Page { items, pagination })
    }

    pub async fn get_by_id(&self, id: Uuid) -> StoreResult<Partner> {
        sqlx::query_as::<_, Partner>(&format!(
            "SELECT {PARTNER_COLUMNS} FROM partners WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Partner"))
    }

    pub async fn get_by_slug(&self, slug: &str) -> StoreResult<Partner> {
        sqlx::query_as::<_, Partner>(&format!(
            "SELECT {PARTNER_COLUMNS} FROM partners WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Partner"))
    }

    /// Insert a partner. `titleName` and `image` are required; the slug is
    /// required too but falls back to `slugify(name)`.
    pub async fn create(&self, input: NewPartner) -> StoreResult<Partner> {
        input.validate()?;
        let name = non_blank(input.name);
        let slug = resolve_slug(input.slug.as_deref(), name.as_deref())?;
        ensure_slug_available(&self.db, SlugTable::Partners, &slug, None).await?;

        let now = Utc::now();
        let partner = sqlx::query_as::<_, Partner>(&format!(
            "INSERT INTO partners ({PARTNER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {PARTNER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(non_blank(input.title_name))
        .bind(&slug)
        .bind(non_blank(input.image))
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| map_unique_violation(err, &slug))?;

        info!(id = %partner.id, slug = %partner.slug, "created partner");
        Ok(partner)
    }

    /// Merge `patch` into the stored partner, re-deriving the slug from a
    /// newly sent name when no explicit slug accompanies it.
    pub async fn update(&self, id: Uuid, patch: PartnerPatch) -> StoreResult<Partner> {
        patch.validate()?;
        let existing = self.get_by_id(id).await?;

        let sent_name = patch.name.map(|n| n.trim().to_string());
        let name = match &sent_name {
            Some(n) if !n.is_empty() => Some(n.clone()),
            Some(_) => None,
            None => existing.name.clone(),
        };
        let title_name = patch
            .title_name
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| existing.title_name.clone());
        let image = patch
            .image
            .map(|i| i.trim().to_string())
            .unwrap_or_else(|| existing.image.clone());

        let slug = match (non_blank(patch.slug), sent_name.filter(|n| !n.is_empty())) {
            (Some(explicit), _) => resolve_slug(Some(explicit.as_str()), None)?,
            (None, Some(name)) => resolve_slug(None, Some(name.as_str()))?,
            (None, None) => existing.slug.clone(),
        };
        if slug != existing.slug {
            ensure_slug_available(&self.db, SlugTable::Partners, &slug, Some(id)).await?;
        }

        let partner = sqlx::query_as::<_, Partner>(&format!(
            "UPDATE partners SET name = ?, title_name = ?, slug = ?, image = ?, updated_at = ?
             WHERE id = ?
             RETURNING {PARTNER_COLUMNS}"
        ))
        .bind(name)
        .bind(&title_name)
        .bind(&slug)
        .bind(&image)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(|err| map_unique_violation(err, &slug))?
        .ok_or(StoreError::NotFound("Partner"))?;

        if existing.image != partner.image {
            self.uploads.release_url(&existing.image).await;
        }

        info!(id = %partner.id, slug = %partner.slug, "updated partner");
        Ok(partner)
    }

    /// Delete a partner, then best-effort release its logo if we stored it.
    pub async fn delete(&self, id: Uuid) -> StoreResult<Partner> {
        let partner = sqlx::query_as::<_, Partner>(&format!(
            "DELETE FROM partners WHERE id = ? RETURNING {PARTNER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Partner"))?;

        self.uploads.release_url(&partner.image).await;

        info!(id = %partner.id, slug = %partner.slug, "deleted partner");
        Ok(partner)
    }
}

fn push_search(builder: &mut QueryBuilder<'_, Sqlite>, search: Option<&str>) {
    if let Some(search) = search {
        let pattern = contains_pattern(search);
        builder.push(" AND (name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR title_name LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn service() -> (PartnerService, tempfile::TempDir) {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        db::migrate(&pool).await.unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(tmp.path(), "/uploads");
        (PartnerService::new(Arc::new(pool), uploads), tmp)
    }

    fn new_partner(name: Option<&str>) -> NewPartner {
        NewPartner {
            name: name.map(Into::into),
            title_name: Some("Logistics partner".into()),
            image: Some("https://cdn.example.com/p.png".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn slug_comes_from_name_or_is_required() {
        let (svc, _tmp) = service().await;
        let partner = svc.create(new_partner(Some("Blue Line Freight"))).await.unwrap();
        assert_eq!(partner.slug, "blue-line-freight");

        let err = svc.create(new_partner(None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref msg) if msg.starts_with("slug")));

        let anonymous = svc
            .create(NewPartner {
                slug: Some("anon".into()),
                ..new_partner(None)
            })
            .await
            .unwrap();
        assert!(anonymous.name.is_none());
        assert_eq!(anonymous.slug, "anon");
    }

    #[tokio::test]
    async fn title_name_is_required() {
        let (svc, _tmp) = service().await;
        let err = svc
            .create(NewPartner {
                title_name: None,
                ..new_partner(Some("X"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: titleName");

        let partner = svc.create(new_partner(Some("Y"))).await.unwrap();
        let err = svc
            .update(
                partner.id,
                PartnerPatch {
                    title_name: Some("   ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: titleName");
        assert_eq!(svc.get_by_id(partner.id).await.unwrap().title_name, "Logistics partner");
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts_on_create_and_update() {
        let (svc, _tmp) = service().await;
        svc.create(new_partner(Some("Alpha"))).await.unwrap();
        let beta = svc.create(new_partner(Some("Beta"))).await.unwrap();

        assert!(matches!(
            svc.create(new_partner(Some("alpha"))).await,
            Err(StoreError::SlugConflict(_))
        ));
        assert!(matches!(
            svc.update(
                beta.id,
                PartnerPatch {
                    name: Some("Alpha".into()),
                    ..Default::default()
                }
            )
            .await,
            Err(StoreError::SlugConflict(_))
        ));
        assert_eq!(svc.get_by_id(beta.id).await.unwrap().slug, "beta");
    }

    #[tokio::test]
    async fn rename_rederives_slug() {
        let (svc, _tmp) = service().await;
        let p = svc.create(new_partner(Some("Gamma"))).await.unwrap();
        let renamed = svc
            .update(
                p.id,
                PartnerPatch {
                    name: Some("Gamma Group".into()),
                    title_name: Some("Strategic partner".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.slug, "gamma-group");
        assert_eq!(renamed.title_name, "Strategic partner");
        assert_eq!(svc.get_by_slug("gamma-group").await.unwrap().id, p.id);
    }

    #[tokio::test]
    async fn search_and_delete() {
        let (svc, _tmp) = service().await;
        let p = svc.create(new_partner(Some("Delta Shipping"))).await.unwrap();
        assert_eq!(svc.list(Some("shipping"), 1, 20).await.unwrap().items.len(), 1);
        assert_eq!(svc.list(Some("logistics"), 1, 20).await.unwrap().items.len(), 1);

        svc.delete(p.id).await.unwrap();
        assert_eq!(svc.list(None, 1, 20).await.unwrap().pagination.total, 0);
    }
}
