//! BlogService: persistence and validation for blog posts.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite, types::Json};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{
        Page,
        blog::{Blog, BlogDetail, BlogFilter, BlogInput},
    },
    services::{
        store::{
            SlugTable, StoreError, StoreResult, ensure_slug_available, map_unique_violation,
            normalize_set, resolve_slug,
        },
        upload_service::UploadService,
    },
    utils::pagination::paginate,
};

const BLOG_COLUMNS: &str = "id, title, slug, excerpt, content, featured_image, author, \
     categories, tags, is_published, published_at, meta_title, meta_description, \
     created_at, updated_at";

/// Newest publish date first, then newest created.
const BLOG_ORDER: &str = " ORDER BY published_at DESC, created_at DESC";

/// Admin listings follow creation order instead.
const ADMIN_ORDER: &str = " ORDER BY created_at DESC";

const RELATED_LIMIT: i64 = 3;

#[derive(Clone)]
pub struct BlogService {
    db: Arc<SqlitePool>,
    uploads: UploadService,
}

/// A validated [`BlogInput`].
struct BlogDraft {
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    featured_image: String,
    author: String,
    categories: Vec<String>,
    tags: Vec<String>,
    is_published: bool,
    published_at: Option<DateTime<Utc>>,
    meta_title: String,
    meta_description: String,
}

impl BlogDraft {
    fn from_input(input: BlogInput) -> StoreResult<Self> {
        input.validate()?;
        let slug = resolve_slug(input.slug.as_deref(), None)?;

        Ok(Self {
            title: trimmed(input.title),
            slug,
            excerpt: trimmed(input.excerpt),
            content: input.content.unwrap_or_default(),
            featured_image: trimmed(input.featured_image),
            author: trimmed(input.author),
            categories: normalize_set(input.categories),
            tags: normalize_set(input.tags),
            is_published: input.is_published.unwrap_or(true),
            published_at: input.published_at,
            meta_title: trimmed(input.meta_title),
            meta_description: trimmed(input.meta_description),
        })
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

impl BlogService {
    pub fn new(db: Arc<SqlitePool>, uploads: UploadService) -> Self {
        Self { db, uploads }
    }

    /// List posts matching `filter`. Public listings sort by publish date,
    /// admin listings by creation date.
    pub async fn list(&self, filter: &BlogFilter, page: u64, limit: u64) -> StoreResult<Page<Blog>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM blogs WHERE 1 = 1");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&*self.db).await?;
        let pagination = paginate(total.max(0) as u64, page, limit);

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE 1 = 1"));
        push_filters(&mut select, filter);
        select.push(if filter.by_publish_date { BLOG_ORDER } else { ADMIN_ORDER });
        select.push(" LIMIT ");
        select.push_bind(pagination.sql_limit());
        select.push(" OFFSET ");
        select.push_bind(pagination.sql_offset());
        let items = select.build_query_as::<Blog>().fetch_all(&*self.db).await?;

        Ok(Page { items, pagination })
    }

    pub async fn get_by_id(&self, id: Uuid) -> StoreResult<Blog> {
        sqlx::query_as::<_, Blog>(&format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(StoreError::NotFound("Blog"))
    }

    pub async fn get_by_slug(&self, slug: &str) -> StoreResult<Blog> {
        sqlx::query_as::<_, Blog>(&format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE slug = ?"))
        .bind(slug)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Blog"))
    }

    /// Post by slug plus up to three other posts sharing a category or tag
    /// with it.
    pub async fn detail_by_slug(&self, slug: &str) -> StoreResult<BlogDetail> {
        let blog = self.get_by_slug(slug).await?;
        let related_blogs = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs
             WHERE id != ? AND (
                 EXISTS (SELECT 1 FROM json_each(blogs.categories) c
                         WHERE c.value IN (SELECT value FROM json_each(?)))
                 OR EXISTS (SELECT 1 FROM json_each(blogs.tags) t
                            WHERE t.value IN (SELECT value FROM json_each(?)))
             ){BLOG_ORDER} LIMIT ?"
        ))
        .bind(blog.id)
        .bind(blog.categories.clone())
        .bind(blog.tags.clone())
        .bind(RELATED_LIMIT)
        .fetch_all(&*self.db)
        .await?;

        Ok(BlogDetail {
            blog,
            related_blogs,
        })
    }

    /// Validate and insert a new post. The slug must be unused.
    pub async fn create(&self, input: BlogInput) -> StoreResult<Blog> {
        let draft = BlogDraft::from_input(input)?;
        ensure_slug_available(&self.db, SlugTable::Blogs, &draft.slug, None).await?;

        let now = Utc::now();
        let blog = sqlx::query_as::<_, Blog>(&format!(
            "INSERT INTO blogs ({BLOG_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {BLOG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.featured_image)
        .bind(&draft.author)
        .bind(Json(&draft.categories))
        .bind(Json(&draft.tags))
        .bind(draft.is_published)
        .bind(draft.published_at.unwrap_or(now))
        .bind(&draft.meta_title)
        .bind(&draft.meta_description)
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| map_unique_violation(err, &draft.slug))?;

        info!(id = %blog.id, slug = %blog.slug, "created blog");
        Ok(blog)
    }

    /// Replace every editable field of a post.
    ///
    /// `published_at` keeps its stored value when the input omits it. A
    /// replaced featured image that lived in our upload area is released.
    pub async fn update(&self, id: Uuid, input: BlogInput) -> StoreResult<Blog> {
        let draft = BlogDraft::from_input(input)?;
        let existing = self.get_by_id(id).await?;
        ensure_slug_available(&self.db, SlugTable::Blogs, &draft.slug, Some(id)).await?;

        let blog = sqlx::query_as::<_, Blog>(&format!(
            "UPDATE blogs SET
                title = ?, slug = ?, excerpt = ?, content = ?, featured_image = ?,
                author = ?, categories = ?, tags = ?, is_published = ?, published_at = ?,
                meta_title = ?, meta_description = ?, updated_at = ?
             WHERE id = ?
             RETURNING {BLOG_COLUMNS}"
        ))
        .bind(&draft.title)
        .bind(&draft.slug)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(&draft.featured_image)
        .bind(&draft.author)
        .bind(Json(&draft.categories))
        .bind(Json(&draft.tags))
        .bind(draft.is_published)
        .bind(draft.published_at.unwrap_or(existing.published_at))
        .bind(&draft.meta_title)
        .bind(&draft.meta_description)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&*self.db)
        .await
        .map_err(|err| map_unique_violation(err, &draft.slug))?
        .ok_or(StoreError::NotFound("Blog"))?;

        if existing.featured_image != blog.featured_image {
            self.uploads.release_url(&existing.featured_image).await;
        }

        info!(id = %blog.id, slug = %blog.slug, "updated blog");
        Ok(blog)
    }

    /// Delete a post, then best-effort release its featured image.
    pub async fn delete(&self, id: Uuid) -> StoreResult<Blog> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            "DELETE FROM blogs WHERE id = ? RETURNING {BLOG_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(StoreError::NotFound("Blog"))?;

        self.uploads.release_url(&blog.featured_image).await;

        info!(id = %blog.id, slug = %blog.slug, "deleted blog");
        Ok(blog)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &BlogFilter) {
    if let Some(category) = &filter.category {
        builder.push(" AND EXISTS (SELECT 1 FROM json_each(blogs.categories) WHERE json_each.value = ");
        builder.push_bind(category.clone());
        builder.push(")");
    }
    if let Some(tag) = &filter.tag {
        builder.push(" AND EXISTS (SELECT 1 FROM json_each(blogs.tags) WHERE json_each.value = ");
        builder.push_bind(tag.clone());
        builder.push(")");
    }
}
