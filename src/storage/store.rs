use chrono::{DateTime, Local};

use crate::{
    error::{Error, Result},
    storage::{DBPool, NewPost, Post},
    taxonomy::{EntityRef, TaxonomyKind},
};

/// 流水线消费的持久化接口
///
/// 实现必须以唯一约束保证 slug 的唯一性，而不是先查询后写入。
pub trait Store {
    /// 按 slug 获取或创建分类/标签
    ///
    /// 已存在时原样返回，不修改展示名。
    fn upsert_taxonomy(
        &self,
        kind: TaxonomyKind,
        slug: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<EntityRef>>;

    /// 查询文章 slug 是否已被占用
    fn post_slug_exists(&self, slug: &str) -> impl std::future::Future<Output = Result<bool>>;

    /// 写入文章
    ///
    /// slug 冲突时返回 [`Error::SlugTaken`]，绝不覆盖已有文章。
    fn insert_post(&self, post: NewPost) -> impl std::future::Future<Output = Result<Post>>;

    /// 按固定 key 获取或创建默认作者，返回作者 id
    fn ensure_default_author(
        &self,
        key: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<i64>>;
}

/// 为引用实现 [`Store`]，便于调用方保留所有权
impl<S: Store> Store for &S {
    fn upsert_taxonomy(
        &self,
        kind: TaxonomyKind,
        slug: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<EntityRef>> {
        (**self).upsert_taxonomy(kind, slug, name)
    }

    fn post_slug_exists(&self, slug: &str) -> impl std::future::Future<Output = Result<bool>> {
        (**self).post_slug_exists(slug)
    }

    fn insert_post(&self, post: NewPost) -> impl std::future::Future<Output = Result<Post>> {
        (**self).insert_post(post)
    }

    fn ensure_default_author(
        &self,
        key: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<i64>> {
        (**self).ensure_default_author(key, name)
    }
}

/// 基于 Postgres 的 [`Store`] 实现
#[derive(Clone)]
pub struct PgStore {
    pool: DBPool,
}

impl PgStore {
    pub fn new(pool: DBPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DBPool {
        &self.pool
    }
}

const POST_SLUG_CONSTRAINT: &str = "posts_slug_key";

fn is_slug_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(POST_SLUG_CONSTRAINT)
        }
        _ => false,
    }
}

impl Store for PgStore {
    async fn upsert_taxonomy(
        &self,
        kind: TaxonomyKind,
        slug: &str,
        name: &str,
    ) -> Result<EntityRef> {
        // 冲突时做一次空更新，使 RETURNING 也能返回已有行
        let sql = format!(
            r#"
            INSERT INTO {table} (slug, name)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE
            SET slug = EXCLUDED.slug
            RETURNING id, slug, name
            "#,
            table = kind.table()
        );

        Ok(sqlx::query_as::<_, EntityRef>(&sql)
            .bind(slug)
            .bind(name)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn post_slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let inserted: std::result::Result<(i64, DateTime<Local>), sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO posts
                (title, slug, excerpt, body, meta_description, keywords, status,
                 published_at, author_id, reading_time_minutes, cover_image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, created_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.body)
        .bind(&post.meta_description)
        .bind(&post.keywords)
        .bind(post.status.as_str())
        .bind(post.published_at)
        .bind(post.author_id)
        .bind(post.reading_time_minutes)
        .bind(&post.cover_image_url)
        .fetch_one(tx.as_mut())
        .await;

        let (id, created_at) = match inserted {
            Ok(row) => row,
            Err(e) if is_slug_conflict(&e) => return Err(Error::SlugTaken(post.slug)),
            Err(e) => return Err(e.into()),
        };

        sqlx::query(
            "INSERT INTO post_categories (post_id, category_id) SELECT $1, UNNEST($2::BIGINT[])",
        )
        .bind(id)
        .bind(&post.category_ids)
        .execute(tx.as_mut())
        .await?;

        sqlx::query("INSERT INTO post_tags (post_id, tag_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(id)
            .bind(&post.tag_ids)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

        Ok(Post::from_new(id, created_at, post))
    }

    async fn ensure_default_author(&self, key: &str, name: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO authors (key, name)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
            SET key = EXCLUDED.key
            RETURNING id
            "#,
        )
        .bind(key)
        .bind(name)
        .fetch_one(&self.pool)
        .await?)
    }
}
