use chrono::Local;

use crate::{
    error::{Error, Result},
    extract::GeneratedContent,
    image::ImageReference,
    slug,
    storage::{NewPost, Post, PostStatus, Store},
    taxonomy::{TaxonomyKind, TaxonomyResolver},
    topic::Topic,
};

/// 阅读速度（词/分钟）
pub const WORDS_PER_MINUTE: usize = 200;

/// 默认系统作者的查找 key
pub const DEFAULT_AUTHOR_KEY: &str = "system";

/// 写入时遇到 slug 冲突后重新解析的最大轮数
const INSERT_ROUNDS: usize = 3;

/// 按空白切分的词数
pub fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

/// `ceil(词数 / 200)`
pub fn reading_time_minutes(body: &str) -> i32 {
    i32::try_from(word_count(body).div_ceil(WORDS_PER_MINUTE)).unwrap_or(i32::MAX)
}

/// 组装并写入文章
pub struct Publisher<S> {
    store: S,
    author_name: String,
}

impl<S: Store> Publisher<S> {
    pub fn new(store: S, author_name: impl Into<String>) -> Self {
        Self {
            store,
            author_name: author_name.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 发布一篇文章
    ///
    /// 1. 以 slug 提示（没有则用标题）解析唯一 slug
    /// 2. 解析分类（单个）和标签（批量）
    /// 3. 获取或创建默认作者
    /// 4. 以 [`PostStatus::Published`] 写入
    ///
    /// 写入失败时已创建的分类/标签不回滚。并发写入导致 slug 冲突时重新解析 slug，
    /// 不会覆盖已有文章。
    pub async fn publish(
        &self,
        content: &GeneratedContent,
        topic: &Topic,
        image: &ImageReference,
    ) -> Result<Post> {
        let candidate = content.slug_hint.as_deref().unwrap_or(&content.title);

        let taxonomy = TaxonomyResolver::new(&self.store);
        let category = taxonomy
            .resolve_one(TaxonomyKind::Category, &topic.category)
            .await?;
        let tags = taxonomy
            .resolve_many(TaxonomyKind::Tag, &content.tags)
            .await?;

        let author_id = self
            .store
            .ensure_default_author(DEFAULT_AUTHOR_KEY, &self.author_name)
            .await?;

        for round in 1..=INSERT_ROUNDS {
            let slug =
                slug::resolve_with(candidate, async |s: &str| self.store.post_slug_exists(s).await)
                    .await?;

            let post = NewPost {
                title: content.title.clone(),
                slug,
                excerpt: content.meta_description.clone(),
                body: content.body_markup.clone(),
                meta_description: content.meta_description.clone(),
                keywords: content.keywords.clone(),
                status: PostStatus::Published,
                published_at: Some(Local::now()),
                author_id,
                category_ids: vec![category.id],
                tag_ids: tags.iter().map(|t| t.id).collect(),
                reading_time_minutes: reading_time_minutes(&content.body_markup),
                cover_image_url: image.url.clone(),
            };

            match self.store.insert_post(post).await {
                Ok(post) => {
                    tracing::info!(slug = %post.slug, id = post.id, "post published");
                    return Ok(post);
                }
                Err(Error::SlugTaken(slug)) => {
                    tracing::warn!(%slug, round, "slug taken concurrently, resolving again");
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::SlugExhausted(slug::base_slug(candidate)))
    }
}
